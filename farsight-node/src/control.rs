//! Inbound control channel

use crate::bus::MessageBus;
use crate::orchestrator::StateHandle;
use farsight_core::{Command, Error};
use tracing::{info, warn};

/// Apply one control message to the shared state. Unrecognized messages are
/// logged and leave the state untouched.
pub fn handle_message(state: &StateHandle, payload: &str) -> Option<Command> {
    match payload.parse::<Command>() {
        Ok(command) => {
            match command {
                Command::SetMode(mode) => {
                    info!("Control: mode {} requested", mode);
                    state.request_mode(mode);
                }
                Command::SetTargets(targets) => {
                    info!("Control: searching for {}", targets);
                    state.set_targets(targets);
                }
            }
            Some(command)
        }
        Err(e) => {
            warn!("Ignoring control message: {}", e);
            None
        }
    }
}

/// Route messages on `topic` into `state` for as long as the bus lives
pub fn subscribe(bus: &dyn MessageBus, topic: &str, state: StateHandle) -> Result<(), Error> {
    bus.subscribe(
        topic,
        Box::new(move |payload| {
            handle_message(&state, payload);
        }),
    )
}
