//! Mode orchestration: which lease holds the camera
//!
//! Control callbacks only record the requested mode in a [`ModeState`]
//! behind a [`StateHandle`]. The pacing loop applies a pending change once per
//! iteration through [`Orchestrator::step`]:
//!
//! 1. stop the lease of the previous mode (failure is only a warning)
//! 2. start the lease of the new mode; on failure fall back to `Idle` and
//!    return a [`ModeChange`] naming the cause
//! 3. the pending marker is cleared either way
//!
//! At most one lease is started at any time and `Idle` holds none.

use crate::lease::{CameraLease, StreamLease};
use farsight_core::{Error, Mode, ModeChange, TargetSet};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Requested mode and targets, shared between control and pacing loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeState {
    mode: Mode,
    targets: TargetSet,
    /// Mode whose lease is still held, while a change is waiting to be applied
    pending_previous: Option<Mode>,
}

impl ModeState {
    /// Nothing is held yet, so the first step starts `mode`
    pub fn new(mode: Mode, targets: TargetSet) -> Self {
        Self {
            mode,
            targets,
            pending_previous: Some(Mode::Idle),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn targets(&self) -> TargetSet {
        self.targets
    }

    pub fn pending_previous(&self) -> Option<Mode> {
        self.pending_previous
    }

    pub fn has_pending_change(&self) -> bool {
        self.pending_previous.is_some()
    }

    /// Request a mode. Going back to the mode whose lease is still held
    /// cancels the pending change.
    pub fn request_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        match self.pending_previous {
            Some(previous) if previous == mode => self.pending_previous = None,
            Some(_) => {}
            None => self.pending_previous = Some(self.mode),
        }
        self.mode = mode;
    }

    pub fn set_targets(&mut self, targets: TargetSet) {
        self.targets = targets;
    }

    /// Take the pending `(previous, next)` transition, clearing the marker
    pub fn take_transition(&mut self) -> Option<(Mode, Mode)> {
        self.pending_previous.take().map(|previous| (previous, self.mode))
    }

    /// Record that starting `failed` did not succeed. Nothing is held now; a
    /// request that arrived meanwhile stays pending and will start from `Idle`.
    fn start_failed(&mut self, failed: Mode) {
        if self.pending_previous.is_some() {
            self.pending_previous = Some(Mode::Idle);
        } else if self.mode == failed {
            self.mode = Mode::Idle;
        }
    }
}

/// Cloneable, lock-protected handle to the shared [`ModeState`]
#[derive(Debug, Clone)]
pub struct StateHandle {
    inner: Arc<Mutex<ModeState>>,
}

impl StateHandle {
    pub fn new(mode: Mode, targets: TargetSet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ModeState::new(mode, targets))),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ModeState> {
        self.inner.lock()
    }

    pub fn mode(&self) -> Mode {
        self.lock().mode()
    }

    pub fn targets(&self) -> TargetSet {
        self.lock().targets()
    }

    pub fn request_mode(&self, mode: Mode) {
        self.lock().request_mode(mode);
    }

    pub fn set_targets(&self, targets: TargetSet) {
        self.lock().set_targets(targets);
    }

    pub fn snapshot(&self) -> ModeState {
        self.lock().clone()
    }
}

/// Owns both leases and applies mode transitions to them
pub struct Orchestrator {
    state: StateHandle,
    camera: Box<dyn CameraLease>,
    stream: Box<dyn StreamLease>,
    /// Mode whose lease this orchestrator actually holds
    active: Mode,
}

impl Orchestrator {
    pub fn new(state: StateHandle, camera: Box<dyn CameraLease>, stream: Box<dyn StreamLease>) -> Self {
        Self {
            state,
            camera,
            stream,
            active: Mode::Idle,
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Mode whose lease is currently held
    pub fn active(&self) -> Mode {
        self.active
    }

    pub fn camera(&self) -> &dyn CameraLease {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> &mut dyn CameraLease {
        self.camera.as_mut()
    }

    pub fn stream(&self) -> &dyn StreamLease {
        self.stream.as_ref()
    }

    pub fn stream_mut(&mut self) -> &mut dyn StreamLease {
        self.stream.as_mut()
    }

    /// Apply the pending mode change, if any. Returns the forced change to
    /// `Idle` when the new mode's lease could not be started.
    pub fn step(&mut self) -> Option<ModeChange> {
        let (previous, next) = self.state.lock().take_transition()?;

        if let Err(err) = self.stop_lease(previous) {
            warn!("{}", err);
        }
        self.active = Mode::Idle;

        match self.start_lease(next) {
            Ok(()) => {
                self.active = next;
                info!("Mode changed from {} to {}", previous, next);
                None
            }
            Err(err) => {
                self.state.lock().start_failed(next);
                Some(ModeChange::new(Mode::Idle, err))
            }
        }
    }

    /// A running lease failed: leave its mode on the next step
    pub fn fail(&mut self, reason: Error) -> ModeChange {
        debug!("Lease for {} failed, requesting {}", self.active, Mode::Idle);
        self.state.request_mode(Mode::Idle);
        ModeChange::new(Mode::Idle, reason)
    }

    fn stop_lease(&mut self, mode: Mode) -> Result<(), Error> {
        match mode {
            Mode::Vision => self.camera.stop(),
            Mode::RemoteViewing => self.stream.stop(),
            Mode::Idle => Ok(()),
        }
    }

    fn start_lease(&mut self, mode: Mode) -> Result<(), Error> {
        match mode {
            Mode::Vision => self.camera.start(),
            Mode::RemoteViewing => self.stream.start(),
            Mode::Idle => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_starts_requested_mode() {
        let mut state = ModeState::new(Mode::Vision, TargetSet::all());
        assert_eq!(state.take_transition(), Some((Mode::Idle, Mode::Vision)));
        assert_eq!(state.take_transition(), None);
    }

    #[test]
    fn test_request_records_previous() {
        let mut state = ModeState::new(Mode::Vision, TargetSet::all());
        state.take_transition();
        state.request_mode(Mode::RemoteViewing);
        assert_eq!(state.mode(), Mode::RemoteViewing);
        assert_eq!(state.pending_previous(), Some(Mode::Vision));
    }

    #[test]
    fn test_same_mode_is_noop() {
        let mut state = ModeState::new(Mode::Vision, TargetSet::all());
        state.take_transition();
        state.request_mode(Mode::Vision);
        assert!(!state.has_pending_change());
    }

    #[test]
    fn test_return_to_held_mode_cancels() {
        let mut state = ModeState::new(Mode::Vision, TargetSet::all());
        state.take_transition();
        state.request_mode(Mode::RemoteViewing);
        state.request_mode(Mode::Vision);
        assert_eq!(state.mode(), Mode::Vision);
        assert!(!state.has_pending_change());
    }

    #[test]
    fn test_multiple_requests_keep_first_previous() {
        let mut state = ModeState::new(Mode::Vision, TargetSet::all());
        state.take_transition();
        state.request_mode(Mode::RemoteViewing);
        state.request_mode(Mode::Idle);
        assert_eq!(state.take_transition(), Some((Mode::Vision, Mode::Idle)));
    }

    #[test]
    fn test_start_failure_falls_back_to_idle() {
        let mut state = ModeState::new(Mode::Vision, TargetSet::all());
        state.take_transition();
        state.start_failed(Mode::Vision);
        assert_eq!(state.mode(), Mode::Idle);
        assert!(!state.has_pending_change());
    }

    #[test]
    fn test_start_failure_keeps_newer_request() {
        let mut state = ModeState::new(Mode::Vision, TargetSet::all());
        state.take_transition();
        // Arrives while the camera is being started
        state.request_mode(Mode::RemoteViewing);
        state.start_failed(Mode::Vision);
        assert_eq!(state.take_transition(), Some((Mode::Idle, Mode::RemoteViewing)));
    }

    #[test]
    fn test_handle_is_shared() {
        let handle = StateHandle::new(Mode::Idle, TargetSet::none());
        let other = handle.clone();
        other.request_mode(Mode::Vision);
        other.set_targets(TargetSet::all());
        assert_eq!(handle.mode(), Mode::Vision);
        assert_eq!(handle.targets(), TargetSet::all());
    }
}
