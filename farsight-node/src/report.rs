//! Outbound reporting of detections, errors and forced mode changes
//!
//! Everything is logged locally first; publishing on the bus is additive.

use crate::bus::MessageBus;
use crate::config::BusConfig;
use farsight_core::{encode_detections, Detection, Error, ModeChange};
use std::sync::Arc;
use tracing::{debug, error};

pub struct Reporter {
    bus: Option<Arc<dyn MessageBus>>,
    data_topic: String,
    error_topic: String,
}

impl Reporter {
    pub fn new(bus: Option<Arc<dyn MessageBus>>, config: &BusConfig) -> Self {
        Self {
            bus,
            data_topic: config.data_topic.clone(),
            error_topic: config.error_topic.clone(),
        }
    }

    /// Plain failure, published as the serialized error
    pub fn error(&self, err: &Error) {
        error!("{}", err);
        self.publish_error(&err.serialize());
    }

    /// Forced mode change, published as `<mode>;<serialized error>`
    pub fn mode_change(&self, change: &ModeChange) {
        error!("Changing to mode {} because {}", change.mode, change.reason);
        self.publish_error(&change.serialize());
    }

    /// One frame's detections. A message too large for the data buffer is
    /// reported as an error and nothing is sent on the data topic.
    pub fn detections(&self, detections: &[Detection]) {
        let message = match encode_detections(detections) {
            Ok(message) => message,
            Err(e) => return self.error(&e),
        };
        debug!(targets = detections.len(), "{}", message);
        if let Some(bus) = &self.bus {
            if let Err(e) = bus.publish(&self.data_topic, &message) {
                error!("Could not publish vision data: {}", e);
            }
        }
    }

    fn publish_error(&self, message: &str) {
        if let Some(bus) = &self.bus {
            if let Err(e) = bus.publish(&self.error_topic, message) {
                error!("Error sending error message {} over the bus: {}", message, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LoopbackBus;
    use farsight_core::{ErrorKind, Mode, TargetKind};

    fn detection() -> Detection {
        Detection { kind: TargetKind::RedBall, distance: 2.0, angle: -1.0, score: 1.9 }
    }

    #[test]
    fn test_without_bus_only_logs() {
        let reporter = Reporter::new(None, &BusConfig::default());
        reporter.detections(&[detection()]);
        reporter.error(&Error::network("broker down"));
        reporter.mode_change(&ModeChange::new(Mode::Idle, Error::library("camera")));
    }

    #[test]
    fn test_overflow_goes_to_error_topic() {
        let topics = BusConfig::default();
        let bus = Arc::new(LoopbackBus::new());
        let reporter = Reporter::new(Some(bus.clone() as Arc<dyn MessageBus>), &topics);

        reporter.detections(&vec![detection(); 200]);

        assert!(bus.published_on(&topics.data_topic).is_empty());
        let errors = bus.published_on(&topics.error_topic);
        assert_eq!(errors.len(), 1);
        let err = Error::deserialize(&errors[0]).unwrap();
        assert_eq!(err.kind(), ErrorKind::Memory);
    }
}
