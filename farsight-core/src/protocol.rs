//! Text protocol of the control, data and error channels
//!
//! - control (inbound): `mode vision | mode remote_viewing | mode none |
//!   targets red_balls | targets blue_balls | targets all`
//! - data (outbound): `<class-id> <distance> <angle> <score>` per detection,
//!   space separated, six decimal places
//! - error (outbound): `Error::serialize()`, or `<mode>;<serialized error>`
//!   when the node had to change mode because of the error

use crate::error::{Error, ParseError};
use crate::mode::Mode;
use crate::target::{Detection, TargetKind, TargetSet};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

/// Size of the outbound data message buffer, in bytes
pub const DATA_MESSAGE_CAPACITY: usize = 2048;

/// A command received on the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetMode(Mode),
    SetTargets(TargetSet),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized control command '{0}'")]
    Unrecognized(String),
}

/// Leading and trailing whitespace, such as a trailing newline, is ignored.
/// Otherwise the text must match a command exactly, including case and the
/// single space between words.
impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let command = match input.trim() {
            "mode vision" => Command::SetMode(Mode::Vision),
            "mode remote_viewing" => Command::SetMode(Mode::RemoteViewing),
            "mode none" => Command::SetMode(Mode::Idle),
            "targets red_balls" => Command::SetTargets(TargetSet::only(TargetKind::RedBall)),
            "targets blue_balls" => Command::SetTargets(TargetSet::only(TargetKind::BlueBall)),
            "targets all" => Command::SetTargets(TargetSet::all()),
            other => return Err(CommandError::Unrecognized(other.to_string())),
        };
        Ok(command)
    }
}

/// Encode one frame's detections as a data-channel message.
///
/// The buffer keeps one byte for the terminator, so the encoded form must be
/// shorter than [`DATA_MESSAGE_CAPACITY`]. Longer messages fail with a
/// `Memory` error instead of being truncated.
pub fn encode_detections(detections: &[Detection]) -> Result<String, Error> {
    let mut message = String::with_capacity(DATA_MESSAGE_CAPACITY);
    for (i, detection) in detections.iter().enumerate() {
        if i > 0 {
            message.push(' ');
        }
        // Writing into a String cannot fail
        let _ = write!(
            message,
            "{} {:.6} {:.6} {:.6}",
            detection.kind.id(),
            detection.distance,
            detection.angle,
            detection.score
        );
        if message.len() >= DATA_MESSAGE_CAPACITY {
            return Err(Error::memory(format!(
                "{} targets do not fit in the {} byte data message buffer",
                detections.len(),
                DATA_MESSAGE_CAPACITY
            )));
        }
    }
    Ok(message)
}

/// A forced mode change and the error that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub mode: Mode,
    pub reason: Error,
}

impl ModeChange {
    pub fn new(mode: Mode, reason: Error) -> Self {
        Self { mode, reason }
    }

    /// `<mode-name>;<serialized error>`
    pub fn serialize(&self) -> String {
        format!("{};{}", self.mode.name(), self.reason.serialize())
    }

    pub fn deserialize(input: &str) -> Result<ModeChange, ModeChangeParseError> {
        let (mode, reason) = input
            .split_once(';')
            .ok_or(ModeChangeParseError::MissingSeparator)?;
        let mode = Mode::from_name(mode)
            .ok_or_else(|| ModeChangeParseError::InvalidMode(mode.to_string()))?;
        let reason = Error::deserialize(reason)?;
        Ok(ModeChange { mode, reason })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeChangeParseError {
    #[error("mode change event has no ';' separator")]
    MissingSeparator,

    #[error("invalid mode name '{0}'")]
    InvalidMode(String),

    #[error(transparent)]
    Reason(#[from] ParseError),
}
