//! farsight-core: shared vocabulary of the farsight vision node
//!
//! Holds the typed error taxonomy that every fallible operation reports with,
//! the target kinds a frame can be searched for, the operating modes of the
//! node and the text protocol spoken on the control, data and error channels.

pub mod error;
pub mod mode;
pub mod protocol;
pub mod target;

pub use error::{Error, ErrorKind, FatalError, ParseError};
pub use mode::Mode;
pub use protocol::{
    encode_detections, Command, CommandError, ModeChange, ModeChangeParseError,
    DATA_MESSAGE_CAPACITY,
};
pub use target::{Detection, TargetKind, TargetSet};
