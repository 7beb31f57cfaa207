//! Typed error taxonomy shared by every component of the node
//!
//! An [`Error`] is a `(kind, message)` pair. The [`ErrorKind::Ok`] kind is the
//! success value of the wire protocol; Rust APIs return `Result<T, Error>` and
//! only ever put failure kinds in the `Err` arm.

use std::fmt;
use thiserror::Error;

/// Closed set of error categories, with stable wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Ok,
    /// An internal invariant was broken
    Internal,
    /// A library returned an error and the cause is unknown
    Library,
    Unknown,
    /// The requested operation is not valid in the current state
    InvalidOperation,
    /// A device, file or stream could not be opened or read
    ResourceUnavailable,
    Network,
    InvalidArgs,
    Memory,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::Ok,
        ErrorKind::Internal,
        ErrorKind::Library,
        ErrorKind::Unknown,
        ErrorKind::InvalidOperation,
        ErrorKind::ResourceUnavailable,
        ErrorKind::Network,
        ErrorKind::InvalidArgs,
        ErrorKind::Memory,
    ];

    /// Numeric identifier used on the wire
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::Ok => 0,
            ErrorKind::Internal => 1,
            ErrorKind::Library => 2,
            ErrorKind::Unknown => 3,
            ErrorKind::InvalidOperation => 4,
            ErrorKind::ResourceUnavailable => 5,
            ErrorKind::Network => 6,
            ErrorKind::InvalidArgs => 7,
            ErrorKind::Memory => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Ok => "ok",
            ErrorKind::Internal => "internal error",
            ErrorKind::Library => "library error",
            ErrorKind::Unknown => "unknown error",
            ErrorKind::InvalidOperation => "invalid operation",
            ErrorKind::ResourceUnavailable => "resource unavailable",
            ErrorKind::Network => "network error",
            ErrorKind::InvalidArgs => "invalid arguments",
            ErrorKind::Memory => "out of memory",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result-or-failure value reported by the node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe(.kind, .message))]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

fn describe(kind: &ErrorKind, message: &str) -> String {
    if message.is_empty() {
        kind.name().to_string()
    } else {
        format!("{}: {}", kind, message)
    }
}

macro_rules! error_constructors {
    ($($(#[$doc:meta])* $name:ident => $kind:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorKind::$kind, message)
            }
        )*
    };
}

impl Error {
    /// Build an error of any kind. An `Ok` kind never keeps a message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = match kind {
            ErrorKind::Ok => String::new(),
            _ => message.into(),
        };
        Self { kind, message }
    }

    /// Failure of the given kind without a message
    pub fn bare(kind: ErrorKind) -> Self {
        Self { kind, message: String::new() }
    }

    /// The success value
    pub fn ok() -> Self {
        Self::bare(ErrorKind::Ok)
    }

    error_constructors! {
        internal => Internal,
        library => Library,
        unknown => Unknown,
        /// Start twice, stop when stopped, read while stopped
        invalid_operation => InvalidOperation,
        resource_unavailable => ResourceUnavailable,
        network => Network,
        invalid_args => InvalidArgs,
        memory => Memory,
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn is_ok(&self) -> bool {
        self.kind == ErrorKind::Ok
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// `Ok(())` for the success value, `Err(self)` otherwise
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Line-safe wire encoding: `<code>` or `<code>:<escaped message>`.
    ///
    /// The output never contains `;`, `\n` or `\r`, so it can be embedded in a
    /// `;`-separated mode-change event.
    pub fn serialize(&self) -> String {
        let code = self.kind.code();
        if self.message.is_empty() {
            return code.to_string();
        }

        let mut out = String::with_capacity(self.message.len() + 4);
        out.push_str(&code.to_string());
        out.push(':');
        for c in self.message.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                ';' => out.push_str("\\s"),
                c => out.push(c),
            }
        }
        out
    }

    /// Parse the output of [`Error::serialize`]
    pub fn deserialize(input: &str) -> Result<Error, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let (code, escaped) = match input.split_once(':') {
            Some((code, escaped)) => (code, Some(escaped)),
            None => (input, None),
        };

        let kind = canonical_code(code)
            .and_then(ErrorKind::from_code)
            .ok_or_else(|| ParseError::InvalidKind(code.to_string()))?;

        let message = match escaped {
            Some(escaped) => unescape(escaped)?,
            None => String::new(),
        };

        if kind == ErrorKind::Ok && !message.is_empty() {
            return Err(ParseError::MessageOnOk);
        }

        Ok(Error { kind, message })
    }
}

/// Decimal digits only, no sign and no leading zero
fn canonical_code(code: &str) -> Option<u8> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if code.len() > 1 && code.starts_with('0') {
        return None;
    }
    code.parse().ok()
}

fn unescape(escaped: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('s') => out.push(';'),
            Some(other) => return Err(ParseError::UnknownEscape(other)),
            None => return Err(ParseError::DanglingEscape),
        }
    }
    Ok(out)
}

impl From<Result<(), Error>> for Error {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Error::ok(),
            Err(err) => err,
        }
    }
}

/// Reasons an incoming serialized error could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("serialized error is empty")]
    Empty,

    #[error("invalid error kind code '{0}'")]
    InvalidKind(String),

    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),

    #[error("message ends inside an escape sequence")]
    DanglingEscape,

    #[error("success value cannot carry a message")]
    MessageOnOk,
}

/// An error that makes further operation of the process pointless.
///
/// Only startup code produces these; the top-level driver decides how the
/// process ends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fatal: {0}")]
pub struct FatalError(#[from] pub Error);

impl FatalError {
    pub fn error(&self) -> &Error {
        &self.0
    }
}
