//! Library error types.
//!
use std::fmt;

/// A stream `Result`, normally returning a stream [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A codec error. Encompasses any issues that can happen while reading or
/// writing a binary or text stream.
#[derive(Clone, Debug)]
pub enum Error {
    /// An API was misused: wrong container nesting, missing field name
    /// inside a struct, an annotation with neither text nor ID, calling
    /// `Finish` inside an open container, and so on. Names the offending
    /// operation.
    Usage(&'static str),
    /// The underlying byte source or byte sink failed.
    Io(String),
    /// Malformed input was found at the given byte offset.
    Syntax {
        /// Byte (or, in text, character) offset at which the inconsistency
        /// was detected.
        offset: usize,
        /// Human-readable cause.
        cause: String,
    },
    /// Input ended in the middle of a value.
    UnexpectedEof {
        /// Offset at which the stream ended.
        offset: usize,
    },
    /// The text tokenizer found a character it did not expect.
    UnexpectedRune {
        /// Character offset at which the rune was found.
        offset: usize,
        /// The offending character.
        rune: char,
    },
    /// The text parser found a token it did not expect in this position.
    UnexpectedToken {
        /// Character offset of the offending token.
        offset: usize,
        /// The offending lexeme.
        lexeme: String,
    },
    /// The binary version marker named an unsupported major/minor pair.
    UnsupportedVersion {
        /// Major version found.
        major: u8,
        /// Minor version found.
        minor: u8,
    },
    /// A binary value's (type, length) nibble combination is reserved.
    InvalidTag {
        /// Byte offset of the offending tag byte.
        offset: usize,
        /// The offending tag byte.
        tag: u8,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Usage(op) => write!(f, "usage error in {op}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Syntax { offset, cause } => {
                write!(f, "syntax error at offset {offset}: {cause}")
            }
            Error::UnexpectedEof { offset } => {
                write!(f, "unexpected end of input at offset {offset}")
            }
            Error::UnexpectedRune { offset, rune } => {
                write!(f, "unexpected character {rune:?} at offset {offset}")
            }
            Error::UnexpectedToken { offset, lexeme } => {
                write!(f, "unexpected token {lexeme:?} at offset {offset}")
            }
            Error::UnsupportedVersion { major, minor } => {
                write!(f, "unsupported version marker {major}.{minor}")
            }
            Error::InvalidTag { offset, tag } => {
                write!(f, "invalid tag byte 0x{tag:02X} at offset {offset}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Error::Syntax {
            offset: 0,
            cause: format!("invalid UTF-8: {e}"),
        }
    }
}

pub(crate) fn syntax(offset: usize, cause: impl Into<String>) -> Error {
    Error::Syntax {
        offset,
        cause: cause.into(),
    }
}
