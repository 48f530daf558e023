// SPDX-License-Identifier: Apache-2.0

use crate::{Position, ValueKind};

/// Why the scanner rejected the bytes at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// A byte that cannot start or continue the expected token.
    UnexpectedByte(u8),
    /// A literal (`true`, `false`, `null`) that does not match in full.
    InvalidLiteral,
    /// A number that does not follow the JSON number grammar.
    InvalidNumber,
    /// Invalid escape sequence character.
    InvalidEscapeSequence,
    /// Invalid hex digits in Unicode escape sequence.
    InvalidUnicodeHex,
    /// Valid hex but invalid Unicode codepoint (for example a lone surrogate).
    InvalidUnicodeCodepoint,
    /// String content is not valid UTF-8.
    InvalidUtf8,
    /// An object member key that is not a string.
    NonStringKey(ValueKind),
    /// An object key not followed by `:`.
    MissingColon,
}

/// Errors produced while navigating or materializing JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The bytes at `position` violate the accepted grammar.
    MalformedJson {
        position: Position,
        reason: Malformed,
    },
    /// The operation is not supported for a value of this kind.
    TypeMismatch {
        operation: &'static str,
        kind: ValueKind,
    },
    /// The array has no element at `index`.
    IndexOutOfRange { index: i64, len: usize },
    /// The object has no member with this key.
    KeyNotFound(String),
    /// No more top-level values in any remaining source.
    StreamExhausted,
    /// The source ended where more data was required.
    UnexpectedEnd { position: Position },
    /// A caller-supplied argument violates a precondition.
    InvalidArgument(&'static str),
    /// Nesting went deeper than the configured limit.
    MaxDepthReached { position: Position },
    /// The underlying source failed to read or seek.
    Io(std::io::ErrorKind),
}

impl Error {
    pub(crate) fn malformed(position: Position, reason: Malformed) -> Self {
        Error::MalformedJson { position, reason }
    }

    pub(crate) fn type_mismatch(operation: &'static str, kind: ValueKind) -> Self {
        Error::TypeMismatch { operation, kind }
    }

    /// True for [`Error::StreamExhausted`], the expected end of a stream.
    pub fn is_stream_exhausted(&self) -> bool {
        matches!(self, Error::StreamExhausted)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        log::debug!("byte source failed: {err}");
        Error::Io(err.kind())
    }
}

impl core::fmt::Display for Malformed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Malformed::UnexpectedByte(b) if b.is_ascii_graphic() => {
                write!(f, "unexpected byte '{}'", *b as char)
            }
            Malformed::UnexpectedByte(b) => write!(f, "unexpected byte {b:#04x}"),
            Malformed::NonStringKey(kind) => write!(f, "object key must be a string, found {kind}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::MalformedJson { position, reason } => {
                write!(f, "malformed JSON at byte {position}: {reason}")
            }
            Error::TypeMismatch { operation, kind } => {
                write!(f, "cannot {operation} a value of kind {kind}")
            }
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for array of length {len}")
            }
            Error::KeyNotFound(key) => write!(f, "key {key:?} not found"),
            Error::StreamExhausted => write!(f, "no more values in the stream"),
            Error::UnexpectedEnd { position } => write!(f, "unexpected end of data at byte {position}"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::MaxDepthReached { position } => {
                write!(f, "maximum nesting depth reached at byte {position}")
            }
            Error::Io(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: Error = io.into();
        assert_eq!(err, Error::Io(std::io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_display_messages() {
        let err = Error::malformed(7, Malformed::UnexpectedByte(b'x'));
        assert_eq!(err.to_string(), "malformed JSON at byte 7: unexpected byte 'x'");

        let err = Error::type_mismatch("measure the length of", ValueKind::String);
        assert_eq!(
            err.to_string(),
            "cannot measure the length of a value of kind string"
        );

        let err = Error::malformed(0, Malformed::UnexpectedByte(b'\n'));
        assert_eq!(err.to_string(), "malformed JSON at byte 0: unexpected byte 0x0a");
    }

    #[test]
    fn test_stream_exhausted_predicate() {
        assert!(Error::StreamExhausted.is_stream_exhausted());
        assert!(!Error::KeyNotFound("a".into()).is_stream_exhausted());
    }
}
