//! Central error types for the Hessian 2.0 codec.
//!
//! Every variant belongs to one [`ErrorKind`]: malformed input (`Format`),
//! an exhausted source (`EndOfStream`), API misuse (`State`, `Argument`),
//! decoder hardening limits (`Limit`) or the underlying transport (`Io`).

use core::fmt;
use std::borrow::Cow;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The byte stream violates the wire format. Never recovered.
    Format,
    /// The source ran dry in the middle of a value.
    EndOfStream,
    /// The caller drove the codec through an invalid sequence of calls.
    State,
    /// The caller passed an argument the wire format cannot express.
    Argument,
    /// A configured decoder limit was hit.
    Limit,
    /// The underlying reader or writer failed.
    Io,
}

/// All errors raised by the encoder and the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A tag byte that is unknown, or not legal where it appeared.
    UnexpectedTag {
        /// Was an dieser Stelle erwartet wurde (z.B. "int", "string chunk").
        expected: Cow<'static, str>,
        /// Das fehlerhafte Tag-Byte.
        tag: u8,
        /// Absolute Byte-Position des Tags im Stream.
        offset: u64,
        /// Beschreibung des Werts, der stattdessen gefunden wurde (leer wenn nicht lesbar).
        found: String,
        /// Pufferinhalt rund um das Tag: `[vorher] X [nachher]`.
        context: String,
    },
    /// A back-reference points past the end of the reference table.
    InvalidReference { index: i32, len: usize, offset: u64 },
    /// An object instance names a class definition that was never introduced.
    InvalidClassReference { index: i32, len: usize, offset: u64 },
    /// A list or map type annotation references an unknown type-name slot.
    InvalidTypeReference { index: i32, len: usize, offset: u64 },
    /// A class definition record without a type name.
    InvalidClassDefinition { offset: u64 },
    /// A modified UTF-8 lead byte that starts no valid 1-3 byte sequence.
    MalformedUtf8 { byte: u8, offset: u64 },
    /// A string decoded to UTF-16 with an unpaired surrogate.
    UnpairedSurrogate { offset: u64 },
    /// A declared list length is negative.
    InvalidLength { length: i64, offset: u64 },
    /// Packet framing is inconsistent (varint overflow, trailing payload).
    MalformedPacket {
        offset: u64,
        reason: Cow<'static, str>,
    },
    /// The source ended in the middle of a value.
    UnexpectedEndOfStream {
        expected: Cow<'static, str>,
        offset: u64,
    },
    /// API misuse, e.g. writing past a declared fixed-length list.
    InvalidState(Cow<'static, str>),
    /// An argument the wire format cannot represent, e.g. an empty type name.
    InvalidArgument(Cow<'static, str>),
    /// Composite nesting exceeded `DecoderOptions::max_depth`.
    DepthLimitExceeded { max: usize, offset: u64 },
    /// A declared length exceeded `DecoderOptions::max_length`.
    LengthLimitExceeded { length: u64, max: usize, offset: u64 },
    /// Ein IO-Fehler des unterliegenden Readers/Writers.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedTag { expected, tag, offset, found, context } => {
                write!(f, "expected {expected} at {} (offset {offset})", crate::tag::code_name(Some(*tag)))?;
                if !found.is_empty() {
                    write!(f, ", found {found}")?;
                }
                if !context.is_empty() {
                    write!(f, "\n  {context}")?;
                }
                Ok(())
            }
            Self::InvalidReference { index, len, offset } => write!(
                f,
                "illegal back-reference {index} at offset {offset}, reference table holds {len} values"
            ),
            Self::InvalidClassReference { index, len, offset } => write!(
                f,
                "no class definition at reference {index} (offset {offset}), {len} classes defined"
            ),
            Self::InvalidTypeReference { index, len, offset } => write!(
                f,
                "illegal type reference {index} at offset {offset}, type table holds {len} names"
            ),
            Self::InvalidClassDefinition { offset } => {
                write!(f, "class definition at offset {offset} has no type name")
            }
            Self::MalformedUtf8 { byte, offset } => {
                write!(f, "bad utf-8 encoding 0x{byte:02x} at offset {offset}")
            }
            Self::UnpairedSurrogate { offset } => {
                write!(f, "string ending at offset {offset} contains an unpaired UTF-16 surrogate")
            }
            Self::InvalidLength { length, offset } => {
                write!(f, "invalid length {length} at offset {offset}")
            }
            Self::MalformedPacket { offset, reason } => {
                write!(f, "malformed packet at offset {offset}: {reason}")
            }
            Self::UnexpectedEndOfStream { expected, offset } => {
                write!(f, "unexpected end of stream at offset {offset} while reading {expected}")
            }
            Self::InvalidState(msg) => write!(f, "invalid codec state: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::DepthLimitExceeded { max, offset } => {
                write!(f, "nesting depth exceeds limit {max} at offset {offset}")
            }
            Self::LengthLimitExceeded { length, max, offset } => {
                write!(f, "length {length} at offset {offset} exceeds configured maximum {max}")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Ohne Positionswissen; der Eingabe-Cursor bildet `UnexpectedEof` selbst
/// auf `UnexpectedEndOfStream` mit Offset ab.
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl Error {
    /// Ordnet den Fehler in die grobe Taxonomie ein.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedTag { .. }
            | Self::InvalidReference { .. }
            | Self::InvalidClassReference { .. }
            | Self::InvalidTypeReference { .. }
            | Self::InvalidClassDefinition { .. }
            | Self::MalformedUtf8 { .. }
            | Self::UnpairedSurrogate { .. }
            | Self::InvalidLength { .. }
            | Self::MalformedPacket { .. } => ErrorKind::Format,
            Self::UnexpectedEndOfStream { .. } => ErrorKind::EndOfStream,
            Self::InvalidState(_) => ErrorKind::State,
            Self::InvalidArgument(_) => ErrorKind::Argument,
            Self::DepthLimitExceeded { .. } | Self::LengthLimitExceeded { .. } => ErrorKind::Limit,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// `true` for malformed input.
    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// `true` when the source ended in the middle of a value.
    pub fn is_end_of_stream(&self) -> bool {
        self.kind() == ErrorKind::EndOfStream
    }

    /// Erstellt einen `UnexpectedEndOfStream` Fehler.
    pub fn end_of_stream(expected: impl Into<Cow<'static, str>>, offset: u64) -> Self {
        Self::UnexpectedEndOfStream {
            expected: expected.into(),
            offset,
        }
    }

    /// Erstellt einen `InvalidState` Fehler.
    pub fn state(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Erstellt einen `InvalidArgument` Fehler.
    pub fn argument(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Erstellt einen `MalformedPacket` Fehler.
    pub fn packet(offset: u64, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedPacket {
            offset,
            reason: reason.into(),
        }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_tag_display_names_tag_and_offset() {
        let e = Error::UnexpectedTag {
            expected: "int".into(),
            tag: 0x53,
            offset: 17,
            found: String::new(),
            context: String::new(),
        };
        let msg = e.to_string();
        assert!(msg.contains("expected int"), "{msg}");
        assert!(msg.contains("0x53"), "{msg}");
        assert!(msg.contains("17"), "{msg}");
    }

    #[test]
    fn unexpected_tag_display_includes_found_and_context() {
        let e = Error::UnexpectedTag {
            expected: "list".into(),
            tag: 0x05,
            offset: 3,
            found: "string \"hello\"".into(),
            context: "[\\x90] \\x05 [hello]".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("hello"), "{msg}");
        assert!(msg.contains("[\\x90]"), "{msg}");
    }

    #[test]
    fn invalid_reference_display() {
        let msg = Error::InvalidReference { index: 7, len: 2, offset: 40 }.to_string();
        assert!(msg.contains("back-reference 7"), "{msg}");
        assert!(msg.contains("holds 2"), "{msg}");
        assert!(msg.contains("offset 40"), "{msg}");
    }

    #[test]
    fn invalid_class_reference_display() {
        let msg = Error::InvalidClassReference { index: 3, len: 0, offset: 11 }.to_string();
        assert!(msg.contains("class definition"), "{msg}");
        assert!(msg.contains('3'), "{msg}");
        assert!(msg.contains("offset 11"), "{msg}");
    }

    #[test]
    fn invalid_type_reference_display() {
        let msg = Error::InvalidTypeReference { index: 9, len: 1, offset: 5 }.to_string();
        assert!(msg.contains("type reference 9"), "{msg}");
        assert!(msg.contains("offset 5"), "{msg}");
    }

    #[test]
    fn malformed_utf8_display() {
        let msg = Error::MalformedUtf8 { byte: 0xf8, offset: 4 }.to_string();
        assert!(msg.contains("utf-8"), "{msg}");
        assert!(msg.contains("0xf8"), "{msg}");
    }

    #[test]
    fn end_of_stream_display() {
        let msg = Error::end_of_stream("string length", 12).to_string();
        assert!(msg.contains("end of stream"), "{msg}");
        assert!(msg.contains("string length"), "{msg}");
        assert!(msg.contains("12"), "{msg}");
    }

    #[test]
    fn limit_display() {
        let msg = Error::LengthLimitExceeded { length: 1_000_000, max: 1024, offset: 3 }.to_string();
        assert!(msg.contains("1000000"), "{msg}");
        assert!(msg.contains("1024"), "{msg}");
        assert!(msg.contains("offset 3"), "{msg}");
        let msg = Error::DepthLimitExceeded { max: 64, offset: 70 }.to_string();
        assert!(msg.contains("limit 64"), "{msg}");
        assert!(msg.contains("offset 70"), "{msg}");
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::InvalidReference { index: 0, len: 0, offset: 0 }.kind(), ErrorKind::Format);
        assert_eq!(Error::packet(0, "x").kind(), ErrorKind::Format);
        assert_eq!(Error::end_of_stream("int", 0).kind(), ErrorKind::EndOfStream);
        assert_eq!(Error::state("x").kind(), ErrorKind::State);
        assert_eq!(Error::argument("x").kind(), ErrorKind::Argument);
        assert_eq!(Error::DepthLimitExceeded { max: 1, offset: 0 }.kind(), ErrorKind::Limit);
        assert_eq!(Error::Io("x".into()).kind(), ErrorKind::Io);
        assert!(Error::UnpairedSurrogate { offset: 0 }.is_format());
        assert!(Error::InvalidClassDefinition { offset: 0 }.is_format());
        assert!(Error::end_of_stream("int", 0).is_end_of_stream());
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(ref m) if m.contains("pipe closed")));
        // EOF ohne Position bleibt ein IO-Fehler
        let eof: Error = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert_eq!(eof.kind(), ErrorKind::Io);
    }

    #[test]
    fn error_implements_std_error() {
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(Error::state("unbalanced end"));
        assert!(e.to_string().contains("unbalanced end"));
    }

    #[test]
    fn error_is_clone_and_eq() {
        let e1 = Error::argument("empty type name");
        let e2 = e1.clone();
        assert_eq!(e1, e2);
    }
}
