//! Error types for the text and binary format engines.
use std::fmt;

/// A KODA text-parsing result, normally returning a [`ParseError`].
pub type ParseResult<T> = std::result::Result<T, ParseError>;
/// A KODA encode result, normally returning an [`EncodeError`].
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;
/// A KODA decode result, normally returning a [`DecodeError`].
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// The specific rule violated while parsing `.koda` text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A character was encountered that starts no valid token.
    UnexpectedChar(char),
    /// End of input was reached mid-token or mid-document.
    UnexpectedEof,
    /// A string literal was never closed before end of input.
    UnterminatedString,
    /// A block comment (`/* ... */`) was never closed before end of input.
    UnterminatedComment,
    /// A `\` escape sequence in a string was not one of the recognized forms.
    InvalidEscape(char),
    /// A `\uXXXX` escape, or a surrogate pair formed from two such escapes,
    /// did not decode to a valid Unicode scalar value.
    InvalidUnicodeEscape,
    /// An unescaped control character (U+0000-U+001F) appeared in a string.
    ControlCharacterInString,
    /// A numeric literal did not match the grammar in spec section 4.1.
    InvalidNumber(String),
    /// A key appeared twice in the same object.
    DuplicateKey(String),
    /// Nesting exceeded `ParseOptions::max_depth`.
    DepthExceeded { max_depth: usize },
    /// The input was longer than `ParseOptions::max_input_length`.
    InputTooLarge { max_input_length: usize, actual: usize },
    /// A token appeared where it could not be used (e.g. `:` outside a pair).
    UnexpectedToken(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedChar(c) => write!(f, "unexpected character '{}'", c),
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of input"),
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ParseErrorKind::UnterminatedComment => write!(f, "unterminated block comment"),
            ParseErrorKind::InvalidEscape(c) => write!(f, "invalid escape '\\{}'", c),
            ParseErrorKind::InvalidUnicodeEscape => {
                write!(f, "invalid \\u escape or surrogate pair")
            }
            ParseErrorKind::ControlCharacterInString => {
                write!(f, "unescaped control character in string")
            }
            ParseErrorKind::InvalidNumber(lit) => write!(f, "invalid number '{}'", lit),
            ParseErrorKind::DuplicateKey(key) => write!(f, "duplicate key '{}'", key),
            ParseErrorKind::DepthExceeded { max_depth } => {
                write!(f, "depth limit of {} exceeded", max_depth)
            }
            ParseErrorKind::InputTooLarge {
                max_input_length,
                actual,
            } => write!(
                f,
                "input length {} exceeds maximum of {}",
                actual, max_input_length
            ),
            ParseErrorKind::UnexpectedToken(tok) => write!(f, "unexpected token '{}'", tok),
        }
    }
}

/// A failure while parsing `.koda` text, with the position of the first
/// offending byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, counted in Unicode scalar values.
    pub column: u32,
    /// 0-based byte offset into the input.
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, line: u32, column: u32, offset: usize) -> Self {
        Self {
            kind,
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}:{} (byte {})",
            self.kind, self.line, self.column, self.offset
        )
    }
}

impl std::error::Error for ParseError {}

/// The specific rule violated while building binary bytes from a [`crate::Value`].
#[derive(Clone, Debug, PartialEq)]
pub enum EncodeErrorKind {
    /// Nesting exceeded `EncodeOptions::max_depth`.
    DepthExceeded { max_depth: usize },
    /// A string or key was not well-formed UTF-8.
    ///
    /// This cannot occur from a [`crate::Value`] built by this crate (Rust's
    /// `String` is always valid UTF-8); it exists for API completeness when
    /// values are constructed through unsafe or foreign-data paths.
    InvalidUtf8,
    /// Two pairs in the same object shared a key.
    DuplicateKey(String),
    /// A count (dictionary size, array length, object pair count) did not
    /// fit in a `u32`.
    CountOverflow { what: &'static str },
    /// Encoding would have produced the reserved `Binary` tag (0x07).
    ReservedTag,
}

impl fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeErrorKind::DepthExceeded { max_depth } => {
                write!(f, "depth limit of {} exceeded", max_depth)
            }
            EncodeErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8"),
            EncodeErrorKind::DuplicateKey(key) => write!(f, "duplicate key '{}'", key),
            EncodeErrorKind::CountOverflow { what } => write!(f, "{} overflows u32", what),
            EncodeErrorKind::ReservedTag => write!(f, "reserved tag 0x07 cannot be emitted"),
        }
    }
}

/// A failure while encoding a [`crate::Value`] to canonical binary bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeError {
    pub kind: EncodeErrorKind,
}

impl EncodeError {
    pub(crate) fn new(kind: EncodeErrorKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for EncodeError {}

/// The specific rule violated while decoding binary bytes, whether from a
/// single `.kod` payload or from one frame of a stream.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeErrorKind {
    /// Fewer than 5 bytes were supplied (magic + version).
    TooShort,
    /// The 4-byte magic did not equal `KODA`.
    BadMagic,
    /// The version byte was not a version this decoder understands.
    UnsupportedVersion(u8),
    /// The key dictionary had more entries than `DecodeOptions::max_dictionary_size`.
    DictionaryTooLarge { max: u32, actual: u32 },
    /// A dictionary key was longer than `DecodeOptions::max_string_length`.
    StringTooLong { max: u32, actual: u32 },
    /// The dictionary was not strictly ascending by UTF-8 byte order.
    DictionaryNotSorted { index: usize },
    /// A byte sequence claiming to be a string was not valid UTF-8.
    InvalidUtf8,
    /// Nesting exceeded `DecodeOptions::max_depth`.
    DepthExceeded { max_depth: usize },
    /// A tag byte did not match any known type, or matched the reserved
    /// `Binary` tag (0x07).
    UnknownTag(u8),
    /// A length or count field claimed more bytes than remained in the input.
    TruncatedInput,
    /// An object's key index named a dictionary entry past `N`.
    KeyIndexOutOfRange { index: u32, dictionary_len: u32 },
    /// An object had the same key index appear twice, or key indices were
    /// not in strictly ascending order.
    KeyIndexNotAscending,
    /// Bytes remained after the single root value was fully decoded.
    TrailingBytes { extra: usize },
    /// A stream frame's LEB128 length prefix ran past 10 bytes without terminating.
    MalformedVarint,
    /// A stream frame declared a payload larger than `FrameOptions::max_frame_size`.
    FrameTooLarge { max: u32, actual: u64 },
    /// The byte stream ended while a frame was only partially buffered.
    TruncatedStream,
    /// The decoder pool was asked to decode after `destroy()` was called.
    PoolClosed,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::TooShort => write!(f, "input too short for a KODA header"),
            DecodeErrorKind::BadMagic => write!(f, "bad magic bytes, expected 'KODA'"),
            DecodeErrorKind::UnsupportedVersion(v) => write!(f, "unsupported version {}", v),
            DecodeErrorKind::DictionaryTooLarge { max, actual } => write!(
                f,
                "dictionary size {} exceeds maximum of {}",
                actual, max
            ),
            DecodeErrorKind::StringTooLong { max, actual } => {
                write!(f, "string length {} exceeds maximum of {}", actual, max)
            }
            DecodeErrorKind::DictionaryNotSorted { index } => {
                write!(f, "dictionary not in canonical order at index {}", index)
            }
            DecodeErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8"),
            DecodeErrorKind::DepthExceeded { max_depth } => {
                write!(f, "depth limit of {} exceeded", max_depth)
            }
            DecodeErrorKind::UnknownTag(tag) => write!(f, "unknown type tag 0x{:02x}", tag),
            DecodeErrorKind::TruncatedInput => write!(f, "input ended before declared length"),
            DecodeErrorKind::KeyIndexOutOfRange {
                index,
                dictionary_len,
            } => write!(
                f,
                "key index {} is not less than dictionary size {}",
                index, dictionary_len
            ),
            DecodeErrorKind::KeyIndexNotAscending => {
                write!(f, "object key indices are not strictly ascending")
            }
            DecodeErrorKind::TrailingBytes { extra } => {
                write!(f, "{} trailing byte(s) after root value", extra)
            }
            DecodeErrorKind::MalformedVarint => {
                write!(f, "malformed LEB128 varint (no terminator within 10 bytes)")
            }
            DecodeErrorKind::FrameTooLarge { max, actual } => {
                write!(f, "frame of {} bytes exceeds maximum of {}", actual, max)
            }
            DecodeErrorKind::TruncatedStream => {
                write!(f, "stream ended with a partial frame buffered")
            }
            DecodeErrorKind::PoolClosed => write!(f, "decoder pool has been destroyed"),
        }
    }
}

/// A failure while decoding binary bytes, with the byte offset at which
/// validation failed (relative to the start of the payload, or for stream
/// errors, relative to the start of the stream).
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub offset: usize,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind, self.offset)
    }
}

impl std::error::Error for DecodeError {}
