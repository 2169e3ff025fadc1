//! Thin synchronous file I/O wrappers, for consumers that just want to load
//! or save a `.koda`/`.kod` file without owning their own [`std::fs`] calls.
//! No retry, locking, or atomic-rename logic lives here: that belongs to
//! callers with their own durability requirements.

use std::fs;
use std::path::Path;

use crate::binary::{decode_sync, encode, DecodeOptions, EncodeOptions};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
use crate::text::{parse, stringify, ParseOptions, StringifyOptions};
use crate::value::Value;

/// A failure loading or saving a file: either the file system refused the
/// operation, or the bytes it held didn't parse/decode.
#[derive(Debug)]
pub enum FileError {
    Io(std::io::Error),
    Parse(crate::error::ParseError),
    Decode(DecodeError),
    Encode(EncodeError),
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "{}", e),
            FileError::Parse(e) => write!(f, "{}", e),
            FileError::Decode(e) => write!(f, "{}", e),
            FileError::Encode(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::Io(e) => Some(e),
            FileError::Parse(e) => Some(e),
            FileError::Decode(e) => Some(e),
            FileError::Encode(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        FileError::Io(e)
    }
}

/// Load a `.koda` text file, parsing it with default [`ParseOptions`].
pub fn load_text_file(path: impl AsRef<Path>) -> Result<Value, FileError> {
    let text = fs::read_to_string(path)?;
    parse(&text, ParseOptions::default()).map_err(FileError::Parse)
}

/// Save `value` to a `.koda` text file using default [`StringifyOptions`].
pub fn save_text_file(path: impl AsRef<Path>, value: &Value) -> Result<(), FileError> {
    let text = stringify(value, &StringifyOptions::default());
    fs::write(path, text)?;
    Ok(())
}

/// Load a `.kod` binary file, decoding it with default [`DecodeOptions`].
///
/// Returns [`DecodeErrorKind::TooShort`] (wrapped in [`FileError::Decode`])
/// for an empty or truncated file rather than a bare I/O success with
/// nothing to decode.
pub fn load_binary_file(path: impl AsRef<Path>) -> Result<Value, FileError> {
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(FileError::Decode(DecodeError::new(
            DecodeErrorKind::TooShort,
            0,
        )));
    }
    decode_sync(&bytes, DecodeOptions::default()).map_err(FileError::Decode)
}

/// Save `value` to a `.kod` binary file using default [`EncodeOptions`].
pub fn save_binary_file(path: impl AsRef<Path>, value: &Value) -> Result<(), FileError> {
    let bytes = encode(value, EncodeOptions::default()).map_err(FileError::Encode)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_a_text_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("koda-io-test-{}.koda", std::process::id()));
        let value = Value::Object(vec![("greeting".to_string(), Value::String("hi".to_string()))]);
        save_text_file(&path, &value).unwrap();
        let loaded = load_text_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, value);
    }

    #[test]
    fn round_trips_through_a_binary_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("koda-io-test-{}.kod", std::process::id()));
        let value = Value::Array(vec![Value::Int(1), Value::Float(2.5), Value::Null]);
        save_binary_file(&path, &value).unwrap();
        let loaded = load_binary_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, value);
    }

    #[test]
    fn loading_a_missing_file_is_an_io_error() {
        let err = load_text_file("/nonexistent/path/does-not-exist.koda").unwrap_err();
        assert!(matches!(err, FileError::Io(_)));
    }
}
