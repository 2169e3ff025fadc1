//! KODA: a compact, canonical data format with a human-editable text form
//! (`.koda`) and a deterministic binary form (`.kod`) that always decode to
//! the same [`Value`] tree.
#![allow(dead_code)]
#![recursion_limit = "500"]

extern crate byteorder;

pub mod binary;
pub mod error;
pub mod io;
pub mod pool;
pub mod stream;
pub mod text;
pub mod value;

pub use binary::{decode_sync, encode, DecodeOptions, EncodeOptions};
pub use error::{DecodeError, EncodeError, ParseError};
pub use io::{load_binary_file, load_text_file, save_binary_file, save_text_file, FileError};
pub use pool::{DecoderPool, DecodeTask};
pub use stream::{AsyncDecodeStream, DecodeStream, EncodeStream, FrameError, FrameOptions};
pub use text::{parse, stringify, ParseOptions, StringifyOptions};
pub use value::Value;
