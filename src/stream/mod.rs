//! Streaming codec: frame-oriented encoding/decoding of value sequences,
//! per spec section 4.5.

pub mod frame;
pub mod varint;

pub use frame::{AsyncDecodeStream, DecodeStream, EncodeStream, FrameError, FrameOptions};
