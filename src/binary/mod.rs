//! The `.kod` canonical binary format: markers, key dictionary, encoder,
//! and decoder.

pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod marker;

pub use decoder::{decode_sync, DecodeOptions};
pub use encoder::{encode, EncodeOptions};
pub use marker::Marker;
