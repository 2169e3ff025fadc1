//! Canonical binary encoder: walks a [`Value`], builds the key dictionary,
//! and emits bit-exact `.kod` bytes per spec section 4.3.

use byteorder::{BigEndian, WriteBytesExt};

use crate::binary::dictionary::Dictionary;
use crate::binary::marker::{Marker, CANONICAL_NAN_BITS, MAGIC, VERSION};
use crate::error::{EncodeError, EncodeErrorKind, EncodeResult};
use crate::value::Value;

/// Options controlling [`encode`].
#[derive(Clone, Copy, Debug)]
pub struct EncodeOptions {
    /// Reject values whose container nesting exceeds this bound.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { max_depth: 256 }
    }
}

impl EncodeOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Encode `value` to a canonical `.kod` byte sequence.
///
/// Two calls on the same (or structurally equal) value always produce
/// byte-identical output: encoding never depends on anything but the
/// value's own contents.
pub fn encode(value: &Value, options: EncodeOptions) -> EncodeResult<Vec<u8>> {
    let dictionary = Dictionary::build(value)?;
    if dictionary.sorted.len() > u32::MAX as usize {
        return Err(EncodeError::new(EncodeErrorKind::CountOverflow {
            what: "dictionary size",
        }));
    }

    let mut buf = Vec::new();
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.write_u32::<BigEndian>(dictionary.sorted.len() as u32)
        .expect("writes to a Vec never fail");
    for key in &dictionary.sorted {
        let bytes = key.as_bytes();
        if bytes.len() > u32::MAX as usize {
            return Err(EncodeError::new(EncodeErrorKind::CountOverflow {
                what: "key length",
            }));
        }
        buf.write_u32::<BigEndian>(bytes.len() as u32)
            .expect("writes to a Vec never fail");
        buf.extend_from_slice(bytes);
    }

    encode_value(value, &dictionary, options.max_depth, 0, &mut buf)?;
    Ok(buf)
}

fn encode_value(
    value: &Value,
    dictionary: &Dictionary,
    max_depth: usize,
    depth: usize,
    buf: &mut Vec<u8>,
) -> EncodeResult<()> {
    match value {
        Value::Null => buf.push(Marker::Null.into()),
        Value::Bool(false) => buf.push(Marker::False.into()),
        Value::Bool(true) => buf.push(Marker::True.into()),
        Value::Int(n) => {
            buf.push(Marker::Int.into());
            buf.write_i64::<BigEndian>(*n)
                .expect("writes to a Vec never fail");
        }
        Value::Float(f) => {
            buf.push(Marker::Float.into());
            let bits = if f.is_nan() { CANONICAL_NAN_BITS } else { f.to_bits() };
            buf.write_u64::<BigEndian>(bits)
                .expect("writes to a Vec never fail");
        }
        Value::String(s) => encode_string(s, buf)?,
        Value::Array(items) => {
            let depth = enter_depth(max_depth, depth)?;
            if items.len() > u32::MAX as usize {
                return Err(EncodeError::new(EncodeErrorKind::CountOverflow {
                    what: "array length",
                }));
            }
            buf.push(Marker::Array.into());
            buf.write_u32::<BigEndian>(items.len() as u32)
                .expect("writes to a Vec never fail");
            for item in items {
                encode_value(item, dictionary, max_depth, depth, buf)?;
            }
        }
        Value::Object(pairs) => {
            let depth = enter_depth(max_depth, depth)?;
            check_no_duplicate_keys(pairs)?;
            if pairs.len() > u32::MAX as usize {
                return Err(EncodeError::new(EncodeErrorKind::CountOverflow {
                    what: "object pair count",
                }));
            }
            buf.push(Marker::Object.into());
            buf.write_u32::<BigEndian>(pairs.len() as u32)
                .expect("writes to a Vec never fail");
            let sorted = value.sorted_pairs().expect("value is an Object");
            for (key, child) in sorted {
                buf.write_u32::<BigEndian>(dictionary.index_of(key))
                    .expect("writes to a Vec never fail");
                encode_value(child, dictionary, max_depth, depth, buf)?;
            }
        }
    }
    Ok(())
}

fn enter_depth(max_depth: usize, depth: usize) -> EncodeResult<usize> {
    let depth = depth + 1;
    if depth > max_depth {
        return Err(EncodeError::new(EncodeErrorKind::DepthExceeded { max_depth }));
    }
    Ok(depth)
}

fn check_no_duplicate_keys(pairs: &[(String, Value)]) -> EncodeResult<()> {
    for (i, (key, _)) in pairs.iter().enumerate() {
        if pairs[..i].iter().any(|(k, _)| k == key) {
            return Err(EncodeError::new(EncodeErrorKind::DuplicateKey(key.clone())));
        }
    }
    Ok(())
}

fn encode_string(s: &str, buf: &mut Vec<u8>) -> EncodeResult<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u32::MAX as usize {
        return Err(EncodeError::new(EncodeErrorKind::CountOverflow {
            what: "string length",
        }));
    }
    buf.push(Marker::String.into());
    buf.write_u32::<BigEndian>(bytes.len() as u32)
        .expect("writes to a Vec never fail");
    buf.extend_from_slice(bytes);
    Ok(())
}
