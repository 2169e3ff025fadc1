//! Canonical binary decoder: validates and reconstructs a [`Value`] from
//! `.kod` bytes under resource bounds, per spec section 4.4.

use byteorder::{BigEndian, ReadBytesExt};

use crate::binary::marker::{Marker, MAGIC, VERSION};
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};
use crate::value::Value;

/// Options controlling [`decode_sync`].
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    /// Reject payloads whose container nesting exceeds this bound.
    pub max_depth: usize,
    /// Reject payloads whose key dictionary has more than this many entries.
    pub max_dictionary_size: u32,
    /// Reject payloads containing a string (dictionary key or value) longer
    /// than this many bytes.
    pub max_string_length: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: 256,
            max_dictionary_size: 65_536,
            max_string_length: 1_000_000,
        }
    }
}

impl DecodeOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_dictionary_size(mut self, max_dictionary_size: u32) -> Self {
        self.max_dictionary_size = max_dictionary_size;
        self
    }

    pub fn with_max_string_length(mut self, max_string_length: u32) -> Self {
        self.max_string_length = max_string_length;
        self
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    start_len: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor {
            buf,
            start_len: buf.len(),
        }
    }

    fn offset(&self) -> usize {
        self.start_len - self.buf.len()
    }

    fn take(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if self.buf.len() < n {
            return Err(DecodeError::new(DecodeErrorKind::TruncatedInput, self.offset()));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_u8(&mut self) -> DecodeResult<u8> {
        let offset = self.offset();
        self.buf
            .read_u8()
            .map_err(|_| DecodeError::new(DecodeErrorKind::TruncatedInput, offset))
    }

    fn read_u32(&mut self) -> DecodeResult<u32> {
        let offset = self.offset();
        self.buf
            .read_u32::<BigEndian>()
            .map_err(|_| DecodeError::new(DecodeErrorKind::TruncatedInput, offset))
    }

    fn read_i64(&mut self) -> DecodeResult<i64> {
        let offset = self.offset();
        self.buf
            .read_i64::<BigEndian>()
            .map_err(|_| DecodeError::new(DecodeErrorKind::TruncatedInput, offset))
    }

    fn read_u64(&mut self) -> DecodeResult<u64> {
        let offset = self.offset();
        self.buf
            .read_u64::<BigEndian>()
            .map_err(|_| DecodeError::new(DecodeErrorKind::TruncatedInput, offset))
    }
}

/// Decode a single `.kod` payload into a [`Value`], per the five-step
/// validation order in spec section 4.4.
pub fn decode_sync(bytes: &[u8], options: DecodeOptions) -> DecodeResult<Value> {
    if bytes.len() < 5 {
        return Err(DecodeError::new(DecodeErrorKind::TooShort, 0));
    }
    let mut cursor = Cursor::new(bytes);
    let magic = cursor.take(4)?;
    if magic != MAGIC {
        return Err(DecodeError::new(DecodeErrorKind::BadMagic, 0));
    }
    let version = cursor.read_u8()?;
    if version != VERSION {
        return Err(DecodeError::new(
            DecodeErrorKind::UnsupportedVersion(version),
            4,
        ));
    }

    let dict_count_offset = cursor.offset();
    let dict_count = cursor.read_u32()?;
    if dict_count > options.max_dictionary_size {
        return Err(DecodeError::new(
            DecodeErrorKind::DictionaryTooLarge {
                max: options.max_dictionary_size,
                actual: dict_count,
            },
            dict_count_offset,
        ));
    }

    let mut dictionary: Vec<String> = Vec::with_capacity(dict_count as usize);
    let mut dictionary_offsets: Vec<usize> = Vec::with_capacity(dict_count as usize);
    for _ in 0..dict_count {
        let len_offset = cursor.offset();
        let len = cursor.read_u32()?;
        if len > options.max_string_length {
            return Err(DecodeError::new(
                DecodeErrorKind::StringTooLong {
                    max: options.max_string_length,
                    actual: len,
                },
                len_offset,
            ));
        }
        let bytes = cursor.take(len as usize)?;
        let str_offset = cursor.offset() - bytes.len();
        let s = std::str::from_utf8(bytes)
            .map_err(|e| {
                DecodeError::new(DecodeErrorKind::InvalidUtf8, str_offset + e.valid_up_to())
            })?
            .to_string();
        dictionary.push(s);
        dictionary_offsets.push(len_offset);
    }
    for i in 1..dictionary.len() {
        if dictionary[i - 1].as_bytes() >= dictionary[i].as_bytes() {
            return Err(DecodeError::new(
                DecodeErrorKind::DictionaryNotSorted { index: i },
                dictionary_offsets[i],
            ));
        }
    }

    let value = decode_value(&mut cursor, &dictionary, &options, 0)?;

    if !cursor.buf.is_empty() {
        return Err(DecodeError::new(
            DecodeErrorKind::TrailingBytes {
                extra: cursor.buf.len(),
            },
            cursor.offset(),
        ));
    }

    Ok(value)
}

fn enter_depth(max_depth: usize, depth: usize, offset: usize) -> DecodeResult<usize> {
    let depth = depth + 1;
    if depth > max_depth {
        return Err(DecodeError::new(
            DecodeErrorKind::DepthExceeded { max_depth },
            offset,
        ));
    }
    Ok(depth)
}

fn decode_value(
    cursor: &mut Cursor,
    dictionary: &[String],
    options: &DecodeOptions,
    depth: usize,
) -> DecodeResult<Value> {
    let tag_offset = cursor.offset();
    let tag = cursor.read_u8()?;
    let marker = Marker::from_u8(tag)
        .ok_or_else(|| DecodeError::new(DecodeErrorKind::UnknownTag(tag), tag_offset))?;
    match marker {
        Marker::ReservedBinary => {
            Err(DecodeError::new(DecodeErrorKind::UnknownTag(tag), tag_offset))
        }
        Marker::Null => Ok(Value::Null),
        Marker::False => Ok(Value::Bool(false)),
        Marker::True => Ok(Value::Bool(true)),
        Marker::Int => Ok(Value::Int(cursor.read_i64()?)),
        Marker::Float => Ok(Value::Float(f64::from_bits(cursor.read_u64()?))),
        Marker::String => decode_string(cursor, options),
        Marker::Array => {
            let depth = enter_depth(options.max_depth, depth, tag_offset)?;
            let count = cursor.read_u32()?;
            let mut items = Vec::with_capacity(count.min(1_000_000) as usize);
            for _ in 0..count {
                items.push(decode_value(cursor, dictionary, options, depth)?);
            }
            Ok(Value::Array(items))
        }
        Marker::Object => {
            let depth = enter_depth(options.max_depth, depth, tag_offset)?;
            let count = cursor.read_u32()?;
            let mut pairs = Vec::with_capacity(count.min(1_000_000) as usize);
            let mut last_index: Option<u32> = None;
            for _ in 0..count {
                let index_offset = cursor.offset();
                let index = cursor.read_u32()?;
                if index >= dictionary.len() as u32 {
                    return Err(DecodeError::new(
                        DecodeErrorKind::KeyIndexOutOfRange {
                            index,
                            dictionary_len: dictionary.len() as u32,
                        },
                        index_offset,
                    ));
                }
                if let Some(last) = last_index {
                    if index <= last {
                        return Err(DecodeError::new(
                            DecodeErrorKind::KeyIndexNotAscending,
                            index_offset,
                        ));
                    }
                }
                last_index = Some(index);
                let value = decode_value(cursor, dictionary, options, depth)?;
                pairs.push((dictionary[index as usize].clone(), value));
            }
            Ok(Value::Object(pairs))
        }
    }
}

fn decode_string(cursor: &mut Cursor, options: &DecodeOptions) -> DecodeResult<Value> {
    let len_offset = cursor.offset();
    let len = cursor.read_u32()?;
    if len > options.max_string_length {
        return Err(DecodeError::new(
            DecodeErrorKind::StringTooLong {
                max: options.max_string_length,
                actual: len,
            },
            len_offset,
        ));
    }
    let bytes = cursor.take(len as usize)?;
    let str_offset = cursor.offset() - bytes.len();
    let s = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::new(DecodeErrorKind::InvalidUtf8, str_offset + e.valid_up_to()))?;
    Ok(Value::String(s.to_string()))
}
