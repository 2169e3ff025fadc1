//! Frame codec for streaming sequences of KODA values: each frame is an
//! unsigned LEB128 length prefix followed by that many bytes of canonical
//! binary payload, per spec section 4.5.

use std::fmt;
use std::io::{self, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::{ready, Stream};
use pin_project_lite::pin_project;

use crate::binary::{decode_sync, encode, DecodeOptions, EncodeOptions};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
use crate::stream::varint::{read_uvarint, write_uvarint, MAX_VARINT_BYTES};
use crate::value::Value;

/// Bounds on a single frame, shared by [`EncodeStream`] and [`DecodeStream`].
#[derive(Clone, Copy, Debug)]
pub struct FrameOptions {
    /// Reject (on decode) or refuse to emit (on encode) a frame whose
    /// payload would be larger than this many bytes.
    pub max_frame_size: u32,
    /// Forwarded to [`crate::binary::decode_sync`] for each frame's payload.
    pub decode: DecodeOptions,
    /// Forwarded to [`crate::binary::encode`] for each value encoded.
    pub encode: EncodeOptions,
}

impl Default for FrameOptions {
    fn default() -> Self {
        FrameOptions {
            max_frame_size: 1 << 20,
            decode: DecodeOptions::default(),
            encode: EncodeOptions::default(),
        }
    }
}

impl FrameOptions {
    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }
}

/// Failure modes that can arise while encoding to or decoding from a frame
/// stream: an underlying I/O failure, or a failure from the single-value
/// codec underneath.
#[derive(Debug)]
pub enum FrameError {
    Io(io::Error),
    Encode(EncodeError),
    Decode(DecodeError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Io(e) => write!(f, "{}", e),
            FrameError::Encode(e) => write!(f, "{}", e),
            FrameError::Decode(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Io(e) => Some(e),
            FrameError::Encode(e) => Some(e),
            FrameError::Decode(e) => Some(e),
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        FrameError::Io(e)
    }
}

impl From<EncodeError> for FrameError {
    fn from(e: EncodeError) -> Self {
        FrameError::Encode(e)
    }
}

impl From<DecodeError> for FrameError {
    fn from(e: DecodeError) -> Self {
        FrameError::Decode(e)
    }
}

/// Writes a sequence of values to a blocking [`Write`] sink, each prefixed
/// with an LEB128 frame length. A write is accepted once `sink.write_all`
/// returns, so backpressure lives in the sink itself.
pub struct EncodeStream<W> {
    sink: W,
    options: FrameOptions,
}

impl<W: Write> EncodeStream<W> {
    pub fn new(sink: W) -> Self {
        EncodeStream {
            sink,
            options: FrameOptions::default(),
        }
    }

    pub fn with_options(sink: W, options: FrameOptions) -> Self {
        EncodeStream { sink, options }
    }

    /// Encode `value` and write it as one frame.
    pub fn write_value(&mut self, value: &Value) -> Result<(), FrameError> {
        let payload = encode(value, self.options.encode)?;
        if payload.len() as u64 > self.options.max_frame_size as u64 {
            return Err(FrameError::Decode(DecodeError::new(
                DecodeErrorKind::FrameTooLarge {
                    max: self.options.max_frame_size,
                    actual: payload.len() as u64,
                },
                0,
            )));
        }
        let mut len_buf = Vec::with_capacity(MAX_VARINT_BYTES);
        write_uvarint(payload.len() as u64, &mut len_buf);
        self.sink.write_all(&len_buf)?;
        self.sink.write_all(&payload)?;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Recover the wrapped sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

#[derive(Debug)]
enum DecodeState {
    ReadLen,
    ReadPayload { frame_len: usize },
}

/// A push-based state machine reassembling length-prefixed frames from
/// byte chunks that may split both the length prefix and the payload at
/// arbitrary boundaries.
pub struct DecodeStream {
    options: FrameOptions,
    buf: Vec<u8>,
    state: DecodeState,
    bytes_consumed: usize,
}

impl DecodeStream {
    pub fn new() -> Self {
        DecodeStream::with_options(FrameOptions::default())
    }

    pub fn with_options(options: FrameOptions) -> Self {
        DecodeStream {
            options,
            buf: Vec::new(),
            state: DecodeState::ReadLen,
            bytes_consumed: 0,
        }
    }

    /// Feed `chunk` into the reassembly buffer and return every value whose
    /// frame became complete as a result.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Value>, FrameError> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        loop {
            match self.state {
                DecodeState::ReadLen => {
                    match read_uvarint(&self.buf)
                        .map_err(|e| FrameError::Decode(self.at_offset(e)))?
                    {
                        None => break,
                        Some((len, consumed)) => {
                            if len > self.options.max_frame_size as u64 {
                                return Err(FrameError::Decode(DecodeError::new(
                                    DecodeErrorKind::FrameTooLarge {
                                        max: self.options.max_frame_size,
                                        actual: len,
                                    },
                                    self.bytes_consumed,
                                )));
                            }
                            self.buf.drain(..consumed);
                            self.bytes_consumed += consumed;
                            self.state = DecodeState::ReadPayload {
                                frame_len: len as usize,
                            };
                        }
                    }
                }
                DecodeState::ReadPayload { frame_len } => {
                    if self.buf.len() < frame_len {
                        break;
                    }
                    let payload: Vec<u8> = self.buf.drain(..frame_len).collect();
                    self.bytes_consumed += frame_len;
                    let value = decode_sync(&payload, self.options.decode)
                        .map_err(|e| FrameError::Decode(self.at_offset(e)))?;
                    out.push(value);
                    self.state = DecodeState::ReadLen;
                }
            }
        }
        Ok(out)
    }

    /// Call once the byte source is exhausted. Returns an error if a frame
    /// was left partially buffered.
    pub fn finish(self) -> Result<(), FrameError> {
        let idle = matches!(self.state, DecodeState::ReadLen) && self.buf.is_empty();
        if idle {
            Ok(())
        } else {
            Err(FrameError::Decode(DecodeError::new(
                DecodeErrorKind::TruncatedStream,
                self.bytes_consumed,
            )))
        }
    }

    fn at_offset(&self, e: DecodeError) -> DecodeError {
        DecodeError::new(e.kind, self.bytes_consumed + e.offset)
    }
}

impl Default for DecodeStream {
    fn default() -> Self {
        DecodeStream::new()
    }
}

pin_project! {
    /// Adapts a [`Stream`] of raw byte chunks into a [`Stream`] of decoded
    /// [`Value`]s, reassembling frames with an internal [`DecodeStream`]
    /// the same way the teacher's `AsyncVecDocumentBuilder` adapts an item
    /// stream into a document stream.
    #[must_use = "streams do nothing unless polled"]
    pub struct AsyncDecodeStream<St> {
        #[pin]
        inner: St,
        decoder: DecodeStream,
        pending: std::collections::VecDeque<Value>,
        done: bool,
    }
}

impl<St> AsyncDecodeStream<St> {
    pub fn new(inner: St) -> Self {
        AsyncDecodeStream {
            inner,
            decoder: DecodeStream::new(),
            pending: std::collections::VecDeque::new(),
            done: false,
        }
    }

    pub fn with_options(inner: St, options: FrameOptions) -> Self {
        AsyncDecodeStream {
            inner,
            decoder: DecodeStream::with_options(options),
            pending: std::collections::VecDeque::new(),
            done: false,
        }
    }
}

impl<St, E> Stream for AsyncDecodeStream<St>
where
    St: Stream<Item = Result<Vec<u8>, E>>,
    FrameError: From<E>,
{
    type Item = Result<Value, FrameError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if let Some(value) = this.pending.pop_front() {
            return Poll::Ready(Some(Ok(value)));
        }
        if *this.done {
            return Poll::Ready(None);
        }
        Poll::Ready(loop {
            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => match this.decoder.push(&chunk) {
                    Ok(mut values) => {
                        if values.is_empty() {
                            continue;
                        }
                        let first = values.remove(0);
                        this.pending.extend(values);
                        break Some(Ok(first));
                    }
                    Err(e) => {
                        *this.done = true;
                        break Some(Err(e));
                    }
                },
                Some(Err(e)) => {
                    *this.done = true;
                    break Some(Err(FrameError::from(e)));
                }
                None => {
                    *this.done = true;
                    break None;
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_one_value_through_a_vec_sink() {
        let value = Value::Object(vec![("a".to_string(), Value::Int(1))]);
        let mut out = Vec::new();
        let mut encoder = EncodeStream::new(&mut out);
        encoder.write_value(&value).unwrap();

        let mut decoder = DecodeStream::new();
        let values = decoder.push(&out).unwrap();
        assert_eq!(values, vec![value]);
        decoder.finish().unwrap();
    }

    #[test]
    fn reassembles_frames_split_across_many_chunks() {
        let values = vec![
            Value::String("first".to_string()),
            Value::Array(vec![Value::Int(1), Value::Int(2)]),
            Value::Null,
        ];
        let mut out = Vec::new();
        {
            let mut encoder = EncodeStream::new(&mut out);
            for v in &values {
                encoder.write_value(v).unwrap();
            }
        }

        let mut decoder = DecodeStream::new();
        let mut decoded = Vec::new();
        for byte in &out {
            decoded.extend(decoder.push(std::slice::from_ref(byte)).unwrap());
        }
        decoder.finish().unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn finish_rejects_a_dangling_partial_frame() {
        let value = Value::String("hello".to_string());
        let mut out = Vec::new();
        EncodeStream::new(&mut out).write_value(&value).unwrap();
        out.truncate(out.len() - 1);

        let mut decoder = DecodeStream::new();
        decoder.push(&out).unwrap();
        let err = decoder.finish().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Decode(DecodeError {
                kind: DecodeErrorKind::TruncatedStream,
                ..
            })
        ));
    }

    #[test]
    fn oversized_frame_is_rejected_during_decode() {
        let value = Value::String("x".repeat(100));
        let mut out = Vec::new();
        EncodeStream::new(&mut out).write_value(&value).unwrap();

        let options = FrameOptions::default().with_max_frame_size(10);
        let mut decoder = DecodeStream::with_options(options);
        let err = decoder.push(&out).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Decode(DecodeError {
                kind: DecodeErrorKind::FrameTooLarge { .. },
                ..
            })
        ));
    }

    #[test]
    fn oversized_frame_is_rejected_during_encode() {
        let value = Value::String("x".repeat(100));
        let options = FrameOptions::default().with_max_frame_size(10);
        let mut out = Vec::new();
        let mut encoder = EncodeStream::with_options(&mut out, options);
        let err = encoder.write_value(&value).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Decode(DecodeError {
                kind: DecodeErrorKind::FrameTooLarge { .. },
                ..
            })
        ));
    }

    #[test]
    fn async_stream_yields_values_in_order() {
        use futures_util::stream::{self, StreamExt};

        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let mut out = Vec::new();
        {
            let mut encoder = EncodeStream::new(&mut out);
            for v in &values {
                encoder.write_value(v).unwrap();
            }
        }

        // Split into single-byte chunks to exercise reassembly across polls.
        let chunks: Vec<Result<Vec<u8>, FrameError>> =
            out.iter().map(|b| Ok(vec![*b])).collect();
        let byte_stream = stream::iter(chunks);
        let decoded: Vec<Value> = futures_executor::block_on(
            AsyncDecodeStream::new(byte_stream)
                .map(|r| r.unwrap())
                .collect(),
        );
        assert_eq!(decoded, values);
    }
}
