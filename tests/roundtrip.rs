//! Cross-module properties: text and binary round-trip, canonical
//! determinism, streaming equivalence, and resource bounds.

use rand::Rng;

use koda::binary::{decode_sync, encode, DecodeOptions, EncodeOptions};
use koda::error::DecodeErrorKind;
use koda::stream::{DecodeStream, EncodeStream, FrameError};
use koda::text::{parse, stringify, Indent, ParseOptions, StringifyOptions};
use koda::value::Value;

fn arbitrary_value(rng: &mut impl Rng, depth_budget: usize) -> Value {
    let choices: u32 = if depth_budget == 0 { 5 } else { 7 };
    match rng.gen_range(0..choices) {
        0 => Value::Null,
        1 => Value::Bool(rng.gen()),
        2 => Value::Int(rng.gen()),
        3 => Value::Float(rng.gen::<f64>() * 1000.0 - 500.0),
        4 => {
            let len = rng.gen_range(0..8);
            let s: String = (0..len)
                .map(|_| (b'a' + rng.gen_range(0..26)) as char)
                .collect();
            Value::String(s)
        }
        5 => {
            let len = rng.gen_range(0..4);
            Value::Array(
                (0..len)
                    .map(|_| arbitrary_value(rng, depth_budget - 1))
                    .collect(),
            )
        }
        _ => {
            let len = rng.gen_range(0..4);
            let mut pairs = Vec::new();
            for i in 0..len {
                let key = format!("k{}", i);
                pairs.push((key, arbitrary_value(rng, depth_budget - 1)));
            }
            Value::Object(pairs)
        }
    }
}

fn sample_value() -> Value {
    Value::Object(vec![
        (
            "name".to_string(),
            Value::String("koda".to_string()),
        ),
        (
            "tags".to_string(),
            Value::Array(vec![
                Value::String("compact".to_string()),
                Value::String("canonical".to_string()),
            ]),
        ),
        (
            "version".to_string(),
            Value::Int(1),
        ),
        (
            "ratio".to_string(),
            Value::Float(0.5),
        ),
        (
            "enabled".to_string(),
            Value::Bool(true),
        ),
        ("nested".to_string(), Value::empty_object()),
    ])
}

#[test]
fn text_round_trips_through_compact_and_indented_forms() {
    let value = sample_value();
    let compact = stringify(&value, &StringifyOptions::default());
    let reparsed = parse(&compact, ParseOptions::default()).unwrap();
    assert_eq!(reparsed, value);

    let indented = stringify(
        &value,
        &StringifyOptions::default().with_indent(Indent::spaces(2)),
    );
    let reparsed_indented = parse(&indented, ParseOptions::default()).unwrap();
    assert_eq!(reparsed_indented, value);
}

#[test]
fn binary_round_trips() {
    let value = sample_value();
    let bytes = encode(&value, EncodeOptions::default()).unwrap();
    let decoded = decode_sync(&bytes, DecodeOptions::default()).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn binary_encoding_is_canonically_deterministic_regardless_of_key_order() {
    let forward = Value::Object(vec![
        ("a".to_string(), Value::Int(1)),
        ("b".to_string(), Value::Int(2)),
        ("c".to_string(), Value::Int(3)),
    ]);
    let shuffled = Value::Object(vec![
        ("c".to_string(), Value::Int(3)),
        ("a".to_string(), Value::Int(1)),
        ("b".to_string(), Value::Int(2)),
    ]);
    let a = encode(&forward, EncodeOptions::default()).unwrap();
    let b = encode(&shuffled, EncodeOptions::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn canonicalization_is_idempotent() {
    let value = sample_value();
    let once = encode(&value, EncodeOptions::default()).unwrap();
    let decoded_once = decode_sync(&once, DecodeOptions::default()).unwrap();
    let twice = encode(&decoded_once, EncodeOptions::default()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn text_and_binary_forms_of_the_same_value_agree() {
    let value = sample_value();
    let text = stringify(&value, &StringifyOptions::default());
    let from_text = parse(&text, ParseOptions::default()).unwrap();
    let bytes = encode(&value, EncodeOptions::default()).unwrap();
    let from_binary = decode_sync(&bytes, DecodeOptions::default()).unwrap();
    assert_eq!(from_text, from_binary);
}

#[test]
fn decode_enforces_a_tight_depth_bound() {
    let value = Value::Array(vec![Value::Array(vec![Value::Array(vec![Value::Null])])]);
    let bytes = encode(&value, EncodeOptions::default()).unwrap();
    let err = decode_sync(&bytes, DecodeOptions::default().with_max_depth(2)).unwrap_err();
    assert_eq!(err.kind, DecodeErrorKind::DepthExceeded { max_depth: 2 });
}

#[test]
fn parse_enforces_an_input_length_bound() {
    let text = stringify(&sample_value(), &StringifyOptions::default());
    let err = parse(&text, ParseOptions::default().with_max_input_length(4)).unwrap_err();
    assert!(matches!(
        err.kind,
        koda::error::ParseErrorKind::InputTooLarge { .. }
    ));
}

#[test]
fn a_malformed_dictionary_is_rejected_by_decode() {
    // magic, version, dict count = 2, keys "b" then "a" (not ascending)
    let mut bytes = vec![0x4B, 0x4F, 0x44, 0x41, 0x01];
    bytes.extend_from_slice(&2u32.to_be_bytes());
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.push(b'b');
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.push(b'a');
    bytes.push(0x01); // Null
    let err = decode_sync(&bytes, DecodeOptions::default()).unwrap_err();
    assert_eq!(err.kind, DecodeErrorKind::DictionaryNotSorted { index: 1 });
    // points at the second key's offset, not the start of the payload
    assert_eq!(err.offset, 14);
}

#[test]
fn a_stream_reassembles_values_split_arbitrarily_across_chunks() {
    let values = vec![sample_value(), Value::Int(42), Value::Null];
    let mut framed = Vec::new();
    {
        let mut encoder = EncodeStream::new(&mut framed);
        for v in &values {
            encoder.write_value(v).unwrap();
        }
    }

    // Feed the stream back in arbitrary, uneven chunk sizes.
    let mut decoder = DecodeStream::new();
    let mut decoded = Vec::new();
    for chunk in framed.chunks(3) {
        decoded.extend(decoder.push(chunk).unwrap());
    }
    decoder.finish().unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn arbitrary_values_survive_both_text_and_binary_round_trips() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let value = arbitrary_value(&mut rng, 3);

        let text = stringify(&value, &StringifyOptions::default());
        let from_text = parse(&text, ParseOptions::default()).unwrap();
        assert_eq!(from_text, value);

        let bytes = encode(&value, EncodeOptions::default()).unwrap();
        let from_binary = decode_sync(&bytes, DecodeOptions::default()).unwrap();
        assert_eq!(from_binary, value);
    }
}

#[test]
fn a_stream_frame_declaring_an_oversized_payload_is_rejected() {
    let value = Value::String("x".repeat(64));
    let mut framed = Vec::new();
    EncodeStream::new(&mut framed).write_value(&value).unwrap();

    let options = koda::stream::FrameOptions::default().with_max_frame_size(8);
    let mut decoder = DecodeStream::with_options(options);
    let err = decoder.push(&framed).unwrap_err();
    assert!(matches!(
        err,
        FrameError::Decode(koda::error::DecodeError {
            kind: DecodeErrorKind::FrameTooLarge { .. },
            ..
        })
    ));
}
