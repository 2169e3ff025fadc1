//! The in-memory data model: [`Value`], the tagged variant every other
//! component of this crate produces or consumes.

use serde::{Deserialize, Serialize};

/// A single KODA value.
///
/// This is the only data type the text parser, text serializer, binary
/// encoder, and binary decoder exchange. It is immutable from the engine's
/// point of view: none of `parse`, `stringify`, `encode`, or `decode_sync`
/// ever mutates a `Value` passed to them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// An IEEE-754 binary64 float.
    Float(f64),
    /// Unicode text.
    String(String),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// A sequence of key/value pairs. Keys are unique within one object;
    /// insertion order is preserved here. See [`Value::sorted_pairs`] for
    /// the canonical, order-independent view used by the binary encoder.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Build an empty object.
    pub fn empty_object() -> Value {
        Value::Object(Vec::new())
    }

    /// Build an empty array.
    pub fn empty_array() -> Value {
        Value::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Look up a key in this object's in-memory (insertion) order. Returns
    /// `None` for non-objects as well as for a missing key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns this object's pairs sorted by the lexicographic UTF-8 byte
    /// order of their keys: the canonical view used by the binary encoder.
    /// Computed fresh on each call rather than cached, per the design note
    /// that canonical order is a view, not a stored property, of an object.
    ///
    /// Returns `None` for non-objects.
    pub fn sorted_pairs(&self) -> Option<Vec<(&str, &Value)>> {
        match self {
            Value::Object(pairs) => {
                let mut sorted: Vec<(&str, &Value)> =
                    pairs.iter().map(|(k, v)| (k.as_str(), v)).collect();
                sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
                Some(sorted)
            }
            _ => None,
        }
    }
}

/// The maximum container nesting depth of a value tree: 1 for any scalar,
/// `1 + max(child depth)` for a container, with an empty container
/// contributing a child depth of 0.
pub fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        Value::Object(pairs) => 1 + pairs.iter().map(|(_, v)| depth(v)).max().unwrap_or(0),
        _ => 1,
    }
}

/// Structural equality: strings compare byte-for-byte, `Int` and `Float`
/// never compare equal even at the same numeric value, objects compare as
/// unordered key/value sets (insertion order may differ), and all NaN bit
/// patterns compare equal to each other (matching the canonicalization
/// comparison carve-out in the binary decoder's contract).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits() || a == b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut a_sorted: Vec<&(String, Value)> = a.iter().collect();
                let mut b_sorted: Vec<&(String, Value)> = b.iter().collect();
                a_sorted.sort_by(|x, y| x.0.as_bytes().cmp(y.0.as_bytes()));
                b_sorted.sort_by(|x, y| x.0.as_bytes().cmp(y.0.as_bytes()));
                a_sorted
                    .iter()
                    .zip(b_sorted.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            _ => false,
        }
    }
}
