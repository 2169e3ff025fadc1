//! Key dictionary construction for the binary encoder: a pre-order
//! traversal collecting every key used by any object, deduplicated and
//! then sorted by UTF-8 byte order, per spec section 4.3/9.

use std::collections::HashSet;

use crate::error::{EncodeError, EncodeErrorKind, EncodeResult};
use crate::value::Value;

/// The sorted, deduplicated key dictionary for one document, plus a lookup
/// from key to its dictionary index.
pub struct Dictionary<'a> {
    /// Keys in ascending UTF-8 byte order; index in this vector is the
    /// key's dictionary ID.
    pub sorted: Vec<&'a str>,
}

impl<'a> Dictionary<'a> {
    /// Build the dictionary for `value`, bailing out as soon as collection
    /// would exceed `u32::MAX` distinct keys (the hard cap the wire format
    /// itself imposes via its `u32` dictionary count).
    pub fn build(value: &'a Value) -> EncodeResult<Self> {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut collected: Vec<&'a str> = Vec::new();
        collect_keys(value, &mut seen, &mut collected)?;
        collected.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        Ok(Dictionary { sorted: collected })
    }

    /// The dictionary index of `key`. Panics if `key` was not collected by
    /// [`Dictionary::build`] from the same value tree; callers only ever
    /// look up keys that came from the tree the dictionary was built from.
    pub fn index_of(&self, key: &str) -> u32 {
        self.sorted
            .binary_search_by(|probe| probe.as_bytes().cmp(key.as_bytes()))
            .expect("key absent from its own document's dictionary") as u32
    }
}

fn collect_keys<'a>(
    value: &'a Value,
    seen: &mut HashSet<&'a str>,
    collected: &mut Vec<&'a str>,
) -> EncodeResult<()> {
    match value {
        Value::Object(pairs) => {
            for (key, child) in pairs {
                if seen.insert(key.as_str()) {
                    if collected.len() >= u32::MAX as usize {
                        return Err(EncodeError::new(EncodeErrorKind::CountOverflow {
                            what: "dictionary size",
                        }));
                    }
                    collected.push(key.as_str());
                }
                collect_keys(child, seen, collected)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                collect_keys(item, seen, collected)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dedups_and_sorts() {
        let v = Value::Object(vec![
            ("b".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Object(vec![("b".to_string(), Value::Int(2))])),
        ]);
        let dict = Dictionary::build(&v).unwrap();
        assert_eq!(dict.sorted, vec!["a", "b"]);
        assert_eq!(dict.index_of("a"), 0);
        assert_eq!(dict.index_of("b"), 1);
    }
}
