//! `.koda` text serializer: turns a [`Value`] back into text such that
//! parsing the output reproduces a structurally equal value.

use crate::value::Value;

/// How nested elements are indented.
#[derive(Clone, Debug, PartialEq)]
pub enum Indent {
    /// Compact output: single spaces between key/value pairs, no newlines.
    None,
    /// Each element on its own line, indented with the given string
    /// repeated once per nesting level.
    Spaces(String),
}

impl Indent {
    pub fn spaces(n: usize) -> Self {
        Indent::Spaces(" ".repeat(n))
    }
}

/// Which newline sequence indented output uses between elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    fn as_str(self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }
}

/// Options controlling [`stringify`].
#[derive(Clone, Debug, PartialEq)]
pub struct StringifyOptions {
    pub indent: Indent,
    pub newline: Newline,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        StringifyOptions {
            indent: Indent::None,
            newline: Newline::Lf,
        }
    }
}

impl StringifyOptions {
    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }
}

/// `true` iff `s` matches the identifier grammar (`[A-Za-z_][A-Za-z0-9_-]*`)
/// and is not one of the reserved words `true`/`false`/`null`.
fn is_bare_identifier(s: &str) -> bool {
    if matches!(s, "true" | "false" | "null") {
        return false;
    }
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_key(out: &mut String, key: &str) {
    if is_bare_identifier(key) {
        out.push_str(key);
    } else {
        write_escaped_string(out, key);
    }
}

fn write_string_value(out: &mut String, s: &str) {
    if is_bare_identifier(s) {
        out.push_str(s);
    } else {
        write_escaped_string(out, s);
    }
}

fn write_float(out: &mut String, f: f64) {
    // `f64`'s `Debug` impl produces the shortest decimal string that
    // round-trips back to the same bit pattern, and unlike `Display` it is
    // guaranteed to include a decimal point or exponent even for integral
    // values (e.g. `1.0`, not `1`) so the output re-lexes as a Float.
    out.push_str(&format!("{:?}", f));
}

struct Writer<'a> {
    out: String,
    indent: &'a Indent,
    newline: &'static str,
}

impl<'a> Writer<'a> {
    fn write_indent(&mut self, level: usize) {
        if let Indent::Spaces(unit) = self.indent {
            for _ in 0..level {
                self.out.push_str(unit);
            }
        }
    }

    fn write_value(&mut self, value: &Value, level: usize) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(true) => self.out.push_str("true"),
            Value::Bool(false) => self.out.push_str("false"),
            Value::Int(n) => self.out.push_str(&n.to_string()),
            Value::Float(f) => write_float(&mut self.out, *f),
            Value::String(s) => write_string_value(&mut self.out, s),
            Value::Array(items) => self.write_array(items, level),
            Value::Object(pairs) => self.write_object(pairs, level),
        }
    }

    fn write_array(&mut self, items: &[Value], level: usize) {
        if items.is_empty() {
            self.out.push_str("[]");
            return;
        }
        self.out.push('[');
        let pretty = !matches!(self.indent, Indent::None);
        for (i, item) in items.iter().enumerate() {
            if pretty {
                self.out.push_str(self.newline);
                self.write_indent(level + 1);
            } else if i > 0 {
                self.out.push_str(", ");
            }
            self.write_value(item, level + 1);
            if pretty && i + 1 < items.len() {
                self.out.push(',');
            }
        }
        if pretty {
            self.out.push_str(self.newline);
            self.write_indent(level);
        }
        self.out.push(']');
    }

    fn write_object(&mut self, pairs: &[(String, Value)], level: usize) {
        if pairs.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push('{');
        let pretty = !matches!(self.indent, Indent::None);
        for (i, (key, value)) in pairs.iter().enumerate() {
            if pretty {
                self.out.push_str(self.newline);
                self.write_indent(level + 1);
            } else if i > 0 {
                self.out.push_str(", ");
            }
            write_key(&mut self.out, key);
            self.out.push(':');
            self.out.push(' ');
            self.write_value(value, level + 1);
            if pretty && i + 1 < pairs.len() {
                self.out.push(',');
            }
        }
        if pretty {
            self.out.push_str(self.newline);
            self.write_indent(level);
        }
        self.out.push('}');
    }
}

/// Serialize a [`Value`] to `.koda` text. Object key order in the output
/// follows the value's in-memory (insertion) order, not canonical order.
///
/// Non-finite floats (`NaN`, `+Inf`, `-Inf`) have no representation in the
/// text grammar; callers must not pass a tree containing one (the output
/// for such a value is unspecified, matching the contract that this format
/// has no syntax for them).
pub fn stringify(value: &Value, options: &StringifyOptions) -> String {
    let mut writer = Writer {
        out: String::new(),
        indent: &options.indent,
        newline: options.newline.as_str(),
    };
    writer.write_value(value, 0);
    writer.out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::text::parser::{parse, ParseOptions};

    #[test]
    fn compact_round_trips() {
        let v = Value::Object(vec![
            ("b".to_string(), Value::Int(2)),
            ("a".to_string(), Value::Int(1)),
        ]);
        let text = stringify(&v, &StringifyOptions::default());
        let parsed = parse(&text, ParseOptions::default()).unwrap();
        assert_eq!(v, parsed);
    }

    #[test]
    fn indented_round_trips() {
        let v = Value::Array(vec![Value::Int(1), Value::Array(vec![Value::Int(2)])]);
        let opts = StringifyOptions::default().with_indent(Indent::spaces(2));
        let text = stringify(&v, &opts);
        assert!(text.contains('\n'));
        let parsed = parse(&text, ParseOptions::default()).unwrap();
        assert_eq!(v, parsed);
    }

    #[test]
    fn quotes_non_identifier_keys() {
        let v = Value::Object(vec![("has space".to_string(), Value::Null)]);
        let text = stringify(&v, &StringifyOptions::default());
        assert!(text.contains("\"has space\""));
    }

    #[test]
    fn quotes_reserved_word_keys() {
        let v = Value::Object(vec![("true".to_string(), Value::Null)]);
        let text = stringify(&v, &StringifyOptions::default());
        assert!(text.contains("\"true\""));
    }

    #[test]
    fn float_round_trips_exactly() {
        let v = Value::Float(0.1);
        let text = stringify(&v, &StringifyOptions::default());
        let parsed = parse(&text, ParseOptions::default()).unwrap();
        assert_eq!(v, parsed);
    }

    #[test]
    fn empty_containers_have_no_trailing_comma() {
        let v = Value::Object(vec![("a".to_string(), Value::empty_array())]);
        let opts = StringifyOptions::default().with_indent(Indent::spaces(2));
        let text = stringify(&v, &opts);
        assert!(!text.contains(",\n  }"));
        assert!(!text.contains(",\n}"));
    }
}
