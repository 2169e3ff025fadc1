//! Recursive-descent parser: turns a token stream from [`super::lexer`]
//! into a [`Value`] tree.

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::text::lexer::{Lexer, Token, TokenKind};
use crate::value::Value;

/// Options controlling [`super::parse`].
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Reject documents whose container nesting exceeds this bound.
    pub max_depth: usize,
    /// Reject input whose length (in bytes) exceeds this bound, checked
    /// before parsing begins. `None` means unbounded.
    pub max_input_length: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: 256,
            max_input_length: None,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_input_length(mut self, max_input_length: usize) -> Self {
        self.max_input_length = Some(max_input_length);
        self
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, max_depth: usize) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            depth: 0,
            max_depth,
        })
    }

    fn advance(&mut self) -> ParseResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::new(
                ParseErrorKind::DepthExceeded {
                    max_depth: self.max_depth,
                },
                self.current.line,
                self.current.column,
                self.current.offset,
            ));
        }
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn eat_separators(&mut self) -> ParseResult<()> {
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance()?;
        }
        Ok(())
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> ParseResult<Token> {
        if &self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        let text = token_text(&self.current.kind);
        ParseError::new(
            ParseErrorKind::UnexpectedToken(format!("{} (expected {})", text, what)),
            self.current.line,
            self.current.column,
            self.current.offset,
        )
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        match self.current.kind.clone() {
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::String(s) => {
                self.advance()?;
                Ok(Value::String(s))
            }
            TokenKind::Identifier(s) => {
                self.advance()?;
                Ok(Value::String(s))
            }
            TokenKind::Int(n) => {
                self.advance()?;
                Ok(Value::Int(n))
            }
            TokenKind::Float(n) => {
                self.advance()?;
                Ok(Value::Float(n))
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Value::Bool(false))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Value::Null)
            }
            TokenKind::Eof => Err(ParseError::new(
                ParseErrorKind::UnexpectedEof,
                self.current.line,
                self.current.column,
                self.current.offset,
            )),
            _ => Err(self.unexpected("a value")),
        }
    }

    fn parse_key(&mut self) -> ParseResult<String> {
        match self.current.kind.clone() {
            TokenKind::String(s) => {
                self.advance()?;
                Ok(s)
            }
            TokenKind::Identifier(s) => {
                self.advance()?;
                Ok(s)
            }
            TokenKind::True => {
                self.advance()?;
                Ok("true".to_string())
            }
            TokenKind::False => {
                self.advance()?;
                Ok("false".to_string())
            }
            TokenKind::Null => {
                self.advance()?;
                Ok("null".to_string())
            }
            _ => Err(self.unexpected("a key")),
        }
    }

    fn parse_object(&mut self) -> ParseResult<Value> {
        self.enter()?;
        self.advance()?; // consume '{'
        let mut pairs: Vec<(String, Value)> = Vec::new();
        self.eat_separators()?;
        while !matches!(self.current.kind, TokenKind::RBrace | TokenKind::Eof) {
            let (key_line, key_col, key_off) =
                (self.current.line, self.current.column, self.current.offset);
            let key = self.parse_key()?;
            self.expect(&TokenKind::Colon, "':'")?;
            let value = self.parse_value()?;
            if pairs.iter().any(|(k, _)| k == &key) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateKey(key),
                    key_line,
                    key_col,
                    key_off,
                ));
            }
            pairs.push((key, value));
            self.eat_separators()?;
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        self.exit();
        Ok(Value::Object(pairs))
    }

    fn parse_array(&mut self) -> ParseResult<Value> {
        self.enter()?;
        self.advance()?; // consume '['
        let mut items = Vec::new();
        self.eat_separators()?;
        while !matches!(self.current.kind, TokenKind::RBracket | TokenKind::Eof) {
            items.push(self.parse_value()?);
            self.eat_separators()?;
        }
        self.expect(&TokenKind::RBracket, "']'")?;
        self.exit();
        Ok(Value::Array(items))
    }
}

fn token_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
        TokenKind::LBracket => "'['".to_string(),
        TokenKind::RBracket => "']'".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::String(s) => format!("string '{}'", s),
        TokenKind::Identifier(s) => format!("identifier '{}'", s),
        TokenKind::Int(n) => n.to_string(),
        TokenKind::Float(n) => n.to_string(),
        TokenKind::True => "'true'".to_string(),
        TokenKind::False => "'false'".to_string(),
        TokenKind::Null => "'null'".to_string(),
        TokenKind::Eof => "end of input".to_string(),
    }
}

/// Parse `.koda` text into a [`Value`]. The document must be exactly one
/// top-level value; trailing non-whitespace content after it is an error.
pub fn parse(text: &str, options: ParseOptions) -> ParseResult<Value> {
    if let Some(max) = options.max_input_length {
        if text.len() > max {
            return Err(ParseError::new(
                ParseErrorKind::InputTooLarge {
                    max_input_length: max,
                    actual: text.len(),
                },
                1,
                1,
                0,
            ));
        }
    }
    let mut parser = Parser::new(text, options.max_depth)?;
    let value = parser.parse_value()?;
    if !matches!(parser.current.kind, TokenKind::Eof) {
        return Err(parser.unexpected("end of input"));
    }
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;

    fn p(input: &str) -> Value {
        parse(input, ParseOptions::default()).unwrap()
    }

    #[test]
    fn parses_empty_object() {
        assert_eq!(p("{}"), Value::empty_object());
    }

    #[test]
    fn parses_nested_structure_with_trailing_commas() {
        let v = p("// top\nname: my-app, version: 1,\n");
        assert_eq!(
            v,
            Value::Object(vec![
                ("name".to_string(), Value::String("my-app".to_string())),
                ("version".to_string(), Value::Int(1)),
            ])
        );
    }

    #[test]
    fn number_classification() {
        assert_eq!(
            p("x: 1e0"),
            Value::Object(vec![("x".to_string(), Value::Float(1.0))])
        );
        assert_eq!(
            p("x: 1"),
            Value::Object(vec![("x".to_string(), Value::Int(1))])
        );
    }

    #[test]
    fn keywords_allowed_as_keys() {
        let v = p("{true: 1, false: 2, null: 3}");
        assert_eq!(
            v,
            Value::Object(vec![
                ("true".to_string(), Value::Int(1)),
                ("false".to_string(), Value::Int(2)),
                ("null".to_string(), Value::Int(3)),
            ])
        );
    }

    #[test]
    fn separators_optional_between_unambiguous_tokens() {
        let v = p("[{}{}]");
        assert_eq!(
            v,
            Value::Array(vec![Value::empty_object(), Value::empty_object()])
        );
    }

    #[test]
    fn rejects_duplicate_key() {
        let err = parse("{a: 1, a: 2}", ParseOptions::default()).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::DuplicateKey("a".to_string())
        );
    }

    #[test]
    fn rejects_depth_exceeded() {
        let input = "[".repeat(5) + &"]".repeat(5);
        let err = parse(&input, ParseOptions::default().with_max_depth(3)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DepthExceeded { max_depth: 3 });
    }

    #[test]
    fn rejects_trailing_content() {
        let err = parse("1 2", ParseOptions::default()).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn rejects_input_too_large() {
        let err =
            parse("12345", ParseOptions::default().with_max_input_length(3)).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::InputTooLarge {
                max_input_length: 3,
                actual: 5
            }
        );
    }

    #[test]
    fn unquoted_identifier_value_is_string() {
        assert_eq!(p("my-app"), Value::String("my-app".to_string()));
    }
}
