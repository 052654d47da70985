//! Safe decoder for literal-record lines.
//!
//! Review dumps store one record per line in a Python-style literal syntax
//! (`{'overall': 5.0, 'reviewText': "Works great."}`), whose value grammar is
//! a superset of JSON's. This module parses that syntax into
//! [`serde_json::Value`] without evaluating anything: bare names other than
//! the boolean/null constants, calls, and operators are rejected.
//!
//! Conversions:
//! - dicts become objects; non-string keys are stringified (`1` -> `"1"`,
//!   `True` -> `"True"`, `None` -> `"None"`) and a repeated key keeps its first
//!   position with the last value;
//! - lists and tuples become arrays (`(x)` is grouping, `(x,)` a tuple);
//! - bytes literals decode to text with each byte mapped to the code point of
//!   the same value.
//! - an unpaired surrogate escape decodes to U+FFFD; named escapes
//!   (`\N{...}`) in text strings are rejected.

use serde_json::{Number, Value};
use thiserror::Error;

use crate::constants::literal::MAX_NESTING_DEPTH;
use crate::data::Record;

/// Failure to decode a literal, with the byte offset where decoding stopped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct LiteralError {
    /// Byte offset into the decoded text.
    pub offset: usize,
    /// Human-readable reason.
    pub message: String,
}

/// Decode a single literal value spanning the whole of `text`.
pub fn decode_value(text: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let value = parser.value(0)?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Decode a line that must hold a mapping literal.
pub fn decode_record(text: &str) -> Result<Record, LiteralError> {
    match decode_value(text)? {
        Value::Object(map) => Ok(map),
        other => Err(LiteralError {
            offset: 0,
            message: format!("expected a mapping literal, found {}", kind_name(&other)),
        }),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\n' | '\r' | '\x0c' => self.pos += 1,
                // explicit line join
                '\\' if self.peek_at(1) == Some('\n') => self.pos += 2,
                _ => break,
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('{') => self.mapping(depth),
            Some('[') => {
                self.pos += 1;
                self.items(']', depth, Vec::new())
            }
            Some('(') => self.parenthesized(depth),
            Some('\'' | '"') => self.strings(),
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => self.number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                if self.string_prefix().is_some() {
                    self.strings()
                } else {
                    self.word()
                }
            }
            Some(ch) => Err(self.error(format!("unexpected character {ch:?}"))),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.pos += 1;
        let mut map = Record::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            let key_offset = self.pos;
            let key = self.value(depth + 1)?;
            let key = key_string(key)
                .ok_or_else(|| self.error_at(key_offset, "unhashable mapping key"))?;
            self.skip_ws();
            if !self.eat(':') {
                return Err(self.error("expected ':' after mapping key"));
            }
            self.skip_ws();
            let value = self.value(depth + 1)?;
            map.insert(key, value);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            return Err(self.error("expected ',' or '}'"));
        }
    }

    fn parenthesized(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.pos += 1;
        self.skip_ws();
        if self.eat(')') {
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.value(depth + 1)?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.error("expected ',' or ')'"));
        }
        self.items(')', depth, vec![first])
    }

    fn items(
        &mut self,
        close: char,
        depth: usize,
        mut items: Vec<Value>,
    ) -> Result<Value, LiteralError> {
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(Value::Array(items));
            }
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                return Ok(Value::Array(items));
            }
            return Err(self.error(format!("expected ',' or '{close}'")));
        }
    }

    fn word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            name => Err(self.error_at(start, format!("name '{name}' is not a literal"))),
        }
    }

    /// Length of a string prefix at the cursor and whether it marks a raw string.
    ///
    /// Returns `None` unless a quote follows the prefix.
    fn string_prefix(&self) -> Option<(usize, bool)> {
        let rest = self.rest();
        let letters: Vec<char> = rest
            .chars()
            .take_while(|ch| ch.is_ascii_alphabetic())
            .take(3)
            .collect();
        if letters.len() > 2 {
            return None;
        }
        let lowered: String = letters.iter().map(|ch| ch.to_ascii_lowercase()).collect();
        let raw = match lowered.as_str() {
            "" | "u" | "b" => false,
            "r" | "br" | "rb" => true,
            _ => return None,
        };
        match rest[lowered.len()..].chars().next() {
            Some('\'' | '"') => Some((lowered.len(), raw)),
            _ => None,
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Value, LiteralError> {
        let mut out = String::new();
        loop {
            self.string_piece(&mut out)?;
            self.skip_ws();
            if self.string_prefix().is_none() {
                return Ok(Value::String(out));
            }
        }
    }

    fn string_piece(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let start = self.pos;
        let (prefix_len, raw) = self
            .string_prefix()
            .ok_or_else(|| self.error("expected a string literal"))?;
        let bytes = self.src[start..start + prefix_len].contains(['b', 'B']);
        self.pos += prefix_len;
        let quote = self
            .bump()
            .ok_or_else(|| self.error("expected a string literal"))?;
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }
        loop {
            let ch = self
                .bump()
                .ok_or_else(|| self.error_at(start, "unterminated string literal"))?;
            if ch == quote {
                if !triple {
                    return Ok(());
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.pos += 2;
                    return Ok(());
                }
                out.push(ch);
                continue;
            }
            match ch {
                '\n' if !triple => {
                    return Err(self.error_at(start, "unterminated string literal"));
                }
                '\\' if raw => {
                    out.push('\\');
                    let next = self
                        .bump()
                        .ok_or_else(|| self.error_at(start, "unterminated string literal"))?;
                    out.push(next);
                }
                '\\' => self.escape(out, bytes)?,
                _ => out.push(ch),
            }
        }
    }

    fn escape(&mut self, out: &mut String, bytes: bool) -> Result<(), LiteralError> {
        let start = self.pos - 1;
        let ch = self
            .bump()
            .ok_or_else(|| self.error_at(start, "unterminated escape sequence"))?;
        match ch {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(ch),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = ch.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|next| next.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                out.push(self.code_point(start, code)?);
            }
            'x' => {
                let code = self.hex_digits(start, 2)?;
                out.push(self.code_point(start, code)?);
            }
            'u' | 'U' if !bytes => {
                let width = if ch == 'u' { 4 } else { 8 };
                let code = self.hex_digits(start, width)?;
                out.push(self.unicode_escape(start, code)?);
            }
            'N' if !bytes => {
                return Err(self.error_at(start, "named unicode escapes are not supported"));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// Resolve a `\u`/`\U` code, joining surrogate pairs.
    ///
    /// A surrogate without its partner cannot live in a Rust string and
    /// decodes to U+FFFD.
    fn unicode_escape(&mut self, start: usize, code: u32) -> Result<char, LiteralError> {
        if (0xD800..0xDC00).contains(&code)
            && let Some(low) = self.pending_low_surrogate()
        {
            self.pos += 6;
            return self.code_point(start, 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00));
        }
        if (0xD800..0xE000).contains(&code) {
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        self.code_point(start, code)
    }

    /// Low surrogate of a `\uDC00`..`\uDFFF` escape at the cursor, without consuming it.
    fn pending_low_surrogate(&self) -> Option<u32> {
        let digits = self.rest().strip_prefix("\\u")?.get(..4)?;
        if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16)
            .ok()
            .filter(|low| (0xDC00..0xE000).contains(low))
    }

    fn hex_digits(&mut self, start: usize, width: usize) -> Result<u32, LiteralError> {
        let digits = self.rest().get(..width).unwrap_or("");
        if digits.len() != width || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(self.error_at(start, "truncated escape sequence"));
        }
        self.pos += width;
        u32::from_str_radix(digits, 16)
            .map_err(|_| self.error_at(start, "invalid escape sequence"))
    }

    fn code_point(&self, start: usize, code: u32) -> Result<char, LiteralError> {
        char::from_u32(code)
            .ok_or_else(|| self.error_at(start, format!("invalid code point {code:#x}")))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.pos += 1;
                true
            }
            Some('+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        if self.peek() == Some('0')
            && let Some(radix) = self.peek_at(1).and_then(radix_for)
        {
            self.pos += 2;
            let digits = self.take_digits(|ch| ch.is_digit(radix));
            if digits.is_empty() {
                return Err(self.error_at(start, "invalid integer literal"));
            }
            let magnitude = u64::from_str_radix(&digits, radix)
                .map_err(|_| self.error_at(start, "integer literal out of range"))?;
            return Ok(signed_integer(negative, magnitude));
        }

        let mut text = self.take_digits(|ch| ch.is_ascii_digit());
        let mut is_float = false;
        if self.eat('.') {
            is_float = true;
            text.push('.');
            text.push_str(&self.take_digits(|ch| ch.is_ascii_digit()));
        }
        if matches!(self.peek(), Some('e' | 'E'))
            && (self.peek_at(1).is_some_and(|ch| ch.is_ascii_digit())
                || (matches!(self.peek_at(1), Some('-' | '+'))
                    && self.peek_at(2).is_some_and(|ch| ch.is_ascii_digit())))
        {
            is_float = true;
            text.push('e');
            self.pos += 1;
            if let Some(sign @ ('-' | '+')) = self.peek() {
                text.push(sign);
                self.pos += 1;
            }
            text.push_str(&self.take_digits(|ch| ch.is_ascii_digit()));
        }

        if !text.chars().any(|ch| ch.is_ascii_digit()) {
            return Err(self.error_at(start, "invalid numeric literal"));
        }
        if !is_float && let Ok(magnitude) = text.parse::<u64>() {
            return Ok(signed_integer(negative, magnitude));
        }
        let magnitude: f64 = text
            .parse()
            .map_err(|_| self.error_at(start, "invalid numeric literal"))?;
        let value = if negative { -magnitude } else { magnitude };
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| self.error_at(start, "numeric literal is not finite"))
    }

    /// Consume digits accepted by `is_digit`, allowing `_` separators.
    fn take_digits(&mut self, is_digit: impl Fn(char) -> bool) -> String {
        let mut digits = String::new();
        while let Some(ch) = self.peek() {
            if is_digit(ch) {
                digits.push(ch);
            } else if ch != '_' {
                break;
            }
            self.pos += 1;
        }
        digits
    }
}

fn radix_for(marker: char) -> Option<u32> {
    match marker {
        'x' | 'X' => Some(16),
        'o' | 'O' => Some(8),
        'b' | 'B' => Some(2),
        _ => None,
    }
}

fn signed_integer(negative: bool, magnitude: u64) -> Value {
    if !negative {
        return Value::from(magnitude);
    }
    let value = -i128::from(magnitude);
    match i64::try_from(value) {
        Ok(value) => Value::from(value),
        Err(_) => Value::from(-(magnitude as f64)),
    }
}

fn key_string(key: Value) -> Option<String> {
    match key {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Null => Some("None".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
