//! Low-level input handling for the pull reader.
//!
//! [`Input`] owns the position (line, column, byte offset) within the
//! source text and provides the primitives the tokenizer is built from:
//! peeking, advancing, name parsing, reference resolution, and quoted
//! value parsing. Every failure is a [`ReaderFault`] stamped with the
//! current location.

use crate::error::{ReaderFault, SourceLocation};

// -------------------------------------------------------------------------
// XML character classes (XML 1.0 §2.2, §2.3)
// -------------------------------------------------------------------------

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// A resolved `&...;` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference {
    /// One of the five predefined entities or a character reference.
    Resolved(char),
    /// A named entity with no known replacement text.
    Unresolved(String),
}

/// Cursor over the source text.
pub(crate) struct Input<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    max_name_length: usize,
}

impl<'a> Input<'a> {
    pub fn new(input: &'a str, max_name_length: usize) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            max_name_length,
        }
    }

    // -- Position queries --

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    // -- Peek operations --

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(s)
    }

    // -- Advance operations --

    /// Advances past `count` ASCII bytes.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek() {
                Some(b'\n') => {
                    self.line += 1;
                    self.column = 1;
                    self.pos += 1;
                }
                Some(_) => {
                    self.column += 1;
                    self.pos += 1;
                }
                None => break,
            }
        }
    }

    fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Consumes the next character, normalizing `\r\n` and lone `\r` to
    /// `\n` (XML 1.0 §2.11) and rejecting characters outside `Char`.
    pub fn next_char(&mut self) -> Result<char, ReaderFault> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fault("unexpected end of input"))?;
        self.advance_char(ch);
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            }
            return Ok('\n');
        }
        if !is_xml_char(ch) {
            return Err(self.fault(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        Ok(ch)
    }

    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ReaderFault> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(b) => Err(self.fault(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(self.fault(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ReaderFault> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.advance(1);
        }
        self.pos > start
    }

    /// Collects characters up to (not including) `delimiter` and consumes
    /// the delimiter. `construct` names the markup for error messages.
    pub fn take_until(&mut self, delimiter: &[u8], construct: &str) -> Result<String, ReaderFault> {
        let mut content = String::new();
        loop {
            if self.at_end() {
                return Err(self.fault(format!("unexpected end of input in {construct}")));
            }
            if self.looking_at(delimiter) {
                self.advance(delimiter.len());
                return Ok(content);
            }
            content.push(self.next_char()?);
        }
    }

    // -- Names (XML 1.0 §2.3) --

    pub fn parse_name(&mut self) -> Result<String, ReaderFault> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fault("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fault(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);
        while let Some(ch) = self.peek_char() {
            if !is_name_char(ch) {
                break;
            }
            self.advance_char(ch);
        }

        let len = self.pos - start;
        if len > self.max_name_length {
            return Err(self.fault(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    // -- References (XML 1.0 §4.1) --

    /// Parses `&name;` or `&#...;`. The cursor must be on the `&`.
    pub fn parse_reference(&mut self) -> Result<Reference, ReaderFault> {
        self.expect_byte(b'&')?;

        if self.peek() == Some(b'#') {
            self.advance(1);
            let (radix, digits) = if self.peek() == Some(b'x') {
                self.advance(1);
                (16, self.take_ascii(|b| b.is_ascii_hexdigit()))
            } else {
                (10, self.take_ascii(|b| b.is_ascii_digit()))
            };
            if digits.is_empty() {
                return Err(self.fault("empty character reference"));
            }
            self.expect_byte(b';')?;
            let value = u32::from_str_radix(&digits, radix)
                .map_err(|_| self.fault("character reference out of range"))?;
            return match char::from_u32(value) {
                Some(ch) if is_xml_char(ch) => Ok(Reference::Resolved(ch)),
                _ => Err(self.fault(format!(
                    "character reference &#x{value:X}; does not refer to a valid XML character"
                ))),
            };
        }

        let name = self.parse_name()?;
        self.expect_byte(b';')?;
        Ok(match name.as_str() {
            "amp" => Reference::Resolved('&'),
            "lt" => Reference::Resolved('<'),
            "gt" => Reference::Resolved('>'),
            "apos" => Reference::Resolved('\''),
            "quot" => Reference::Resolved('"'),
            _ => Reference::Unresolved(name),
        })
    }

    fn take_ascii(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance(1);
        }
        self.input[start..self.pos].to_string()
    }

    // -- Quoted values --

    /// Parses a quoted attribute value, resolving references and
    /// normalizing whitespace (XML 1.0 §3.3.3).
    pub fn parse_attribute_value(&mut self) -> Result<String, ReaderFault> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fault("attribute value must be quoted")),
        };
        self.advance(1);

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fault("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    return Ok(value);
                }
                Some(b'<') => return Err(self.fault("'<' not allowed in attribute values")),
                Some(b'&') => match self.parse_reference()? {
                    Reference::Resolved(ch) => value.push(ch),
                    Reference::Unresolved(name) => {
                        return Err(self.fault(format!("unresolved entity reference: &{name};")))
                    }
                },
                Some(_) => {
                    let ch = self.next_char()?;
                    value.push(if matches!(ch, '\n' | '\t') { ' ' } else { ch });
                }
            }
        }
    }

    /// Parses a quoted literal without reference resolution.
    pub fn parse_quoted_value(&mut self) -> Result<String, ReaderFault> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.fault("expected quoted value")),
        };
        self.advance(1);
        let mut value = String::new();
        while self.peek() != Some(quote) {
            if self.at_end() {
                return Err(self.fault("unexpected end of input in quoted value"));
            }
            value.push(self.next_char()?);
        }
        self.advance(1);
        Ok(value)
    }

    // -- Error helpers --

    pub fn fault(&self, message: impl Into<String>) -> ReaderFault {
        ReaderFault::new(message, self.location())
    }
}
