//! String and byte-string literals.
//!
//! A literal takes an optional `u`/`U` (unicode, the default) or
//! `b`/`B` (bytes) prefix and one of four delimiters: `"`, `'`,
//! `"""`, `'''`. Triple delimiters span newlines and admit bare tab,
//! newline and carriage return; single delimiters admit no bare code
//! point below U+0020. Byte strings share the escape alphabet minus
//! `\u` and `\U`, and take bare ASCII only.

use crate::cursor::Cursor;
use crate::error::{ErrorKind, ParseError, Result};
use crate::value::Value;

/// Which alphabet a literal produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StringKind {
    Unicode,
    Bytes,
}

/// A decoded string literal.
#[derive(Debug)]
pub(crate) enum StringLit {
    Unicode(String),
    Bytes(Vec<u8>),
}

impl StringLit {
    pub(crate) fn kind(&self) -> StringKind {
        match self {
            StringLit::Unicode(_) => StringKind::Unicode,
            StringLit::Bytes(_) => StringKind::Bytes,
        }
    }

    /// Concatenate another literal of the same kind.
    pub(crate) fn append(&mut self, other: StringLit) {
        match (self, other) {
            (StringLit::Unicode(a), StringLit::Unicode(b)) => a.push_str(&b),
            (StringLit::Bytes(a), StringLit::Bytes(b)) => a.extend(b),
            _ => {}
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self {
            StringLit::Unicode(s) => Value::String(s),
            StringLit::Bytes(b) => Value::Bytes(b),
        }
    }
}

/// True when the cursor rests on the start of a string literal,
/// counting an optional kind prefix.
pub(crate) fn at_string_start(cur: &Cursor) -> bool {
    match cur.peek() {
        Some('"') | Some('\'') => true,
        Some('u') | Some('U') | Some('b') | Some('B') => {
            matches!(cur.peek_at(1), Some('"') | Some('\''))
        }
        _ => false,
    }
}

/// Parse a string literal at the cursor.
pub(crate) fn parse_string(cur: &mut Cursor) -> Result<StringLit> {
    let kind = match cur.peek() {
        Some('b') | Some('B') => {
            cur.bump();
            StringKind::Bytes
        }
        Some('u') | Some('U') => {
            cur.bump();
            StringKind::Unicode
        }
        _ => StringKind::Unicode,
    };
    let quote = match cur.peek() {
        Some(c @ ('"' | '\'')) => c,
        _ => return Err(ParseError::new(ErrorKind::UnexpectedByte, cur.position())),
    };
    let triple = cur.peek_at(1) == Some(quote) && cur.peek_at(2) == Some(quote);
    cur.bump();
    if triple {
        cur.bump();
        cur.bump();
    }

    let mut text = String::new();
    let mut bytes = Vec::new();
    loop {
        let pos = cur.position();
        let c = match cur.peek() {
            Some(c) => c,
            None => return Err(ParseError::new(ErrorKind::UnexpectedEof, cur.position())),
        };
        if c == quote {
            if !triple {
                cur.bump();
                break;
            }
            if cur.peek_at(1) == Some(quote) && cur.peek_at(2) == Some(quote) {
                cur.bump();
                cur.bump();
                cur.bump();
                break;
            }
            cur.bump();
            push_scalar(kind, &mut text, &mut bytes, c, pos)?;
            continue;
        }
        if c == '\\' {
            cur.bump();
            decode_escape(cur, kind, &mut text, &mut bytes)?;
            continue;
        }
        if (c as u32) < 0x20 {
            if triple && matches!(c, '\t' | '\n' | '\r') {
                cur.bump();
                push_scalar(kind, &mut text, &mut bytes, c, pos)?;
                continue;
            }
            return Err(ParseError::new(ErrorKind::BadControlChar, pos));
        }
        cur.bump();
        push_scalar(kind, &mut text, &mut bytes, c, pos)?;
    }

    Ok(match kind {
        StringKind::Unicode => StringLit::Unicode(text),
        StringKind::Bytes => StringLit::Bytes(bytes),
    })
}

/// Append a bare code point. Byte strings take ASCII only; higher
/// bytes only enter through `\x`.
fn push_scalar(
    kind: StringKind,
    text: &mut String,
    bytes: &mut Vec<u8>,
    c: char,
    pos: crate::error::Position,
) -> Result<()> {
    match kind {
        StringKind::Unicode => text.push(c),
        StringKind::Bytes => {
            if (c as u32) > 0x7E {
                return Err(ParseError::new(ErrorKind::UnexpectedByte, pos));
            }
            bytes.push(c as u8);
        }
    }
    Ok(())
}

/// Decode one escape sequence; the backslash is already consumed.
fn decode_escape(
    cur: &mut Cursor,
    kind: StringKind,
    text: &mut String,
    bytes: &mut Vec<u8>,
) -> Result<()> {
    let pos = cur.position();
    let c = match cur.bump() {
        Some(c) => c,
        None => return Err(ParseError::new(ErrorKind::UnexpectedEof, cur.position())),
    };
    let simple = match c {
        '\\' => Some('\\'),
        '/' => Some('/'),
        '"' => Some('"'),
        '\'' => Some('\''),
        'b' => Some('\x08'),
        'f' => Some('\x0C'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    };
    if let Some(c) = simple {
        match kind {
            StringKind::Unicode => text.push(c),
            StringKind::Bytes => bytes.push(c as u8),
        }
        return Ok(());
    }
    match c {
        // line continuation swallows the newline
        '\n' => Ok(()),
        '\r' => {
            cur.eat('\n');
            Ok(())
        }
        'x' => {
            let v = hex_escape(cur, 2)?;
            match kind {
                StringKind::Bytes => bytes.push(v as u8),
                // \xNN in a unicode string is the code point U+00NN
                StringKind::Unicode => text.push(char::from_u32(v).unwrap()),
            }
            Ok(())
        }
        'u' => {
            if kind == StringKind::Bytes {
                return Err(ParseError::new(ErrorKind::BadEscape, pos));
            }
            let v = hex_escape(cur, 4)?;
            if (0xD800..=0xDFFF).contains(&v) {
                return Err(ParseError::new(ErrorKind::BadEscape, pos));
            }
            text.push(char::from_u32(v).unwrap());
            Ok(())
        }
        'U' => {
            if kind == StringKind::Bytes {
                return Err(ParseError::new(ErrorKind::BadEscape, pos));
            }
            let v = hex_escape(cur, 8)?;
            match char::from_u32(v) {
                Some(c) => {
                    text.push(c);
                    Ok(())
                }
                None => Err(ParseError::new(ErrorKind::BadEscape, pos)),
            }
        }
        _ => Err(ParseError::new(ErrorKind::BadEscape, pos)),
    }
}

/// Read exactly `count` hex digits.
fn hex_escape(cur: &mut Cursor, count: u32) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        let pos = cur.position();
        match cur.bump() {
            Some(c) => match c.to_digit(16) {
                Some(d) => value = value * 16 + d,
                None => return Err(ParseError::new(ErrorKind::BadEscape, pos)),
            },
            None => return Err(ParseError::new(ErrorKind::UnexpectedEof, pos)),
        }
    }
    Ok(value)
}
