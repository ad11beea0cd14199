//! Structural parser and document driver.
//!
//! One recursive-descent pass over code points. Each object position
//! dispatches on its first non-whitespace character: braces open a
//! record, brackets a list or table (decided by whether the first
//! entry is followed by `:`), parentheses group a single object or
//! concatenate adjacent string literals, `@` binds a tag, and
//! everything else is a scalar literal. Tags are decorated inline as
//! the tagged object completes, so tag errors carry the `@`'s
//! position.

use crate::cursor::Cursor;
use crate::error::{ErrorKind, ParseError, Result};
use crate::number;
use crate::scanner;
use crate::string;
use crate::tag;
use crate::value::Value;

/// Containers may nest at most this deep.
pub(crate) const MAX_DEPTH: usize = 1024;

/// Parse a complete document: optional BOM, whitespace, one object,
/// whitespace, end of input.
pub(crate) fn parse_document(cur: &mut Cursor) -> Result<Value> {
    scanner::consume_bom(cur);
    let value = parse_object(cur, 0)?;
    scanner::skip_whitespace(cur)?;
    if !cur.is_eof() {
        return Err(ParseError::new(ErrorKind::TrailingGarbage, cur.position()));
    }
    Ok(value)
}

/// Parse one object, skipping leading whitespace.
pub(crate) fn parse_object(cur: &mut Cursor, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(ParseError::new(ErrorKind::DepthLimit, cur.position()));
    }
    scanner::skip_whitespace(cur)?;
    let pos = cur.position();
    let c = match cur.peek() {
        Some(c) => c,
        None => return Err(ParseError::new(ErrorKind::UnexpectedEof, pos)),
    };
    match c {
        '@' => parse_tagged(cur, depth),
        '{' => parse_record(cur, depth),
        '[' => parse_bracketed(cur, depth),
        '(' => parse_group(cur, depth),
        '+' | '-' | '0'..='9' => number::parse_number(cur),
        '\u{FEFF}' => Err(ParseError::new(ErrorKind::Encoding, pos)),
        _ if string::at_string_start(cur) => Ok(string::parse_string(cur)?.into_value()),
        _ if scanner::is_ident_start(c) => parse_keyword(cur),
        _ => Err(ParseError::new(ErrorKind::UnexpectedByte, pos)),
    }
}

/// The built-in literals. Any other bare word fails: RSON has no
/// bare-word values.
fn parse_keyword(cur: &mut Cursor) -> Result<Value> {
    let pos = cur.position();
    let ident = scanner::scan_identifier(cur)?;
    match ident {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" => Ok(Value::Null),
        _ => Err(ParseError::new(ErrorKind::UnexpectedByte, pos)),
    }
}

/// `@` name mandatory-whitespace object. The whitespace is what
/// separates `@int 1` from a user tag named `int1`.
fn parse_tagged(cur: &mut Cursor, depth: usize) -> Result<Value> {
    let tag_pos = cur.position();
    cur.bump();
    let name = scanner::scan_tag_name(cur)?;
    match cur.peek() {
        Some(c) if scanner::is_whitespace(c) || c == '#' => {}
        Some(_) => return Err(ParseError::new(ErrorKind::UnexpectedByte, cur.position())),
        None => return Err(ParseError::new(ErrorKind::UnexpectedEof, cur.position())),
    }
    scanner::skip_whitespace(cur)?;
    if cur.peek() == Some('@') {
        return Err(ParseError::new(ErrorKind::TagNest, cur.position()));
    }
    let value = parse_object(cur, depth + 1)?;
    tag::decorate(name, value).map_err(|kind| ParseError::new(kind, tag_pos))
}

/// `{}` is the empty record; otherwise comma-separated `key : value`
/// pairs with unique keys.
fn parse_record(cur: &mut Cursor, depth: usize) -> Result<Value> {
    cur.bump();
    scanner::skip_whitespace(cur)?;
    let mut pairs: Vec<(Value, Value)> = Vec::new();
    if cur.eat('}') {
        return Ok(Value::Record(pairs));
    }
    if cur.peek() == Some(',') {
        return Err(ParseError::new(ErrorKind::UnexpectedByte, cur.position()));
    }
    loop {
        scanner::skip_whitespace(cur)?;
        let key_pos = cur.position();
        let key = parse_object(cur, depth + 1)?;
        scanner::skip_whitespace(cur)?;
        if !cur.eat(':') {
            return Err(unexpected(cur));
        }
        let value = parse_object(cur, depth + 1)?;
        if pairs.iter().any(|(k, _)| *k == key) {
            return Err(ParseError::new(ErrorKind::DuplicateKey, key_pos));
        }
        pairs.push((key, value));
        scanner::skip_whitespace(cur)?;
        if cur.eat(',') {
            scanner::skip_whitespace(cur)?;
            if cur.eat('}') {
                break;
            }
        } else if cur.eat('}') {
            break;
        } else {
            return Err(unexpected(cur));
        }
    }
    Ok(Value::Record(pairs))
}

/// `[` ... `]`: a table when the first entry is `value : value`,
/// otherwise a list.
fn parse_bracketed(cur: &mut Cursor, depth: usize) -> Result<Value> {
    cur.bump();
    scanner::skip_whitespace(cur)?;
    if cur.eat(']') {
        return Ok(Value::List(Vec::new()));
    }
    // a comma may trail an element, never lead one: `[,]` fails
    if cur.peek() == Some(',') {
        return Err(ParseError::new(ErrorKind::UnexpectedByte, cur.position()));
    }
    let first = parse_object(cur, depth + 1)?;
    scanner::skip_whitespace(cur)?;
    if cur.eat(':') {
        parse_table(cur, depth, first)
    } else {
        parse_list(cur, depth, first)
    }
}

fn parse_list(cur: &mut Cursor, depth: usize, first: Value) -> Result<Value> {
    let mut items = vec![first];
    loop {
        scanner::skip_whitespace(cur)?;
        if cur.eat(']') {
            break;
        }
        if !cur.eat(',') {
            return Err(unexpected(cur));
        }
        scanner::skip_whitespace(cur)?;
        if cur.eat(']') {
            break;
        }
        items.push(parse_object(cur, depth + 1)?);
    }
    Ok(Value::List(items))
}

fn parse_table(cur: &mut Cursor, depth: usize, first_key: Value) -> Result<Value> {
    let first_value = parse_object(cur, depth + 1)?;
    let mut pairs = vec![(first_key, first_value)];
    loop {
        scanner::skip_whitespace(cur)?;
        if cur.eat(']') {
            break;
        }
        if !cur.eat(',') {
            return Err(unexpected(cur));
        }
        scanner::skip_whitespace(cur)?;
        if cur.eat(']') {
            break;
        }
        let key = parse_object(cur, depth + 1)?;
        scanner::skip_whitespace(cur)?;
        if !cur.eat(':') {
            return Err(unexpected(cur));
        }
        let value = parse_object(cur, depth + 1)?;
        pairs.push((key, value));
    }
    Ok(Value::Table(pairs))
}

/// `(...)`: two or more adjacent string literals of one kind
/// concatenate; any other body is a single grouped object.
fn parse_group(cur: &mut Cursor, depth: usize) -> Result<Value> {
    cur.bump();
    scanner::skip_whitespace(cur)?;
    if string::at_string_start(cur) {
        return parse_adjacent_strings(cur);
    }
    let value = parse_object(cur, depth + 1)?;
    scanner::skip_whitespace(cur)?;
    if !cur.eat(')') {
        return Err(unexpected(cur));
    }
    Ok(value)
}

fn parse_adjacent_strings(cur: &mut Cursor) -> Result<Value> {
    let mut acc = string::parse_string(cur)?;
    let kind = acc.kind();
    loop {
        scanner::skip_whitespace(cur)?;
        if cur.eat(')') {
            break;
        }
        let pos = cur.position();
        if !string::at_string_start(cur) {
            return Err(unexpected(cur));
        }
        let next = string::parse_string(cur)?;
        if next.kind() != kind {
            return Err(ParseError::new(ErrorKind::UnexpectedByte, pos));
        }
        acc.append(next);
    }
    Ok(acc.into_value())
}

fn unexpected(cur: &Cursor) -> ParseError {
    let kind = if cur.is_eof() {
        ErrorKind::UnexpectedEof
    } else {
        ErrorKind::UnexpectedByte
    };
    ParseError::new(kind, cur.position())
}
