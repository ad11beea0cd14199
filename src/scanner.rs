//! Lexical primitives.
//!
//! Whitespace, comments, the byte order mark, and identifier
//! recognition. Comments count as whitespace everywhere; a U+FEFF is
//! consumed only at byte offset 0 and is an encoding error anywhere
//! else it would be skipped.

use crate::cursor::Cursor;
use crate::error::{ErrorKind, ParseError, Result};

/// Consume a byte order mark, permitted only at byte offset 0.
pub(crate) fn consume_bom(cur: &mut Cursor) {
    if cur.position().byte == 0 && cur.peek() == Some('\u{FEFF}') {
        cur.bump();
    }
}

/// True for the four RSON whitespace code points.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Skip whitespace and `#` comments. Returns whether anything was
/// consumed.
pub(crate) fn skip_whitespace(cur: &mut Cursor) -> Result<bool> {
    let mut skipped = false;
    loop {
        match cur.peek() {
            Some(c) if is_whitespace(c) => {
                cur.bump();
                skipped = true;
            }
            Some('#') => {
                skip_comment(cur);
                skipped = true;
            }
            Some('\u{FEFF}') => {
                return Err(ParseError::new(ErrorKind::Encoding, cur.position()));
            }
            _ => return Ok(skipped),
        }
    }
}

/// Consume a `#` comment up to and including the line break, or to the
/// end of input.
fn skip_comment(cur: &mut Cursor) {
    cur.bump();
    while let Some(c) = cur.peek() {
        if c == '\n' {
            cur.bump();
            return;
        }
        if c == '\r' {
            cur.bump();
            cur.eat('\n');
            return;
        }
        cur.bump();
    }
}

/// True for identifier-start code points (`[A-Za-z_]`).
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// True for identifier-continue code points (`[A-Za-z0-9_]`).
pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scan an identifier. The cursor must rest on an identifier-start.
pub(crate) fn scan_identifier<'a>(cur: &mut Cursor<'a>) -> Result<&'a str> {
    let start = cur.checkpoint();
    match cur.peek() {
        Some(c) if is_ident_start(c) => {
            cur.bump();
        }
        _ => return Err(ParseError::new(ErrorKind::UnexpectedByte, cur.position())),
    }
    while matches!(cur.peek(), Some(c) if is_ident_continue(c)) {
        cur.bump();
    }
    Ok(cur.slice_from(start))
}

/// Scan a tag name: identifiers joined by single interior dots. A dot
/// at the start or end, or a doubled dot, never scans.
pub(crate) fn scan_tag_name<'a>(cur: &mut Cursor<'a>) -> Result<&'a str> {
    let start = cur.checkpoint();
    scan_identifier(cur)?;
    while cur.peek() == Some('.') {
        cur.bump();
        scan_identifier(cur)?;
    }
    Ok(cur.slice_from(start))
}
