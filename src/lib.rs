//! RSON (Restructured Object Notation) parser.
//!
//! RSON is a superset of JSON designed to be strictly read, not
//! written by JavaScript: it adds comments, trailing commas, extended
//! number literals, single-quoted and multi-line strings,
//! byte-strings, sets, ordered tables, and user-extensible tagged
//! values.
//!
//! # Parsing Pipeline
//!
//! 1. **Cursor**: decodes the UTF-8 byte stream into a code-point
//!    stream with O(1) backtracking and position tracking.
//!
//! 2. **Structural parser**: recursive descent over code points,
//!    dispatching on the first non-whitespace character at each object
//!    position.
//!
//! 3. **Tag decorator**: validates `@name` bindings as each tagged
//!    object completes, passing built-in shapes through, transforming
//!    them, or preserving user tags.
//!
//! The result is an immutable [`Value`] tree, freely shareable across
//! threads.

mod cursor;
mod error;
mod number;
mod parser;
mod scanner;
mod string;
mod tag;
mod value;

pub use cursor::{Checkpoint, Cursor};
pub use error::{ErrorKind, ParseError, Position, Result};
pub use tag::canonicalize;
pub use value::{Timestamp, Value};

/// Parse exactly one RSON document from a byte slice.
///
/// Non-UTF-8 input fails with [`ErrorKind::Encoding`] before any
/// parsing is attempted.
///
/// # Example
///
/// ```
/// use librson::parse;
///
/// let value = parse(b"[1, 2, 3,]").unwrap();
/// assert_eq!(value.as_list().unwrap().len(), 3);
/// ```
pub fn parse(input: &[u8]) -> Result<Value> {
    let text = match std::str::from_utf8(input) {
        Ok(text) => text,
        Err(e) => {
            let valid = &input[..e.valid_up_to()];
            // the valid prefix is text; count lines to place the error
            let prefix = std::str::from_utf8(valid).unwrap();
            let line = prefix.matches('\n').count() + 1;
            let column = prefix
                .rsplit('\n')
                .next()
                .map(|tail| tail.chars().count())
                .unwrap_or(0)
                + 1;
            return Err(ParseError::new(
                ErrorKind::Encoding,
                Position {
                    byte: e.valid_up_to(),
                    line,
                    column,
                },
            ));
        }
    };
    parse_str(text)
}

/// Parse exactly one RSON document from a string.
pub fn parse_str(input: &str) -> Result<Value> {
    let mut cursor = Cursor::new(input);
    parser::parse_document(&mut cursor)
}

/// Parse a single object at the cursor, for embedding RSON in a larger
/// stream. Leading whitespace and comments are skipped; whatever
/// follows the object is left unconsumed.
pub fn parse_value(cursor: &mut Cursor) -> Result<Value> {
    parser::parse_object(cursor, 0)
}
