//! Tag decorator.
//!
//! `@name value` either validates a shape and passes the value through,
//! transforms it into another variant, or preserves a non-reserved user
//! tag. Reserved names applied outside their table entry are rejected.
//! The parser runs [`decorate`] inline as each tagged object completes;
//! [`canonicalize`] replays the same decoration over a whole tree for
//! values assembled outside the parser.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use num_traits::ToPrimitive;

use crate::error::ErrorKind;
use crate::number;
use crate::value::{Timestamp, Value};

/// Names a user tag may never take: the built-in tags plus the type
/// names held back for future use.
const RESERVED: &[&str] = &[
    "base64",
    "bool",
    "bytestring",
    "complex",
    "date",
    "datetime",
    "dict",
    "double",
    "duration",
    "float",
    "int",
    "integer",
    "list",
    "object",
    "record",
    "set",
    "string",
    "table",
    "time",
    "unknown",
];

/// Apply a tag to a value.
pub(crate) fn decorate(name: &str, value: Value) -> Result<Value, ErrorKind> {
    match name {
        "object" => Ok(value),
        "bool" => expect(matches!(value, Value::Bool(_)), value),
        "int" => expect(matches!(value, Value::Int(_)), value),
        "string" => expect(matches!(value, Value::String(_)), value),
        "list" => expect(matches!(value, Value::List(_)), value),
        "record" => expect(matches!(value, Value::Record(_)), value),
        "float" => decorate_float(value),
        "duration" => decorate_duration(value),
        "datetime" => decorate_datetime(value),
        "base64" => decorate_base64(value),
        "bytestring" => decorate_bytestring(value),
        "complex" => decorate_complex(value),
        "set" => match value {
            Value::List(items) => Value::set(items),
            _ => Err(ErrorKind::TagShape),
        },
        "dict" => match value {
            Value::Record(pairs) => Value::dict(pairs),
            _ => Err(ErrorKind::TagShape),
        },
        _ if RESERVED.contains(&name) => Err(ErrorKind::TagShape),
        _ => Value::tagged(name, value),
    }
}

fn expect(shape_ok: bool, value: Value) -> Result<Value, ErrorKind> {
    if shape_ok {
        Ok(value)
    } else {
        Err(ErrorKind::TagShape)
    }
}

/// `@float` passes numbers through and reads special strings: NaN and
/// Infinity spellings or a C99 hex float.
fn decorate_float(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(value),
        Value::String(s) => number::parse_special_float(&s)
            .map(Value::Float)
            .ok_or(ErrorKind::TagShape),
        _ => Err(ErrorKind::TagShape),
    }
}

fn decorate_duration(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::Int(n) => n
            .to_f64()
            .map(Value::Duration)
            .ok_or(ErrorKind::TagShape),
        Value::Float(f) => Ok(Value::Duration(f)),
        _ => Err(ErrorKind::TagShape),
    }
}

fn decorate_datetime(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::String(s) => parse_rfc3339(&s)
            .map(Value::DateTime)
            .ok_or(ErrorKind::TagShape),
        _ => Err(ErrorKind::TagShape),
    }
}

fn decorate_base64(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::String(s) => STANDARD
            .decode(s.as_bytes())
            .map(Value::Bytes)
            .map_err(|_| ErrorKind::TagShape),
        _ => Err(ErrorKind::TagShape),
    }
}

/// `@bytestring` narrows a unicode string whose scalars all fit a byte.
fn decorate_bytestring(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::String(s) => {
            let mut out = Vec::with_capacity(s.len());
            for c in s.chars() {
                let cp = c as u32;
                if cp > 0xFF {
                    return Err(ErrorKind::TagShape);
                }
                out.push(cp as u8);
            }
            Ok(Value::Bytes(out))
        }
        _ => Err(ErrorKind::TagShape),
    }
}

fn decorate_complex(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::List(items) if items.len() == 2 => {
            let re = number_to_f64(&items[0]).ok_or(ErrorKind::TagShape)?;
            let im = number_to_f64(&items[1]).ok_or(ErrorKind::TagShape)?;
            Ok(Value::Complex(re, im))
        }
        _ => Err(ErrorKind::TagShape),
    }
}

fn number_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => n.to_f64(),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Walk a tree bottom-up, rebuilding containers through the checking
/// constructors and applying the decorator to every tagged node. This
/// is the tag-canonical form: a tree assembled outside the parser comes
/// out validated, with built-in tags decoded.
pub fn canonicalize(value: Value) -> Result<Value, ErrorKind> {
    match value {
        Value::List(items) => Ok(Value::List(canonicalize_items(items)?)),
        Value::Record(pairs) => Value::record(canonicalize_pairs(pairs)?),
        Value::Set(items) => Value::set(canonicalize_items(items)?),
        Value::Dict(pairs) => Value::dict(canonicalize_pairs(pairs)?),
        Value::Table(pairs) => Ok(Value::Table(canonicalize_pairs(pairs)?)),
        Value::Tagged(name, inner) => {
            let inner = canonicalize(*inner)?;
            decorate(&name, inner)
        }
        other => Ok(other),
    }
}

fn canonicalize_items(items: Vec<Value>) -> Result<Vec<Value>, ErrorKind> {
    items.into_iter().map(canonicalize).collect()
}

fn canonicalize_pairs(pairs: Vec<(Value, Value)>) -> Result<Vec<(Value, Value)>, ErrorKind> {
    pairs
        .into_iter()
        .map(|(k, v)| Ok((canonicalize(k)?, canonicalize(v)?)))
        .collect()
}

/// Read `YYYY-MM-DDThh:mm:ss[.frac]Z`. `T` and `Z` are accepted in
/// either case; numeric offsets are not.
fn parse_rfc3339(s: &str) -> Option<Timestamp> {
    let b = s.as_bytes();
    if b.len() < 20 || !s.is_ascii() {
        return None;
    }
    let year = fixed_digits(b, 0, 4)?;
    let month = fixed_digits(b, 5, 2)?;
    let day = fixed_digits(b, 8, 2)?;
    let hour = fixed_digits(b, 11, 2)?;
    let minute = fixed_digits(b, 14, 2)?;
    let second = fixed_digits(b, 17, 2)?;
    if b[4] != b'-' || b[7] != b'-' || !matches!(b[10], b'T' | b't') {
        return None;
    }
    if b[13] != b':' || b[16] != b':' {
        return None;
    }

    let mut i = 19;
    let mut nanos: u32 = 0;
    if b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return None;
        }
        let mut scale = 100_000_000u32;
        for &d in &b[frac_start..i.min(frac_start + 9)] {
            nanos += u32::from(d - b'0') * scale;
            scale /= 10;
        }
    }
    if i + 1 != b.len() || !matches!(b[i], b'Z' | b'z') {
        return None;
    }

    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return None;
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    let days = days_from_civil(i64::from(year), month, day);
    let epoch_seconds =
        days * 86_400 + i64::from(hour) * 3_600 + i64::from(minute) * 60 + i64::from(second);
    Some(Timestamp {
        epoch_seconds,
        nanos,
    })
}

fn fixed_digits(b: &[u8], offset: usize, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for &d in b.get(offset..offset + count)? {
        if !d.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u32::from(d - b'0');
    }
    Some(value)
}

fn is_leap_year(year: u32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

/// Days from 1970-01-01 to the given civil date, proleptic Gregorian.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = (i64::from(month) + 9) % 12;
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
