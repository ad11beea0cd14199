//! Number literals.
//!
//! A literal opens with an optional sign, picks its radix from a `0b`,
//! `0o`/`0c`, or `0x` prefix, and is captured lexically before being
//! converted once. Underscores group digits but never start a digit
//! run and never touch a `.` or an exponent marker. A decimal literal
//! becomes a float through a fraction or an `e` exponent; a hex
//! literal becomes a float only through a `p` exponent.
//!
//! This module also reads `@float` string payloads: NaN and Infinity
//! spellings and C99 hexadecimal floats.

use num_bigint::BigInt;

use crate::cursor::Cursor;
use crate::error::{ErrorKind, ParseError, Result};
use crate::scanner;
use crate::value::Value;

/// Parse a number literal. The cursor must rest on `+`, `-`, or a
/// digit.
pub(crate) fn parse_number(cur: &mut Cursor) -> Result<Value> {
    let start = cur.checkpoint();
    if matches!(cur.peek(), Some('+') | Some('-')) {
        cur.bump();
    }

    let radix = match (cur.peek(), cur.peek_at(1)) {
        (Some('0'), Some('b')) => {
            cur.bump();
            cur.bump();
            2
        }
        (Some('0'), Some('o')) | (Some('0'), Some('c')) => {
            cur.bump();
            cur.bump();
            8
        }
        (Some('0'), Some('x')) => {
            cur.bump();
            cur.bump();
            16
        }
        _ => 10,
    };

    let mut is_float = false;
    match radix {
        10 => {
            let mut trailing = scan_digit_run(cur, 10)?;
            if cur.peek() == Some('.') {
                if trailing {
                    return Err(ParseError::new(ErrorKind::BadNumber, cur.position()));
                }
                cur.bump();
                is_float = true;
                trailing = scan_digit_run(cur, 10)?;
            }
            if matches!(cur.peek(), Some('e') | Some('E')) {
                if trailing {
                    return Err(ParseError::new(ErrorKind::BadNumber, cur.position()));
                }
                cur.bump();
                is_float = true;
                if matches!(cur.peek(), Some('+') | Some('-')) {
                    cur.bump();
                }
                scan_digit_run(cur, 10)?;
            }
        }
        16 => {
            let mut trailing = scan_digit_run(cur, 16)?;
            let mut has_frac = false;
            if cur.peek() == Some('.') {
                if trailing {
                    return Err(ParseError::new(ErrorKind::BadNumber, cur.position()));
                }
                cur.bump();
                has_frac = true;
                trailing = scan_digit_run(cur, 16)?;
            }
            if matches!(cur.peek(), Some('p') | Some('P')) {
                if trailing {
                    return Err(ParseError::new(ErrorKind::BadNumber, cur.position()));
                }
                cur.bump();
                is_float = true;
                if matches!(cur.peek(), Some('+') | Some('-')) {
                    cur.bump();
                }
                scan_digit_run(cur, 10)?;
            } else if has_frac {
                // a hex fraction without its binary exponent is not a
                // number
                return Err(ParseError::new(ErrorKind::BadNumber, cur.position()));
            }
        }
        _ => {
            scan_digit_run(cur, radix)?;
        }
    }

    // `0b0123`, `0o999`, `123abc`: an over-range digit or stray letter
    // glued to the literal
    if matches!(cur.peek(), Some(c) if scanner::is_ident_continue(c)) {
        return Err(ParseError::new(ErrorKind::BadNumber, cur.position()));
    }

    let cleaned: String = cur
        .slice_from(start)
        .chars()
        .filter(|&c| c != '_')
        .collect();
    if is_float {
        Ok(Value::Float(convert_float(&cleaned, radix)))
    } else {
        Ok(Value::Int(convert_int(&cleaned, radix)))
    }
}

/// Consume a digit run for `radix`, with `_` separators. The first
/// code point must be a digit. Returns whether the run ended on `_`.
fn scan_digit_run(cur: &mut Cursor, radix: u32) -> Result<bool> {
    match cur.peek() {
        Some(c) if c.is_digit(radix) => {
            cur.bump();
        }
        _ => return Err(ParseError::new(ErrorKind::BadNumber, cur.position())),
    }
    let mut trailing_underscore = false;
    while let Some(c) = cur.peek() {
        if c.is_digit(radix) {
            cur.bump();
            trailing_underscore = false;
        } else if c == '_' {
            cur.bump();
            trailing_underscore = true;
        } else {
            break;
        }
    }
    Ok(trailing_underscore)
}

/// Convert an underscore-free integer lexeme. The scanner has already
/// validated every digit.
fn convert_int(cleaned: &str, radix: u32) -> BigInt {
    let (negative, body) = split_sign(cleaned);
    let digits = if radix == 10 { body } else { &body[2..] };
    let n = BigInt::parse_bytes(digits.as_bytes(), radix).unwrap();
    if negative {
        -n
    } else {
        n
    }
}

/// Convert an underscore-free float lexeme.
fn convert_float(cleaned: &str, radix: u32) -> f64 {
    if radix == 16 {
        // the scanner only commits to a hex float on a valid C99 shape
        parse_special_float(cleaned).unwrap()
    } else {
        cleaned.parse().unwrap()
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'+') => (false, &text[1..]),
        Some(b'-') => (true, &text[1..]),
        _ => (false, text),
    }
}

/// Parse the string payload of `@float`: `NaN`, `Infinity`, or `inf`
/// in any case with an optional sign, or a C99 hexadecimal float.
/// Underscores and plain decimal forms are not accepted.
pub(crate) fn parse_special_float(text: &str) -> Option<f64> {
    let (negative, body) = split_sign(text);
    let lower = body.to_ascii_lowercase();
    let magnitude = match lower.as_str() {
        "nan" => f64::NAN,
        "inf" | "infinity" => f64::INFINITY,
        _ => parse_c99_hex_float(&lower)?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a lowercase C99 hex float: `0x` mantissa (`H`, `H.H`, or
/// `.H`) and a mandatory `p` exponent in decimal.
fn parse_c99_hex_float(lower: &str) -> Option<f64> {
    let body = lower.strip_prefix("0x")?;
    let (mantissa, exp_text) = body.split_once('p')?;
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_hexdigit())
        || !frac_part.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    let (exp_negative, exp_digits) = split_sign(exp_text);
    if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let exp = match exp_digits.parse::<i64>() {
        Ok(e) if exp_negative => -e,
        Ok(e) => e,
        // an exponent too large for i64 saturates; the evaluator clamps
        Err(_) if exp_negative => i64::MIN / 2,
        Err(_) => i64::MAX / 2,
    };
    Some(hex_float_value(int_part, frac_part, exp))
}

/// Evaluate a hex mantissa with a base-2 exponent. Digits beyond what
/// a double can hold are folded into the exponent.
fn hex_float_value(int_part: &str, frac_part: &str, exp: i64) -> f64 {
    const MAX_DIGITS: u32 = 28;
    let mut mantissa: u128 = 0;
    let mut binexp: i64 = exp;
    let mut digits = 0u32;
    for b in int_part.bytes() {
        let d = (b as char).to_digit(16).unwrap() as u128;
        if mantissa == 0 && d == 0 {
            continue;
        }
        if digits < MAX_DIGITS {
            mantissa = mantissa * 16 + d;
            digits += 1;
        } else {
            binexp += 4;
        }
    }
    for b in frac_part.bytes() {
        let d = (b as char).to_digit(16).unwrap() as u128;
        if mantissa == 0 && d == 0 {
            binexp -= 4;
            continue;
        }
        if digits < MAX_DIGITS {
            mantissa = mantissa * 16 + d;
            binexp -= 4;
            digits += 1;
        }
    }
    if mantissa == 0 {
        return 0.0;
    }
    if binexp > 10_000 {
        return f64::INFINITY;
    }
    if binexp < -10_000 {
        return 0.0;
    }
    // scale in two steps so subnormal results survive
    let half = (binexp / 2) as i32;
    let rest = (binexp - half as i64) as i32;
    mantissa as f64 * 2f64.powi(half) * 2f64.powi(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(text: &str) -> Result<Value> {
        let mut cur = Cursor::new(text);
        let value = parse_number(&mut cur)?;
        assert!(cur.is_eof(), "number did not consume {:?}", text);
        Ok(value)
    }

    fn int(text: &str) -> BigInt {
        match parse_one(text).unwrap() {
            Value::Int(n) => n,
            other => panic!("expected int, got {:?}", other),
        }
    }

    fn float(text: &str) -> f64 {
        match parse_one(text).unwrap() {
            Value::Float(f) => f,
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_decimal_integers() {
        assert_eq!(int("0"), BigInt::from(0));
        assert_eq!(int("42"), BigInt::from(42));
        assert_eq!(int("-10"), BigInt::from(-10));
        assert_eq!(int("+7"), BigInt::from(7));
        assert_eq!(int("1_000_000"), BigInt::from(1_000_000));
    }

    #[test]
    fn test_radix_integers() {
        assert_eq!(int("0b0_1_0_1"), BigInt::from(5));
        assert_eq!(int("0o0_1_2_3"), BigInt::from(0o123));
        assert_eq!(int("0c17"), BigInt::from(0o17));
        assert_eq!(int("0x0_1_2_3"), BigInt::from(0x123));
        assert_eq!(int("-0xFF"), BigInt::from(-255));
    }

    #[test]
    fn test_big_integer() {
        assert_eq!(
            int("123456789012345678901234567890"),
            "123456789012345678901234567890".parse().unwrap()
        );
    }

    #[test]
    fn test_decimal_floats() {
        assert_eq!(float("0.0"), 0.0);
        assert_eq!(float("1.5"), 1.5);
        assert_eq!(float("1e5"), 1e5);
        assert_eq!(float("1.5e-3"), 1.5e-3);
        assert_eq!(float("2E+2"), 200.0);
        assert_eq!(float("1_0.2_5"), 10.25);
    }

    #[test]
    fn test_negative_zero_keeps_its_sign() {
        let f = float("-0.0");
        assert_eq!(f, 0.0);
        assert!(f.is_sign_negative());
    }

    #[test]
    fn test_hex_floats() {
        assert_eq!(float("0x1.8p3"), 12.0);
        assert_eq!(float("0x1p4"), 16.0);
        assert_eq!(float("-0x1.0p-1"), -0.5);
        assert_eq!(float("0xA.8P0"), 10.5);
    }

    #[test]
    fn test_over_range_digits_fail() {
        for text in ["0b0123", "0o999", "0xGHij", "123abc", "0b2"] {
            let err = parse_one(text).unwrap_err();
            assert_eq!(err.kind, ErrorKind::BadNumber, "{:?}", text);
        }
    }

    #[test]
    fn test_misplaced_underscores_fail() {
        for text in ["0b_1", "1_.5", "1._5", "1_e5", "1e_5", "0x1_.8p3", "0x1.8_p3"] {
            let err = parse_one(text).unwrap_err();
            assert_eq!(err.kind, ErrorKind::BadNumber, "{:?}", text);
        }
    }

    #[test]
    fn test_trailing_underscore_in_digit_run_is_fine() {
        assert_eq!(int("1_"), BigInt::from(1));
        assert_eq!(int("0x1_"), BigInt::from(1));
    }

    #[test]
    fn test_empty_mantissa_fails() {
        for text in ["+", "-", "0x", "0b", "1.", "1e", "1e+"] {
            assert!(parse_one(text).is_err(), "{:?}", text);
        }
    }

    #[test]
    fn test_hex_fraction_requires_exponent() {
        assert!(parse_one("0x1.8").is_err());
    }

    #[test]
    fn test_hex_digits_swallow_e() {
        // `e` is a hex digit, not an exponent marker, in radix 16
        assert_eq!(int("0x1e5"), BigInt::from(0x1e5));
    }

    #[test]
    fn test_special_float_spellings() {
        assert!(parse_special_float("NaN").unwrap().is_nan());
        assert!(parse_special_float("nan").unwrap().is_nan());
        assert_eq!(parse_special_float("+Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_special_float("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_special_float("-inf"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_special_float("INF"), Some(f64::INFINITY));
    }

    #[test]
    fn test_special_float_c99_hex() {
        assert_eq!(parse_special_float("0x1.8p3"), Some(12.0));
        assert_eq!(parse_special_float("-0x1p-2"), Some(-0.25));
        assert_eq!(parse_special_float("0x.8p1"), Some(1.0));
        assert_eq!(parse_special_float("0X1P4"), Some(16.0));
    }

    #[test]
    fn test_special_float_rejects_decimal_and_underscores() {
        assert_eq!(parse_special_float("1.5"), None);
        assert_eq!(parse_special_float("0x1_0p0"), None);
        assert_eq!(parse_special_float("0x1.8"), None);
        assert_eq!(parse_special_float(""), None);
        assert_eq!(parse_special_float("0xp3"), None);
    }

    #[test]
    fn test_hex_float_extremes() {
        assert_eq!(parse_special_float("0x1p99999999999999999999"), Some(f64::INFINITY));
        assert_eq!(parse_special_float("0x1p-99999999999999999999"), Some(0.0));
        assert_eq!(parse_special_float("0x0p0"), Some(0.0));
    }

    #[test]
    fn test_hex_float_long_mantissa_rounds() {
        let f = parse_special_float("0x1.0000000000000000000000000000000001p0").unwrap();
        assert_eq!(f, 1.0);
    }
}
