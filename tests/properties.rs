//! Property-based tests for the RSON parser.
//!
//! These verify grammar invariants over generated value trees rather
//! than crafted examples: a renderer writes each tree back out with
//! controllable whitespace, comments, and trailing commas, and the
//! parser must read the same tree back regardless of the styling.

use librson::{parse_str, ErrorKind, Value};
use num_bigint::BigInt;
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// =============================================================================
// Value generator and renderer
// =============================================================================

/// Scalar values the renderer can write back exactly.
fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Int(BigInt::from(n))),
        any::<f64>()
            .prop_filter("finite floats only", |f| f.is_finite())
            .prop_map(Value::Float),
        prop::collection::vec(any::<char>(), 0..8)
            .prop_map(|cs| Value::String(cs.into_iter().collect())),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ]
}

/// Trees of lists, records (unique string keys), and tables. Tables
/// get at least one pair so they do not render as an empty list.
fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec(("[a-z]{1,6}", inner.clone()), 0..4).prop_map(|pairs| {
                let mut keys: Vec<String> = Vec::new();
                let mut out = Vec::new();
                for (k, v) in pairs {
                    if !keys.contains(&k) {
                        keys.push(k.clone());
                        out.push((Value::String(k), v));
                    }
                }
                Value::Record(out)
            }),
            prop::collection::vec((inner.clone(), inner), 1..4).prop_map(Value::Table),
        ]
    })
}

#[derive(Clone, Copy)]
struct Style {
    /// Inserted at every token boundary inside containers.
    gap: &'static str,
    trailing_comma: bool,
}

const MINIMAL: Style = Style {
    gap: "",
    trailing_comma: false,
};
const COMMENTED: Style = Style {
    gap: " # noise\n ",
    trailing_comma: false,
};
const TRAILING: Style = Style {
    gap: " ",
    trailing_comma: true,
};

fn render(value: &Value, style: Style) -> String {
    let mut out = String::new();
    write_value(value, style, &mut out);
    out
}

fn write_value(value: &Value, style: Style, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Float(f) => out.push_str(&format!("{:?}", f)),
        Value::String(s) => write_string(s, out),
        Value::Bytes(b) => write_bytes(b, out),
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(style.gap);
                write_value(item, style, out);
            }
            if style.trailing_comma && !items.is_empty() {
                out.push(',');
            }
            out.push_str(style.gap);
            out.push(']');
        }
        Value::Record(pairs) => {
            out.push('{');
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(style.gap);
                write_value(k, style, out);
                out.push_str(style.gap);
                out.push(':');
                out.push_str(style.gap);
                write_value(v, style, out);
            }
            if style.trailing_comma && !pairs.is_empty() {
                out.push(',');
            }
            out.push_str(style.gap);
            out.push('}');
        }
        Value::Table(pairs) => {
            out.push('[');
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(style.gap);
                write_value(k, style, out);
                out.push_str(style.gap);
                out.push(':');
                out.push_str(style.gap);
                write_value(v, style, out);
            }
            if style.trailing_comma && !pairs.is_empty() {
                out.push(',');
            }
            out.push_str(style.gap);
            out.push(']');
        }
        other => unreachable!("generator never produces {:?}", other),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_bytes(b: &[u8], out: &mut String) {
    out.push_str("b\"");
    for &byte in b {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\x{:02x}", byte)),
        }
    }
    out.push('"');
}

fn hash_of(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Invariants
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Parsing is deterministic, and the renderer/parser pair round-trips
    /// the generated tree exactly.
    #[test]
    fn parse_is_deterministic(v in value()) {
        let text = render(&v, MINIMAL);
        let first = parse_str(&text).unwrap();
        let second = parse_str(&text).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &v);
    }

    /// Whitespace and comment insertion at token boundaries leaves the
    /// parsed tree unchanged.
    #[test]
    fn whitespace_and_comments_are_invisible(v in value()) {
        let plain = parse_str(&render(&v, MINIMAL)).unwrap();
        let noisy = parse_str(&render(&v, COMMENTED)).unwrap();
        prop_assert_eq!(plain, noisy);
    }

    /// Trailing-comma insertion before a closer leaves the parsed tree
    /// unchanged.
    #[test]
    fn trailing_commas_are_invisible(v in value()) {
        let plain = parse_str(&render(&v, MINIMAL)).unwrap();
        let commaed = parse_str(&render(&v, TRAILING)).unwrap();
        prop_assert_eq!(plain, commaed);
    }

    /// Equality is reflexive for every NaN-free value.
    #[test]
    fn equality_is_reflexive_without_nan(v in value()) {
        prop_assert_eq!(&v, &v);
    }

    /// Records that differ only in key order are equal and hash equal.
    #[test]
    fn record_key_order_is_ignored(
        pairs in prop::collection::vec(("[a-z]{1,6}", leaf()), 2..5)
    ) {
        let mut keys: Vec<String> = Vec::new();
        let mut unique = Vec::new();
        for (k, v) in pairs {
            if !keys.contains(&k) {
                keys.push(k.clone());
                unique.push((Value::String(k), v));
            }
        }
        let forward = Value::Record(unique.clone());
        let mut reversed_pairs = unique;
        reversed_pairs.reverse();
        let reversed = Value::Record(reversed_pairs);
        prop_assert_eq!(&forward, &reversed);
        prop_assert_eq!(hash_of(&forward), hash_of(&reversed));
    }

    /// A record with a duplicated key never parses.
    #[test]
    fn duplicate_record_keys_never_parse(
        key in "[a-z]{1,6}",
        v1 in leaf(),
        v2 in leaf()
    ) {
        let mut text = String::from("{");
        write_string(&key, &mut text);
        text.push(':');
        write_value(&v1, MINIMAL, &mut text);
        text.push(',');
        write_string(&key, &mut text);
        text.push(':');
        write_value(&v2, MINIMAL, &mut text);
        text.push('}');
        let err = parse_str(&text).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::DuplicateKey);
    }

    /// `Int(n) == Float(n as f64)` whenever the conversion is exact,
    /// and the two hash equal.
    #[test]
    fn exact_int_float_cross_equality(n in any::<i32>()) {
        let i = Value::Int(BigInt::from(n));
        let f = Value::Float(f64::from(n));
        prop_assert_eq!(&i, &f);
        prop_assert_eq!(hash_of(&i), hash_of(&f));
    }

    /// The parser returns a value or an error; it never panics, even
    /// on arbitrary bytes.
    #[test]
    fn parser_never_panics(input in prop::collection::vec(any::<u8>(), 0..400)) {
        let _ = librson::parse(&input);
    }

    /// ASCII-heavy input, more likely to reach deep grammar paths.
    #[test]
    fn parser_never_panics_ascii(input in "[ -~\\n\\t]{0,300}") {
        let _ = parse_str(&input);
    }
}

// =============================================================================
// NaN corner of the equality relation
// =============================================================================

#[test]
fn nan_containers_equal_nothing() {
    let direct = parse_str("@float 'NaN'").unwrap();
    assert_ne!(direct, direct.clone());

    let boxed = parse_str("[@float 'NaN']").unwrap();
    assert_ne!(boxed, boxed.clone());

    let keyed = parse_str("{\"k\": @float 'nan'}").unwrap();
    assert_ne!(keyed, keyed.clone());
}

#[test]
fn non_nan_documents_equal_themselves() {
    let value = parse_str("{\"a\": [1, 2.5, \"x\"], \"b\": @set [1, 2]}").unwrap();
    assert_eq!(value, value.clone());
}
