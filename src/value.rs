//! RSON value representation.
//!
//! Values are built bottom-up during parsing and are immutable
//! afterwards. Equality follows the RSON relation rather than plain
//! structural equality: `Int` and `Float` compare across variants when
//! the conversion is exact, `+0.0` equals `-0.0`, NaN equals nothing
//! (itself included), records and dicts compare order-insensitively and
//! against each other. The `Hash` implementation is consistent with
//! that relation.

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ErrorKind;

/// An instant on the UTC timeline, as produced by `@datetime`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub epoch_seconds: i64,
    /// Nanoseconds within the second.
    pub nanos: u32,
}

/// An RSON value.
#[derive(Clone)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Arbitrary-precision integer.
    Int(BigInt),
    /// 64-bit floating-point number.
    Float(f64),
    /// Unicode scalar string.
    String(String),
    /// Raw octets.
    Bytes(Vec<u8>),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Insertion-ordered association with unique keys.
    Record(Vec<(Value, Value)>),
    /// Unordered collection of unique values (`@set`).
    Set(Vec<Value>),
    /// Unordered association with unique, homogeneously-typed keys
    /// (`@dict`), stored sorted by key.
    Dict(Vec<(Value, Value)>),
    /// Ordered key/value pairs that may repeat keys.
    Table(Vec<(Value, Value)>),
    /// Complex number, real and imaginary parts.
    Complex(f64, f64),
    /// UTC instant (`@datetime`).
    DateTime(Timestamp),
    /// Span in seconds (`@duration`).
    Duration(f64),
    /// A non-reserved user tag attached to a value.
    Tagged(String, Box<Value>),
}

/// The concrete variants a dict key may take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyKind {
    Bool,
    Int,
    Float,
    String,
    Bytes,
}

impl Value {
    /// Build a record, rejecting duplicate keys.
    pub fn record(pairs: Vec<(Value, Value)>) -> Result<Value, ErrorKind> {
        for i in 1..pairs.len() {
            if pairs[..i].iter().any(|(k, _)| *k == pairs[i].0) {
                return Err(ErrorKind::DuplicateKey);
            }
        }
        Ok(Value::Record(pairs))
    }

    /// Build a set, rejecting duplicate members.
    pub fn set(items: Vec<Value>) -> Result<Value, ErrorKind> {
        for i in 1..items.len() {
            if items[..i].contains(&items[i]) {
                return Err(ErrorKind::DuplicateKey);
            }
        }
        Ok(Value::Set(items))
    }

    /// Build a dict. Keys must all take one comparable variant and be
    /// unique; the pairs are stored sorted by key.
    pub fn dict(mut pairs: Vec<(Value, Value)>) -> Result<Value, ErrorKind> {
        if let Some((first, _)) = pairs.first() {
            let kind = first.key_kind().ok_or(ErrorKind::DictKeyType)?;
            if pairs.iter().any(|(k, _)| k.key_kind() != Some(kind)) {
                return Err(ErrorKind::DictKeyType);
            }
        }
        pairs.sort_by(|a, b| key_order(&a.0, &b.0));
        if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(ErrorKind::DuplicateKey);
        }
        Ok(Value::Dict(pairs))
    }

    /// Attach a user tag. Tags never nest.
    pub fn tagged(name: impl Into<String>, value: Value) -> Result<Value, ErrorKind> {
        if matches!(value, Value::Tagged(..)) {
            return Err(ErrorKind::TagNest);
        }
        Ok(Value::Tagged(name.into(), Box::new(value)))
    }

    fn key_kind(&self) -> Option<KeyKind> {
        match self {
            Value::Bool(_) => Some(KeyKind::Bool),
            Value::Int(_) => Some(KeyKind::Int),
            Value::Float(f) if !f.is_nan() => Some(KeyKind::Float),
            Value::String(_) => Some(KeyKind::String),
            Value::Bytes(_) => Some(KeyKind::Bytes),
            _ => None,
        }
    }

    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a reference to the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the float value if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the bytes if this is a `Bytes`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the items if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the key/value pairs if this is a `Record`.
    pub fn as_record(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Record(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Returns the members if this is a `Set`.
    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the key/value pairs if this is a `Dict`.
    pub fn as_dict(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Dict(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Returns the key/value pairs if this is a `Table`.
    pub fn as_table(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Table(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Look up a string key in a record or dict.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let pairs = match self {
            Value::Record(pairs) | Value::Dict(pairs) => pairs,
            _ => return None,
        };
        pairs
            .iter()
            .find(|(k, _)| matches!(k, Value::String(s) if s == key))
            .map(|(_, v)| v)
    }

    /// Iterate over the immediate child values of a container.
    pub fn children(&self) -> impl Iterator<Item = &Value> {
        let (items, pairs): (&[Value], &[(Value, Value)]) = match self {
            Value::List(items) | Value::Set(items) => (items.as_slice(), &[]),
            Value::Record(pairs) | Value::Dict(pairs) | Value::Table(pairs) => {
                (&[], pairs.as_slice())
            }
            Value::Tagged(_, inner) => (std::slice::from_ref(inner.as_ref()), &[]),
            _ => (&[], &[]),
        };
        items
            .iter()
            .chain(pairs.iter().flat_map(|(k, v)| [k, v]))
    }
}

/// Total order for homogeneous dict keys; lexical for strings and
/// bytes, numeric otherwise. Only called on values of one `KeyKind`.
fn key_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Whether an integer and a float denote the same number. The float
/// must convert to the integer exactly.
fn int_eq_float(n: &BigInt, f: f64) -> bool {
    if !f.is_finite() || f.fract() != 0.0 {
        return false;
    }
    BigInt::from_f64(f).is_some_and(|m| m == *n)
}

/// Order-insensitive pair comparison for records and dicts. Keys are
/// unique within each side, so subset-plus-length is equality.
fn pairs_eq_unordered(a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.iter().any(|(bk, bv)| k == bk && v == bv))
}

fn set_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                int_eq_float(a, *b)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => set_eq(a, b),
            (Value::Record(a), Value::Record(b))
            | (Value::Record(a), Value::Dict(b))
            | (Value::Dict(a), Value::Record(b))
            | (Value::Dict(a), Value::Dict(b)) => pairs_eq_unordered(a, b),
            (Value::Complex(ar, ai), Value::Complex(br, bi)) => ar == br && ai == bi,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Tagged(an, av), Value::Tagged(bn, bv)) => an == bn && av == bv,
            _ => false,
        }
    }
}

/// Float bits for hashing: both zeroes collapse to one image, every
/// NaN to another, so equal floats hash equal.
fn float_hash_bits(f: f64) -> u64 {
    if f == 0.0 {
        0
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

fn hash_one(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            // Int and integral Float share an image so that values
            // equal across the variants hash equal.
            Value::Int(n) => {
                state.write_u8(2);
                n.hash(state);
            }
            Value::Float(f) => {
                state.write_u8(2);
                if f.is_finite() && f.fract() == 0.0 {
                    if let Some(n) = BigInt::from_f64(*f) {
                        n.hash(state);
                        return;
                    }
                }
                state.write_u64(float_hash_bits(*f));
            }
            Value::String(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            Value::Bytes(b) => {
                state.write_u8(4);
                b.hash(state);
            }
            Value::List(items) => {
                state.write_u8(5);
                state.write_usize(items.len());
                for item in items {
                    item.hash(state);
                }
            }
            Value::Set(items) => {
                state.write_u8(6);
                state.write_usize(items.len());
                let mut acc: u64 = 0;
                for item in items {
                    acc = acc.wrapping_add(hash_one(item));
                }
                state.write_u64(acc);
            }
            // Record and Dict share an image: they compare equal when
            // their pair sets match, order ignored.
            Value::Record(pairs) | Value::Dict(pairs) => {
                state.write_u8(7);
                state.write_usize(pairs.len());
                let mut acc: u64 = 0;
                for (k, v) in pairs {
                    let mut hasher = DefaultHasher::new();
                    k.hash(&mut hasher);
                    v.hash(&mut hasher);
                    acc = acc.wrapping_add(hasher.finish());
                }
                state.write_u64(acc);
            }
            Value::Table(pairs) => {
                state.write_u8(8);
                state.write_usize(pairs.len());
                for (k, v) in pairs {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Complex(re, im) => {
                state.write_u8(9);
                state.write_u64(float_hash_bits(*re));
                state.write_u64(float_hash_bits(*im));
            }
            Value::DateTime(t) => {
                state.write_u8(10);
                t.hash(state);
            }
            Value::Duration(d) => {
                state.write_u8(11);
                state.write_u64(float_hash_bits(*d));
            }
            Value::Tagged(name, inner) => {
                state.write_u8(12);
                name.hash(state);
                inner.hash(state);
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else {
                    write!(f, "{:?}", n)
                }
            }
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => {
                write!(f, "b<")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ">")
            }
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Record(pairs) => f.debug_map().entries(pairs.iter().map(|(k, v)| (k, v))).finish(),
            Value::Set(items) => {
                write!(f, "@set ")?;
                f.debug_list().entries(items).finish()
            }
            Value::Dict(pairs) => {
                write!(f, "@dict ")?;
                f.debug_map().entries(pairs.iter().map(|(k, v)| (k, v))).finish()
            }
            Value::Table(pairs) => {
                write!(f, "[")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {:?}", k, v)?;
                }
                write!(f, "]")
            }
            Value::Complex(re, im) => write!(f, "@complex [{:?}, {:?}]", re, im),
            Value::DateTime(t) => {
                write!(f, "@datetime {}s", t.epoch_seconds)?;
                if t.nanos != 0 {
                    write!(f, "+{}ns", t.nanos)?;
                }
                Ok(())
            }
            Value::Duration(d) => write!(f, "@duration {:?}", d),
            Value::Tagged(name, inner) => write!(f, "@{} {:?}", name, inner),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(BigInt::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}
