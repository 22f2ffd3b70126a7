//! Decoded payload values.
//!
//! A packet payload is a [`Record`]: field names mapped to [`Value`]s.
//! The shape of each record is fixed by the packet's schema, so the value
//! model only has to cover what the field codecs can produce.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// One decoded field value.
///
/// Signed wire integers decode to [`Value::Int`] and unsigned ones to
/// [`Value::UInt`]. When encoding, either variant is accepted for any
/// integer field as long as the number fits the wire width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    #[serde(rename = "uint")]
    UInt(u64),
    /// Both float widths. `f32` fields widen losslessly.
    Float(f64),
    Bool(bool),
    /// The symbolic name of an enumerated field.
    Enum(String),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Record(Record),
    Metadata(Metadata),
}

impl Value {
    /// Shorthand for an enum symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// Returns the value as `i64` if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `u64` if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Int(v) => u64::try_from(v).ok(),
            Self::UInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the text of a [`Value::Text`] or the name of a
    /// [`Value::Enum`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_metadata(&self) -> Option<&Metadata> {
        match self {
            Self::Metadata(m) => Some(m),
            _ => None,
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(<$wide>::from(v))
                }
            }
        )*
    };
}

impl_from_int!(Int as i64: i8, i16, i32, i64);
impl_from_int!(UInt as u64: u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl From<Metadata> for Value {
    fn from(v: Metadata) -> Self {
        Self::Metadata(v)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A set of named field values.
///
/// Two records are equal when they hold the same names and values,
/// regardless of the order fields were inserted in. Field order on the
/// wire comes from the schema, never from the record.
///
/// ```rust
/// use blockwire_protocol::{Record, Value};
///
/// let login = Record::new()
///     .with("eid", 42u32)
///     .with("mode", Value::symbol("creative"));
/// assert_eq!(login.get("eid").and_then(Value::as_u64), Some(42));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a field, returning the previous value if there was one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies in every field of `other` that `self` does not already have.
    ///
    /// Fields already present are left untouched, so merging several
    /// sources in call order gives the earliest source priority.
    pub fn merge_missing(&mut self, other: &Record) {
        for (name, value) in &other.0 {
            self.0
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_conversions_pick_signedness() {
        assert_eq!(Value::from(-3i8), Value::Int(-3));
        assert_eq!(Value::from(7u16), Value::UInt(7));
        assert_eq!(Value::from(u64::MAX), Value::UInt(u64::MAX));
    }

    #[test]
    fn test_integer_accessors_cross_signedness() {
        assert_eq!(Value::UInt(5).as_i64(), Some(5));
        assert_eq!(Value::Int(5).as_u64(), Some(5));
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::UInt(u64::MAX).as_i64(), None);
        assert_eq!(Value::Text("x".into()).as_i64(), None);
    }

    #[test]
    fn test_f32_widens_exactly() {
        let v = Value::from(0.1f32);
        assert_eq!(v.as_f64().map(|f| f as f32), Some(0.1f32));
    }

    #[test]
    fn test_as_str_covers_text_and_enum() {
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::symbol("earth").as_str(), Some("earth"));
        assert_eq!(Value::Bool(true).as_str(), None);
    }

    #[test]
    fn test_record_equality_ignores_insertion_order() {
        let a = Record::new().with("x", 1i32).with("y", 2i32);
        let b = Record::new().with("y", 2i32).with("x", 1i32);
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_missing_keeps_existing_fields() {
        let mut base = Record::new().with("eid", 1u32);
        let extra = Record::new().with("eid", 99u32).with("yaw", 3u8);
        base.merge_missing(&extra);

        assert_eq!(base.get("eid"), Some(&Value::UInt(1)));
        assert_eq!(base.get("yaw"), Some(&Value::UInt(3)));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_record_from_iterator() {
        let r: Record = [("a", 1u8), ("b", 2u8)].into_iter().collect();
        assert_eq!(r.len(), 2);
        assert!(r.contains("a"));
    }

    #[test]
    fn test_value_json_shape() {
        let json = serde_json::to_value(Value::UInt(7)).unwrap();
        assert_eq!(json["type"], "uint");
        assert_eq!(json["value"], 7);

        let json = serde_json::to_value(Value::symbol("hard")).unwrap();
        assert_eq!(json["type"], "enum");
        assert_eq!(json["value"], "hard");
    }

    #[test]
    fn test_record_json_round_trip() {
        let r = Record::new()
            .with("message", "Server closed")
            .with("nested", Record::new().with("grounded", 1u8));
        let bytes = serde_json::to_vec(&r).unwrap();
        let back: Record = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(r, back);
    }
}
