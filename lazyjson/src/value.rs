// SPDX-License-Identifier: Apache-2.0

use core::ops::Index;

use indexmap::IndexMap;

use crate::ValueKind;

/// Ordered mapping used for materialized objects. Keys keep the position of
/// their first occurrence, values are those of the last occurrence.
pub type Map = IndexMap<String, Value>;

/// A fully materialized JSON value.
///
/// Numbers compare by numeric value, so `Int(1) == Float(1.0)`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// A number literal without fraction or exponent that fits in an `i64`.
    Int(i64),
    /// Any other number literal.
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

macro_rules! is_xxx {
    ($name:ident, $variant:pat) => {
        pub fn $name(&self) -> bool {
            matches!(self, $variant)
        }
    };
}

impl Value {
    is_xxx!(is_null, Value::Null);
    is_xxx!(is_bool, Value::Bool(_));
    is_xxx!(is_number, Value::Int(_) | Value::Float(_));
    is_xxx!(is_string, Value::String(_));
    is_xxx!(is_array, Value::Array(_));
    is_xxx!(is_object, Value::Object(_));

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as `f64`, converting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Member of an object, `None` for missing keys and non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Whether a node of `kind` could materialize to something equal to `self`.
    pub(crate) fn could_equal(&self, kind: ValueKind) -> bool {
        match self {
            Value::Null => kind == ValueKind::Null,
            Value::Bool(true) => kind == ValueKind::True,
            Value::Bool(false) => kind == ValueKind::False,
            Value::Int(_) | Value::Float(_) => kind == ValueKind::Number,
            Value::String(_) => kind == ValueKind::String,
            Value::Array(_) => kind == ValueKind::Array,
            Value::Object(_) => kind == ValueKind::Object,
        }
    }
}

impl<'a> Index<&'a str> for Value {
    type Output = Value;

    fn index(&self, key: &'a str) -> &Self::Output {
        let obj = match self {
            Value::Object(o) => o,
            _ => panic!("Attempted to access key '{key}' on a non-object value {self:?}"),
        };
        match obj.get(key) {
            Some(value) => value,
            None => panic!("Key '{key}' was not found in {self:?}"),
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Value::Array(a) => &a[index],
            _ => panic!("Attempted to access index {index} on a non-array value {self:?}"),
        }
    }
}

macro_rules! impl_from {
    ($ty:ty, $v:ident => $val:expr) => {
        impl From<$ty> for Value {
            fn from($v: $ty) -> Self {
                $val
            }
        }
    };
}

impl_from!(bool, b => Value::Bool(b));
impl_from!(i32, i => Value::Int(i64::from(i)));
impl_from!(i64, i => Value::Int(i));
impl_from!(f64, f => Value::Float(f));
impl_from!(&str, s => Value::String(s.to_owned()));
impl_from!(String, s => Value::String(s));
impl_from!((), _unit => Value::Null);
impl_from!(Vec<Value>, a => Value::Array(a));
impl_from!(Map, o => Value::Object(o));

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                int_equals_float(*i, *f)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Exact comparison; `i as f64` would round large integers.
fn int_equals_float(i: i64, f: f64) -> bool {
    // i64::MIN is -2^63, exactly representable
    let bound = -(i64::MIN as f64);
    f.fract() == 0.0 && f >= -bound && f < bound && f as i64 == i
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_indexing() {
        let mut map = Map::new();
        map.insert("a".to_owned(), Value::from(1));
        map.insert("b".to_owned(), Value::from(vec![Value::Null, Value::from("x")]));
        let value = Value::Object(map);

        assert_eq!(value["a"], 1);
        assert_eq!(value["b"][1], "x");
        assert!(value["b"][0].is_null());
        assert_eq!(value.get("missing"), None);
    }

    #[test]
    #[should_panic(expected = "was not found")]
    fn test_missing_key_panics() {
        let value = Value::Object(Map::new());
        let _ = &value["nope"];
    }

    #[test]
    fn test_could_equal() {
        assert!(Value::from(true).could_equal(ValueKind::True));
        assert!(!Value::from(true).could_equal(ValueKind::False));
        assert!(Value::from(2.5).could_equal(ValueKind::Number));
        assert!(Value::from(()).could_equal(ValueKind::Null));
        assert!(!Value::from("a").could_equal(ValueKind::Array));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Float(-2.0), Value::Int(-2));
        assert_ne!(Value::Int(1), Value::Float(1.5));
        assert_ne!(Value::Int(i64::MAX), Value::Float(9223372036854775808.0));
        assert_eq!(Value::Int(i64::MIN), Value::Float(-9223372036854775808.0));
        assert_ne!(Value::Int(0), Value::Float(f64::NAN));
        assert_eq!(
            Value::from(vec![Value::Int(3), Value::Null]),
            Value::from(vec![Value::Float(3.0), Value::Null])
        );
        assert_ne!(Value::Int(1), Value::Bool(true));
    }
}
