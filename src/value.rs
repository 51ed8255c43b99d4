//! Canonical value model.
//!
//! Every conversion passes through [`Value`]: records serialize into a [`Mapping`] of these, and are
//! rebuilt from one. Nothing native (records, enums, integer widths) survives past this boundary.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

pub use serde_json::Number;

/// Insertion-ordered `String -> Value` map; the shape of a serialized record.
pub type Mapping = IndexMap<String, Value>;

/// A canonical value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    /// Opaque numeric; lossless for `i64`, `u64` and finite `f64`.
    Number(Number),
    String(String),
    /// An instant, always normalized to UTC.
    Date(DateTime<Utc>),
    List(Vec<Value>),
    Map(Mapping),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Build a float value. Non-finite floats have no canonical form and become `Null`.
    pub fn from_f64(f: f64) -> Value {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

macro_rules! value_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

value_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::from_f64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(map)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Collect the keys of a document, in order, for key normalization.
pub fn document_keys(map: &Mapping) -> Vec<&str> {
    map.keys().map(String::as_str).collect()
}

/// Build a [`Mapping`] from `key => value` pairs.
///
/// ```rust
/// use reflectmap::mapping;
///
/// let m = mapping! { "name" => "Ann", "age" => 41 };
/// assert_eq!(m.len(), 2);
/// ```
#[macro_export]
macro_rules! mapping {
    () => { $crate::value::Mapping::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Mapping::new();
        $( map.insert(::std::string::String::from($key), $crate::value::Value::from($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn non_finite_float_is_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(f64::INFINITY), Value::Null);
    }

    #[test]
    fn integer_widths_share_one_number() {
        assert_eq!(Value::from(42u8), Value::from(42i64));
        assert_eq!(Value::from(u64::MAX).as_number().and_then(Number::as_u64), Some(u64::MAX));
    }

    #[test]
    fn display_nests() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().unwrap_or_default();
        let value = Value::Map(mapping! {
            "tags" => vec![Value::from("a"), Value::from(1)],
            "at" => date,
        });
        assert_eq!(value.to_string(), r#"{tags: ["a", 1], at: 2024-01-02T03:04:05Z}"#);
    }

    #[test]
    fn document_keys_keep_insertion_order() {
        let map = mapping! { "b" => 1, "a" => 2 };
        assert_eq!(document_keys(&map), vec!["b", "a"]);
    }
}
