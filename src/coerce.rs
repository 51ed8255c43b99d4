//! Value coercion between native field values and canonical [`Value`]s.
//!
//! Outbound ([`to_canonical`]) never fails: anything without a canonical form becomes `Null` and is reported.
//! Inbound ([`from_canonical`]) returns a [`CoercionError`] and leaves the decision (skip the field, report)
//! to the caller.

use crate::config::MapperConfig;
use crate::errors::{CoercionError, Issue, Report};
use crate::reflect::{EnumRepr, FieldKind, Native, NativeRef, Record};
use crate::value::{Number, Value};

/// Result of converting one native value outbound.
#[derive(Debug)]
pub enum Coerced<'a> {
    /// A finished canonical value and the kind it came from.
    Leaf(Value, FieldKind),
    /// A nested record still to be walked.
    Record(&'a dyn Record, FieldKind),
    /// A collection still to be walked, with its element kind.
    List(Vec<NativeRef<'a>>, FieldKind),
}

/// Convert a native value to its canonical form, one level deep.
///
/// ## Parameters
/// - `native`: the field value.
/// - `path`: field path used when reporting.
/// - `report`: receives an `UnknownKind` issue for values with no canonical form.
///
/// ## Returns
/// - (`Coerced`): a leaf, or a record / list the caller has to recurse into.
///
/// ## Notes
/// Optionals unwrap one level; an empty optional becomes `Null` tagged with the kind it would have held.
pub fn to_canonical<'a>(native: NativeRef<'a>, path: &str, report: &mut Report) -> Coerced<'a> {
    match native {
        NativeRef::Bool(b) => Coerced::Leaf(Value::Bool(b), FieldKind::Bool),
        NativeRef::Int(i) => Coerced::Leaf(Value::from(i), FieldKind::Number),
        NativeRef::UInt(u) => Coerced::Leaf(Value::from(u), FieldKind::Number),
        NativeRef::Float(f) => match Number::from_f64(f) {
            Some(n) => Coerced::Leaf(Value::Number(n), FieldKind::Number),
            None => {
                report.push(path, Issue::UnknownKind { kind: format!("float {f}") });
                Coerced::Leaf(Value::Null, FieldKind::Number)
            }
        },
        NativeRef::Text(s) => Coerced::Leaf(Value::String(s.to_string()), FieldKind::Text),
        NativeRef::Date(d) => Coerced::Leaf(Value::Date(d), FieldKind::Date),
        NativeRef::Optional(Some(inner), _) => to_canonical(*inner, path, report),
        NativeRef::Optional(None, kind) => Coerced::Leaf(Value::Null, kind),
        NativeRef::Enum { type_name, repr } => enum_to_canonical(type_name, repr, path, report),
        NativeRef::List(items, element) => Coerced::List(items, element),
        NativeRef::Map(map) => Coerced::Leaf(Value::Map(map.clone()), FieldKind::Map),
        NativeRef::Record(record) => Coerced::Record(record, FieldKind::Record(record.type_name())),
        NativeRef::Opaque(type_name) => {
            report.push(path, Issue::UnknownKind { kind: type_name.to_string() });
            Coerced::Leaf(Value::Null, FieldKind::Opaque(type_name))
        }
    }
}

fn enum_to_canonical<'a>(type_name: &'static str, repr: EnumRepr<'a>, path: &str, report: &mut Report) -> Coerced<'a> {
    let kind = FieldKind::Enum(type_name);
    match repr {
        EnumRepr::RawText(raw) => Coerced::Leaf(Value::from(raw), kind),
        EnumRepr::RawInt(raw) => Coerced::Leaf(Value::from(raw), kind),
        EnumRepr::Associated { payload, .. } => to_canonical(*payload, path, report),
        EnumRepr::Plain(name) => Coerced::Leaf(Value::from(name), kind),
    }
}

/// Convert a canonical value into a native value for a field of kind `kind`.
///
/// ## Notes
/// - string → number parses as an integer first, then as a float; no silent zero on failure.
/// - number → string uses the number's standard formatting.
/// - string → date parses with the configured date format.
/// - optionals coerce against their inner kind, lists element-wise.
///
/// Anything else passes through unchanged; the field's own [`crate::reflect::Field::from_native`] has the last
/// word on whether it fits.
///
/// ## Examples
/// ```rust
/// use reflectmap::coerce::from_canonical;
/// use reflectmap::reflect::{FieldKind, Native};
/// use reflectmap::{MapperConfig, Value};
///
/// let config = MapperConfig::default();
/// let native = from_canonical(&Value::from(42), &FieldKind::Text, &config).unwrap();
/// assert!(matches!(native, Native::Text(ref s) if s == "42"));
/// assert!(from_canonical(&Value::from("abc"), &FieldKind::Number, &config).is_err());
/// ```
pub fn from_canonical(value: &Value, kind: &FieldKind, config: &MapperConfig) -> Result<Native, CoercionError> {
    match (value, kind) {
        (Value::Null, _) => Ok(Native::Null),
        (_, FieldKind::Optional(inner)) => from_canonical(value, inner, config),
        (Value::String(s), FieldKind::Number) => parse_number(s).map(Native::Number),
        (Value::Number(n), FieldKind::Text) => Ok(Native::Text(n.to_string())),
        (Value::String(s), FieldKind::Date) => config.parse_date(s).map(Native::Date),
        (Value::List(items), FieldKind::List(element)) => items
            .iter()
            .map(|item| from_canonical(item, element, config))
            .collect::<Result<Vec<_>, _>>()
            .map(Native::List),
        _ => Ok(Native::from(value.clone())),
    }
}

/// Parse a numeric string: `i64`, then `u64`, then finite `f64`.
pub fn parse_number(input: &str) -> Result<Number, CoercionError> {
    let text = input.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Number::from(u));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| CoercionError::NumericParse {
            input: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn leaf(native: NativeRef<'_>) -> (Value, FieldKind, Report) {
        let mut report = Report::default();
        match to_canonical(native, "f", &mut report) {
            Coerced::Leaf(value, kind) => (value, kind, report),
            other => panic!("expected a leaf, got {other:?}"),
        }
    }

    #[test]
    fn empty_optional_keeps_kind() {
        let (value, kind, report) = leaf(NativeRef::Optional(None, FieldKind::Date));
        assert_eq!(value, Value::Null);
        assert_eq!(kind, FieldKind::Date);
        assert!(report.is_clean());
    }

    #[test]
    fn optional_unwraps_one_level() {
        let inner = NativeRef::Optional(Some(Box::new(NativeRef::Text("x"))), FieldKind::Text);
        let (value, _, _) = leaf(inner);
        assert_eq!(value, Value::from("x"));
    }

    #[test]
    fn enum_representations() {
        let raw = NativeRef::Enum {
            type_name: "Status",
            repr: EnumRepr::RawText("active"),
        };
        assert_eq!(leaf(raw).0, Value::from("active"));

        let code = NativeRef::Enum {
            type_name: "Level",
            repr: EnumRepr::RawInt(3),
        };
        assert_eq!(leaf(code).0, Value::from(3));

        let payload = NativeRef::Enum {
            type_name: "Amount",
            repr: EnumRepr::Associated {
                label: "Cents",
                payload: Box::new(NativeRef::Int(150)),
            },
        };
        let (value, kind, _) = leaf(payload);
        assert_eq!(value, Value::from(150));
        assert_eq!(kind, FieldKind::Number);

        let plain = NativeRef::Enum {
            type_name: "Color",
            repr: EnumRepr::Plain("Red"),
        };
        assert_eq!(leaf(plain).0, Value::from("Red"));
    }

    #[test]
    fn non_finite_float_is_reported() {
        let (value, _, report) = leaf(NativeRef::Float(f64::NAN));
        assert_eq!(value, Value::Null);
        assert!(matches!(report.at("f"), Some(Issue::UnknownKind { .. })));
    }

    #[test]
    fn opaque_is_reported() {
        let (value, _, report) = leaf(NativeRef::Opaque("std::fs::File"));
        assert_eq!(value, Value::Null);
        assert_eq!(
            report.at("f"),
            Some(&Issue::UnknownKind {
                kind: "std::fs::File".to_string()
            })
        );
    }

    #[test]
    fn string_to_number() {
        let config = MapperConfig::default();
        let native = from_canonical(&Value::from("42"), &FieldKind::Number, &config).unwrap();
        assert!(matches!(native, Native::Number(ref n) if n.as_i64() == Some(42)));
        let native = from_canonical(&Value::from("2.5"), &FieldKind::Number, &config).unwrap();
        assert!(matches!(native, Native::Number(ref n) if n.as_f64() == Some(2.5)));
    }

    #[test]
    fn bad_number_is_an_error() {
        let config = MapperConfig::default();
        let err = from_canonical(&Value::from("abc"), &FieldKind::Number, &config).unwrap_err();
        assert_eq!(
            err,
            CoercionError::NumericParse {
                input: "abc".to_string()
            }
        );
        assert!(parse_number("NaN").is_err());
    }

    #[test]
    fn string_to_date_under_optional() {
        let config = MapperConfig::default();
        let kind = FieldKind::Optional(Box::new(FieldKind::Date));
        let native = from_canonical(&Value::from("2024-05-01T12:30:00+0000"), &kind, &config).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert!(matches!(native, Native::Date(d) if d == expected));
    }

    #[test]
    fn list_elements_coerce_individually() {
        let config = MapperConfig::default();
        let value = Value::List(vec![Value::from("1"), Value::from(2)]);
        let kind = FieldKind::List(Box::new(FieldKind::Number));
        let Native::List(items) = from_canonical(&value, &kind, &config).unwrap() else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| matches!(item, Native::Number(_))));
    }

    #[test]
    fn null_is_null_for_every_kind() {
        let config = MapperConfig::default();
        for kind in [FieldKind::Text, FieldKind::Number, FieldKind::Record("User")] {
            assert!(matches!(from_canonical(&Value::Null, &kind, &config), Ok(Native::Null)));
        }
    }
}
