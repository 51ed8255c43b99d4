//! Structural equality, hashing and debug descriptions over serialized records.
//!
//! All three work on the mapping produced by the walker (raw keys, no cleanup), so two records compare
//! equal exactly when they serialize alike.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::MapperConfig;
use crate::reflect::Record;
use crate::value::{Mapping, Number, Value};
use crate::walker::to_mapping;

/// Compare two records field by field.
///
/// ## Notes
/// The comparison is asymmetric: only keys present in the serialized `rhs` are checked, and a key missing
/// from `lhs` makes the records unequal. Dates are compared at whole-second precision.
///
/// ## Examples
/// ```rust
/// use reflectmap::equality::equal;
/// use reflectmap::{MapperConfig, Record};
///
/// #[derive(Debug, Default, Record)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let config = MapperConfig::default();
/// assert!(equal(&Point { x: 1, y: 2 }, &Point { x: 1, y: 2 }, &config));
/// assert!(!equal(&Point { x: 1, y: 2 }, &Point { x: 1, y: 3 }, &config));
/// ```
pub fn equal(lhs: &dyn Record, rhs: &dyn Record, config: &MapperConfig) -> bool {
    if lhs.type_name() != rhs.type_name() {
        return false;
    }
    let lhs = to_mapping(lhs, false, config).into_value();
    let rhs = to_mapping(rhs, false, config).into_value();
    mappings_equal(&lhs, &rhs)
}

/// Asymmetric mapping comparison: every entry of `rhs` must have an equal counterpart in `lhs`.
pub fn mappings_equal(lhs: &Mapping, rhs: &Mapping) -> bool {
    rhs.iter()
        .all(|(key, right)| lhs.get(key).is_some_and(|left| values_equal(left, right)))
}

pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Date(a), Value::Date(b)) => a.timestamp() == b.timestamp(),
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(left, right)| values_equal(left, right))
        }
        (Value::Map(a), Value::Map(b)) => mappings_equal(a, b),
        _ => lhs == rhs,
    }
}

/// Integers compare exactly; as soon as one side is a float both are compared as `f64`.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        a.as_f64() == b.as_f64()
    } else {
        a == b
    }
}

/// Hash of a record's serialized values: `31 * acc + hash(value)`, wrapping.
pub fn hash_value(instance: &dyn Record, config: &MapperConfig) -> u64 {
    let mapping = to_mapping(instance, false, config).into_value();
    mapping
        .values()
        .fold(0u64, |acc, value| acc.wrapping_mul(31).wrapping_add(hash_one(value)))
}

fn hash_one(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    feed(value, &mut hasher);
    hasher.finish()
}

fn feed(value: &Value, hasher: &mut DefaultHasher) {
    std::mem::discriminant(value).hash(hasher);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(hasher),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.hash(hasher),
            (None, Some(u)) => u.hash(hasher),
            // Whole floats hash like the integer they equal.
            _ => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => (f as i64).hash(hasher),
                Some(f) => f.to_bits().hash(hasher),
                None => {}
            },
        },
        Value::String(s) => s.hash(hasher),
        Value::Date(d) => d.timestamp().hash(hasher),
        Value::List(items) => {
            items.len().hash(hasher);
            for item in items {
                feed(item, hasher);
            }
        }
        Value::Map(map) => {
            map.len().hash(hasher);
            for (key, item) in map {
                key.hash(hasher);
                feed(item, hasher);
            }
        }
    }
}

/// Multi-line description of a record: type name, hash, then one line per serialized field.
///
/// ```text
/// Point {
///    hash = 1234
///    key = x, value = 1
///    key = y, value = 2
/// }
/// ```
pub fn describe(instance: &dyn Record, config: &MapperConfig) -> String {
    let mapping = to_mapping(instance, false, config).into_value();
    let mut out = format!("{} {{\n", instance.type_name());
    out.push_str(&format!("   hash = {}\n", hash_value(instance, config)));
    for (key, value) in &mapping {
        out.push_str(&format!("   key = {key}, value = {value}\n"));
    }
    out.push_str("}\n");
    out
}
