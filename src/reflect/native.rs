//! Native value views exchanged between records and the coercion engine.

use chrono::{DateTime, Utc};

use super::{FieldKind, Record};
use crate::value::{Mapping, Number, Value};

/// A borrowed view of a field's native value, produced by [`super::Field::to_native`].
#[derive(Debug, Clone)]
pub enum NativeRef<'a> {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(&'a str),
    Date(DateTime<Utc>),
    /// One level of `Option`; an empty optional keeps the kind it would have held.
    Optional(Option<Box<NativeRef<'a>>>, FieldKind),
    Enum {
        type_name: &'static str,
        repr: EnumRepr<'a>,
    },
    /// Elements plus the declared element kind (needed when the list is empty).
    List(Vec<NativeRef<'a>>, FieldKind),
    Map(&'a Mapping),
    Record(&'a dyn Record),
    /// A value with no canonical form; carries its type name for diagnostics.
    Opaque(&'static str),
}

/// How an enumeration value presents itself.
#[derive(Debug, Clone)]
pub enum EnumRepr<'a> {
    /// Variant with an associated raw string.
    RawText(&'static str),
    /// Variant with an associated raw integer.
    RawInt(i64),
    /// Variant carrying a payload; the payload is converted in its place.
    Associated {
        label: &'static str,
        payload: Box<NativeRef<'a>>,
    },
    /// Plain variant, represented by its name.
    Plain(&'static str),
}

/// An owned native value handed to [`super::Field::from_native`].
#[derive(Debug)]
pub enum Native {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Date(DateTime<Utc>),
    List(Vec<Native>),
    Map(Mapping),
    Record(Box<dyn Record>),
}

impl Native {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Native::Null => "null",
            Native::Bool(_) => "bool",
            Native::Number(_) => "number",
            Native::Text(_) => "string",
            Native::Date(_) => "date",
            Native::List(_) => "list",
            Native::Map(_) => "mapping",
            Native::Record(_) => "record",
        }
    }
}

impl From<Value> for Native {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Native::Null,
            Value::Bool(b) => Native::Bool(b),
            Value::Number(n) => Native::Number(n),
            Value::String(s) => Native::Text(s),
            Value::Date(d) => Native::Date(d),
            Value::List(items) => Native::List(items.into_iter().map(Native::from).collect()),
            Value::Map(map) => Native::Map(map),
        }
    }
}
