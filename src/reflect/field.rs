//! The [`Field`] trait: how one native field type is described, read, and rebuilt.
//!
//! Implemented here for the primitive, date, collection, and optional types; `#[derive(Record)]` and
//! `#[derive(RecordEnum)]` implement it for records and enumerations.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use super::{downcast_record, FieldKind, Native, NativeRef, Record};
use crate::errors::CoercionError;
use crate::value::{Mapping, Number};

/// A native type that can live in a record field.
pub trait Field: Sized {
    /// The declared kind, used to drive coercion and record construction.
    fn kind() -> FieldKind;

    /// Borrow the value as a native view.
    fn to_native(&self) -> NativeRef<'_>;

    /// Rebuild a value from an owned native. The native has already been coerced against [`Field::kind`].
    fn from_native(value: Native) -> Result<Self, CoercionError>;

    /// The nested record held by this field, if any. Used to update sub-objects in place.
    fn record_mut(&mut self) -> Option<&mut dyn Record> {
        None
    }
}

fn mismatch(expected: impl Into<String>, found: &Native) -> CoercionError {
    CoercionError::TypeMismatch {
        expected: expected.into(),
        found: found.kind_name(),
    }
}

fn number_of(value: Native, target: &'static str) -> Result<Number, CoercionError> {
    match value {
        Native::Number(n) => Ok(n),
        other => Err(mismatch(target, &other)),
    }
}

/// Integral value of a number, accepting floats without a fractional part.
fn integral(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    let f = n.as_f64()?;
    // Outside this window `as` would saturate.
    (f.fract() == 0.0 && f.abs() < 1.8e19).then_some(f as i128)
}

macro_rules! integer_field {
    ($variant:ident, $wide:ty; $($t:ty),*) => {
        $(
            impl Field for $t {
                fn kind() -> FieldKind {
                    FieldKind::Number
                }

                fn to_native(&self) -> NativeRef<'_> {
                    NativeRef::$variant(*self as $wide)
                }

                fn from_native(value: Native) -> Result<Self, CoercionError> {
                    let n = number_of(value, stringify!($t))?;
                    integral(&n)
                        .and_then(|i| <$t>::try_from(i).ok())
                        .ok_or_else(|| CoercionError::OutOfRange {
                            value: n.to_string(),
                            target: stringify!($t),
                        })
                }
            }
        )*
    };
}

integer_field!(Int, i64; i8, i16, i32, i64, isize);
integer_field!(UInt, u64; u8, u16, u32, u64, usize);

impl Field for f64 {
    fn kind() -> FieldKind {
        FieldKind::Number
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Float(*self)
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        let n = number_of(value, "f64")?;
        n.as_f64().ok_or_else(|| CoercionError::OutOfRange {
            value: n.to_string(),
            target: "f64",
        })
    }
}

impl Field for f32 {
    fn kind() -> FieldKind {
        FieldKind::Number
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Float(f64::from(*self))
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        f64::from_native(value).map(|f| f as f32)
    }
}

impl Field for bool {
    fn kind() -> FieldKind {
        FieldKind::Bool
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Bool(*self)
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        match value {
            Native::Bool(b) => Ok(b),
            Native::Number(n) => match integral(&n) {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(CoercionError::OutOfRange {
                    value: n.to_string(),
                    target: "bool",
                }),
            },
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl Field for String {
    fn kind() -> FieldKind {
        FieldKind::Text
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Text(self)
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        match value {
            Native::Text(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl Field for DateTime<Utc> {
    fn kind() -> FieldKind {
        FieldKind::Date
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Date(*self)
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        match value {
            Native::Date(d) => Ok(d),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl Field for Mapping {
    fn kind() -> FieldKind {
        FieldKind::Map
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Map(self)
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        match value {
            Native::Map(map) => Ok(map),
            other => Err(mismatch("mapping", &other)),
        }
    }
}

impl<T: Field> Field for Option<T> {
    fn kind() -> FieldKind {
        FieldKind::Optional(Box::new(T::kind()))
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Optional(self.as_ref().map(|v| Box::new(v.to_native())), T::kind())
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        match value {
            Native::Null => Ok(None),
            other => T::from_native(other).map(Some),
        }
    }

    fn record_mut(&mut self) -> Option<&mut dyn Record> {
        self.as_mut().and_then(Field::record_mut)
    }
}

impl<T: Field> Field for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::List(Box::new(T::kind()))
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::List(self.iter().map(Field::to_native).collect(), T::kind())
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        match value {
            Native::List(items) => items.into_iter().map(T::from_native).collect(),
            other => Err(mismatch(FieldKind::List(Box::new(T::kind())).to_string(), &other)),
        }
    }
}

/// A record field that may hold any concrete record whose shape is rooted at `B`.
///
/// Declared kind is [`FieldKind::Polymorphic`], so the builder constructs `B` and lets its `refine_type` hook
/// pick the concrete subtype; whatever comes back is stored as is. Plain `B` fields never take a subtype.
pub struct Polymorphic<B> {
    inner: Box<dyn Record>,
    _base: PhantomData<fn() -> B>,
}

impl<B> Polymorphic<B> {
    pub fn new(record: impl Record) -> Self {
        Self::from_boxed(Box::new(record))
    }

    pub fn from_boxed(inner: Box<dyn Record>) -> Self {
        Self {
            inner,
            _base: PhantomData,
        }
    }

    pub fn get(&self) -> &dyn Record {
        self.inner.as_ref()
    }

    pub fn get_mut(&mut self) -> &mut dyn Record {
        self.inner.as_mut()
    }

    /// Borrow the concrete record if it is a `T`.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }
}

impl<B: Record + Default> Default for Polymorphic<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B> fmt::Debug for Polymorphic<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Polymorphic").field(&self.inner).finish()
    }
}

impl<B: Field + 'static> Field for Polymorphic<B> {
    fn kind() -> FieldKind {
        match B::kind() {
            FieldKind::Record(name) => FieldKind::Polymorphic(name),
            other => other,
        }
    }

    fn to_native(&self) -> NativeRef<'_> {
        NativeRef::Record(self.inner.as_ref())
    }

    fn from_native(value: Native) -> Result<Self, CoercionError> {
        match value {
            Native::Record(inner) => Ok(Self::from_boxed(inner)),
            other => Err(mismatch(type_name::<B>(), &other)),
        }
    }

    fn record_mut(&mut self) -> Option<&mut dyn Record> {
        Some(self.inner.as_mut())
    }
}

/// Rebuild a derived record from an owned native; shared by the `Record` derive.
pub fn record_from_native<T: Record>(value: Native) -> Result<T, CoercionError> {
    match value {
        Native::Record(record) => downcast_record(record),
        other => Err(mismatch(type_name::<T>(), &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_accept_whole_floats() {
        let n = Number::from_f64(42.0).unwrap();
        assert_eq!(i32::from_native(Native::Number(n)), Ok(42));
    }

    #[test]
    fn integers_reject_overflow() {
        let err = u8::from_native(Native::Number(Number::from(300))).unwrap_err();
        assert_eq!(
            err,
            CoercionError::OutOfRange {
                value: "300".to_string(),
                target: "u8"
            }
        );
    }

    #[test]
    fn u64_max_survives() {
        assert_eq!(u64::from_native(Native::Number(Number::from(u64::MAX))), Ok(u64::MAX));
        assert!(matches!(u64::MAX.to_native(), NativeRef::UInt(u64::MAX)));
    }

    #[test]
    fn optional_null_is_none() {
        assert_eq!(Option::<String>::from_native(Native::Null), Ok(None));
        assert_eq!(
            Option::<String>::kind(),
            FieldKind::Optional(Box::new(FieldKind::Text))
        );
    }

    #[test]
    fn empty_optional_keeps_wrapped_kind() {
        let none: Option<i32> = None;
        assert!(matches!(none.to_native(), NativeRef::Optional(None, FieldKind::Number)));
    }

    #[test]
    fn list_reports_element_mismatch() {
        let items = Native::List(vec![Native::Text("a".into()), Native::Bool(true)]);
        assert!(Vec::<String>::from_native(items).is_err());
    }

    #[derive(Debug, Default, crate::Record)]
    struct Node {
        label: String,
    }

    #[test]
    fn polymorphic_slots_are_marked() {
        assert_eq!(Node::kind(), FieldKind::Record("Node"));
        assert_eq!(Polymorphic::<Node>::kind(), FieldKind::Polymorphic("Node"));
        assert!(!Vec::<Node>::kind().element().unwrap().holds_subtypes());
        assert!(Vec::<Polymorphic<Node>>::kind().element().unwrap().holds_subtypes());
        assert!(Option::<Polymorphic<Node>>::kind().holds_subtypes());
        assert_eq!(Option::<Polymorphic<Node>>::kind().record_type(), Some("Node"));
    }

    #[test]
    fn bool_from_zero_and_one() {
        assert_eq!(bool::from_native(Native::Number(Number::from(1))), Ok(true));
        assert_eq!(bool::from_native(Native::Number(Number::from(0))), Ok(false));
        assert!(bool::from_native(Native::Number(Number::from(2))).is_err());
    }
}
