//! Reflection provider.
//!
//! Records describe themselves through the [`Record`] trait, normally generated by `#[derive(Record)]`. The
//! free functions in this module are the only place that knows about the embedded base chain: everything above
//! them (walker, builder, equality) sees a flat list of [`FieldDescriptor`]s and addresses fields by name.
//!
//! ## Examples
//! ```rust
//! use reflectmap::reflect::{self, FieldKind};
//! use reflectmap::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Animal {
//!     name: String,
//! }
//!
//! #[derive(Debug, Default, Record)]
//! struct Dog {
//!     #[reflectmap(base)]
//!     animal: Animal,
//!     good_boy: bool,
//! }
//!
//! let dog = Dog::default();
//! let names: Vec<_> = reflect::fields(&dog).iter().map(|d| d.name).collect();
//! assert_eq!(names, vec!["name", "good_boy"]);
//! assert_eq!(reflect::fields(&dog)[1].kind, FieldKind::Bool);
//! ```

use std::any::{type_name, Any};
use std::fmt;

use crate::config::MapperConfig;
use crate::errors::CoercionError;
use crate::value::{Mapping, Value};

pub mod field;
pub mod native;

pub use field::{record_from_native, Field, Polymorphic};
pub use native::{EnumRepr, Native, NativeRef};

/// Declared kind of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Number,
    Text,
    Date,
    /// A nested record, by short type name.
    Record(&'static str),
    /// A nested record slot that also accepts the subtypes picked by the base's `refine_type` hook.
    Polymorphic(&'static str),
    List(Box<FieldKind>),
    Optional(Box<FieldKind>),
    Enum(&'static str),
    /// A free-form mapping, copied through unchanged.
    Map,
    /// A type with no canonical form.
    Opaque(&'static str),
}

impl FieldKind {
    /// Whether values of this kind are records, looking through one optional layer.
    pub fn is_record(&self) -> bool {
        self.record_type().is_some()
    }

    /// Record type name, looking through optionals.
    pub fn record_type(&self) -> Option<&'static str> {
        match self {
            FieldKind::Record(name) | FieldKind::Polymorphic(name) => Some(name),
            FieldKind::Optional(inner) => inner.record_type(),
            _ => None,
        }
    }

    /// Strip every optional layer.
    pub fn unwrap_optional(&self) -> &FieldKind {
        match self {
            FieldKind::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Element kind of a list, looking through optionals.
    pub fn element(&self) -> Option<&FieldKind> {
        match self.unwrap_optional() {
            FieldKind::List(element) => Some(element),
            _ => None,
        }
    }

    /// Whether a slot of this kind can hold a refined subtype, looking through optionals.
    pub fn holds_subtypes(&self) -> bool {
        matches!(self.unwrap_optional(), FieldKind::Polymorphic(_))
    }

    pub fn is_list(&self) -> bool {
        self.element().is_some()
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldKind::Optional(_))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Bool => f.write_str("Bool"),
            FieldKind::Number => f.write_str("Number"),
            FieldKind::Text => f.write_str("Text"),
            FieldKind::Date => f.write_str("Date"),
            FieldKind::Record(name) => write!(f, "Record<{name}>"),
            FieldKind::Polymorphic(name) => write!(f, "Polymorphic<{name}>"),
            FieldKind::List(element) => write!(f, "List<{element}>"),
            FieldKind::Optional(inner) => write!(f, "Optional<{inner}>"),
            FieldKind::Enum(name) => write!(f, "Enum<{name}>"),
            FieldKind::Map => f.write_str("Map"),
            FieldKind::Opaque(name) => write!(f, "Opaque<{name}>"),
        }
    }
}

/// One field declared directly on a record type (base chain excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub kind: FieldKind,
    /// The record supplies a custom getter through [`Record::custom_get`].
    pub getter: bool,
    /// The record supplies a custom setter through [`Record::custom_set`].
    pub setter: bool,
}

impl FieldInfo {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            getter: false,
            setter: false,
        }
    }

    pub fn with_getter(mut self) -> Self {
        self.getter = true;
        self
    }

    pub fn with_setter(mut self) -> Self {
        self.setter = true;
        self
    }
}

/// A rename or exclusion declared by a record for one of its fields (or a base field).
///
/// `key: None` excludes the field from both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyMapping {
    pub field: &'static str,
    pub key: Option<&'static str>,
}

impl PropertyMapping {
    pub fn rename(field: &'static str, key: &'static str) -> Self {
        Self { field, key: Some(key) }
    }

    pub fn exclude(field: &'static str) -> Self {
        Self { field, key: None }
    }
}

/// A field as seen from a concrete instance: base chain flattened and property mappings applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Type that declares the field.
    pub owner: &'static str,
    /// Custom external key, if a property mapping renamed the field.
    pub key: Option<&'static str>,
    pub excluded: bool,
    pub getter: bool,
    pub setter: bool,
}

impl FieldDescriptor {
    /// The key this field is written under before any cleanup.
    pub fn external_key(&self) -> &'static str {
        self.key.unwrap_or(self.name)
    }
}

/// A reflectable record.
///
/// Implemented by `#[derive(Record)]`; the hooks with default bodies are wired up from `#[reflectmap(...)]`
/// attributes. Hand-written impls are possible but must keep [`Record::own_fields`], [`Record::get_own`] and
/// [`Record::set_own`] consistent with each other.
pub trait Record: Any {
    /// Short type name, as used in the registry and in `describe` output.
    fn type_name(&self) -> &'static str;

    /// Fields declared directly on this type, in declaration order.
    fn own_fields(&self) -> Vec<FieldInfo>;

    fn get_own(&self, name: &str) -> Option<NativeRef<'_>>;

    fn set_own(&mut self, name: &str, value: Native) -> Result<(), CoercionError>;

    /// The record held by field `name`, for in-place population.
    fn nested_mut(&mut self, _name: &str) -> Option<&mut dyn Record> {
        None
    }

    /// The embedded base record, if this type extends another.
    fn base(&self) -> Option<&dyn Record> {
        None
    }

    fn base_mut(&mut self) -> Option<&mut dyn Record> {
        None
    }

    /// Renames and exclusions for this type's fields and its bases' fields.
    fn property_mapping(&self) -> Vec<PropertyMapping> {
        Vec::new()
    }

    /// Custom getter for a field flagged with [`FieldInfo::getter`].
    fn custom_get(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Custom setter for a field flagged with [`FieldInfo::setter`]. Returns `false` if not handled.
    fn custom_set(&mut self, _name: &str, _value: &Value) -> bool {
        false
    }

    /// Polymorphism hook: inspect the inbound mapping and return the instance that should be populated instead.
    fn refine_type(&self, _inbound: &Mapping) -> Option<Box<dyn Record>> {
        None
    }

    /// Convert a list of optional records held by field `field`.
    fn convert_array(&self, _field: &str, _items: &[NativeRef<'_>]) -> Option<Value> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<'a> fmt::Debug for dyn Record + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name())
    }
}

/// The record and its bases, most-derived first.
fn chain(instance: &dyn Record) -> Vec<&dyn Record> {
    let mut levels = vec![instance];
    let mut current = instance.base();
    while let Some(record) = current {
        levels.push(record);
        current = record.base();
    }
    levels
}

fn owns(record: &dyn Record, name: &str) -> bool {
    record.own_fields().iter().any(|f| f.name == name)
}

/// The level of the chain that declares `name`, most-derived first.
fn owner_mut<'a>(instance: &'a mut dyn Record, name: &str) -> Option<&'a mut dyn Record> {
    if owns(instance, name) {
        return Some(instance);
    }
    instance.base_mut().and_then(|base| owner_mut(base, name))
}

/// Flatten the field tables of `instance` and its bases, ancestors first.
///
/// ## Notes
/// Property mappings from every level apply to fields of every level; a declaration on a more-derived type wins
/// over one on its base, and within one type the last declaration wins.
pub fn fields(instance: &dyn Record) -> Vec<FieldDescriptor> {
    let levels = chain(instance);
    let mappings: Vec<Vec<PropertyMapping>> = levels.iter().map(|r| r.property_mapping()).collect();
    let mapping_for = |name: &str| {
        mappings
            .iter()
            .find_map(|level| level.iter().rev().find(|m| m.field == name))
            .copied()
    };

    let mut out = Vec::new();
    for record in levels.iter().rev() {
        let owner = record.type_name();
        for info in record.own_fields() {
            let mapping = mapping_for(info.name);
            out.push(FieldDescriptor {
                name: info.name,
                kind: info.kind,
                owner,
                key: mapping.and_then(|m| m.key),
                excluded: mapping.is_some_and(|m| m.key.is_none()),
                getter: info.getter,
                setter: info.setter,
            });
        }
    }
    out
}

/// Read a field by name, searching the most-derived type first.
pub fn get_field<'a>(instance: &'a dyn Record, name: &str) -> Option<NativeRef<'a>> {
    chain(instance).into_iter().find_map(|record| record.get_own(name))
}

/// Assign an already-coerced native to field `name`.
pub fn set_field(instance: &mut dyn Record, name: &str, value: Native) -> Result<(), CoercionError> {
    match owner_mut(instance, name) {
        Some(owner) => owner.set_own(name, value),
        None => Err(CoercionError::UnknownField(name.to_string())),
    }
}

/// The record currently held by field `name`, if it holds one.
pub fn nested_record_mut<'a>(instance: &'a mut dyn Record, name: &str) -> Option<&'a mut dyn Record> {
    owner_mut(instance, name)?.nested_mut(name)
}

/// Run the custom getter for `name` on whichever level provides one.
pub fn custom_get(instance: &dyn Record, name: &str) -> Option<Value> {
    chain(instance).into_iter().find_map(|record| record.custom_get(name))
}

/// Run the custom setter for `name` on the level that declares the field.
pub fn custom_set(instance: &mut dyn Record, name: &str, value: &Value) -> bool {
    owner_mut(instance, name).is_some_and(|owner| owner.custom_set(name, value))
}

/// Run the array conversion hook for `field` on whichever level provides one.
pub fn convert_array(instance: &dyn Record, field: &str, items: &[NativeRef<'_>]) -> Option<Value> {
    chain(instance)
        .into_iter()
        .find_map(|record| record.convert_array(field, items))
}

/// Set a field from a canonical value: the custom setter if it accepts the value, else coerce then assign.
pub fn set_canonical(
    instance: &mut dyn Record,
    name: &str,
    value: &Value,
    kind: &FieldKind,
    config: &MapperConfig,
) -> Result<(), CoercionError> {
    if custom_set(instance, name, value) {
        return Ok(());
    }
    let native = crate::coerce::from_canonical(value, kind, config)?;
    set_field(instance, name, native)
}

/// Move a boxed record out into its concrete type.
pub fn downcast_record<T: Record>(record: Box<dyn Record>) -> Result<T, CoercionError> {
    let found = record.type_name();
    record
        .into_any()
        .downcast::<T>()
        .map(|concrete| *concrete)
        .map_err(|_| CoercionError::TypeMismatch {
            expected: type_name::<T>().to_string(),
            found,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    #[derive(Debug, Default, Record)]
    struct Entity {
        id: i64,
        #[reflectmap(rename = "created")]
        created_at: String,
    }

    #[derive(Debug, Default, Record)]
    #[reflectmap(mapping = "User::hidden")]
    struct User {
        #[reflectmap(base)]
        entity: Entity,
        user_name: String,
        password: String,
        nick: Option<String>,
    }

    impl User {
        fn hidden(&self) -> Vec<PropertyMapping> {
            vec![PropertyMapping::exclude("password"), PropertyMapping::rename("id", "userId")]
        }
    }

    #[test]
    fn ancestors_come_first() {
        let names: Vec<_> = fields(&User::default()).into_iter().map(|d| (d.owner, d.name)).collect();
        assert_eq!(
            names,
            vec![
                ("Entity", "id"),
                ("Entity", "created_at"),
                ("User", "user_name"),
                ("User", "password"),
                ("User", "nick"),
            ]
        );
    }

    #[test]
    fn derived_mapping_applies_to_base_fields() {
        let descriptors = fields(&User::default());
        assert_eq!(descriptors[0].external_key(), "userId");
        assert_eq!(descriptors[1].external_key(), "created");
        assert!(descriptors[3].excluded);
        assert!(!descriptors[2].excluded);
    }

    #[test]
    fn set_reaches_base_fields() {
        let mut user = User::default();
        set_field(&mut user, "id", Native::Number(7.into())).unwrap();
        assert_eq!(user.entity.id, 7);
        assert!(matches!(get_field(&user, "id"), Some(NativeRef::Int(7))));
    }

    #[test]
    fn unknown_field_is_an_error() {
        let mut user = User::default();
        let err = set_field(&mut user, "nope", Native::Null).unwrap_err();
        assert_eq!(err, CoercionError::UnknownField("nope".to_string()));
        assert!(get_field(&user, "nope").is_none());
    }

    #[test]
    fn set_canonical_coerces_first() {
        let mut user = User::default();
        let config = MapperConfig::default();
        set_canonical(&mut user, "id", &Value::from("42"), &FieldKind::Number, &config).unwrap();
        assert_eq!(user.entity.id, 42);
        let err = set_canonical(&mut user, "id", &Value::from("abc"), &FieldKind::Number, &config);
        assert!(err.is_err());
        assert_eq!(user.entity.id, 42);
    }

    #[test]
    fn nested_record_is_reachable_mutably() {
        #[derive(Debug, Default, Record)]
        struct Wrapper {
            inner: Entity,
        }
        let mut wrapper = Wrapper::default();
        let nested = nested_record_mut(&mut wrapper, "inner").unwrap();
        assert_eq!(nested.type_name(), "Entity");
        set_field(nested, "id", Native::Number(3.into())).unwrap();
        assert_eq!(wrapper.inner.id, 3);
    }

    #[test]
    fn downcast_mismatch_names_both_types() {
        let boxed: Box<dyn Record> = Box::new(Entity::default());
        let err = downcast_record::<User>(boxed).unwrap_err();
        assert!(matches!(err, CoercionError::TypeMismatch { found: "Entity", .. }));
    }

    #[test]
    fn kind_display_nests() {
        let kind = FieldKind::List(Box::new(FieldKind::Optional(Box::new(FieldKind::Record("User")))));
        assert_eq!(kind.to_string(), "List<Optional<Record<User>>>");
        assert_eq!(kind.element().and_then(FieldKind::record_type), Some("User"));
    }
}
