//! Type registry: qualified type name → constructor.
//!
//! There is no global type lookup in Rust, so every record type that the builder may have to create from
//! scratch (nested records without a default instance, list elements, polymorphic subtypes) is registered
//! explicitly, normally once at startup through [`crate::Mapper::register`].
//!
//! ## Examples
//! ```rust
//! use reflectmap::registry::TypeRegistry;
//! use reflectmap::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Order {
//!     id: i64,
//! }
//!
//! let mut registry = TypeRegistry::new("shop");
//! assert_eq!(registry.register::<Order>(), "shop.Order");
//! assert!(registry.resolve("Order").is_some());
//! assert!(registry.resolve("shop.Order").is_some());
//! assert!(registry.resolve("Invoice").is_none());
//! ```

use indexmap::IndexMap;
use reflectmap_core::namespace::{is_qualified, qualify, short_type_name};

use crate::reflect::Record;
use crate::value::{Mapping, Value};

/// Creates a fresh, default-initialized record.
pub type Constructor = fn() -> Box<dyn Record>;

fn construct<T: Record + Default>() -> Box<dyn Record> {
    Box::new(T::default())
}

/// Registered record types, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    namespace: String,
    entries: IndexMap<String, Constructor>,
}

impl TypeRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Change the namespace. Types registered under the previous namespace move with it.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        let previous = std::mem::replace(&mut self.namespace, namespace);
        let entries = std::mem::take(&mut self.entries);
        for (name, constructor) in entries {
            let moved = if qualify(&previous, short_type_name(&name)) == name {
                qualify(&self.namespace, short_type_name(&name))
            } else {
                name
            };
            self.entries.insert(moved, constructor);
        }
    }

    /// Register `T` under the registry namespace and return its qualified name.
    pub fn register<T: Record + Default>(&mut self) -> String {
        let namespace = self.namespace.clone();
        self.register_in::<T>(&namespace)
    }

    /// Register `T` under an explicit namespace.
    pub fn register_in<T: Record + Default>(&mut self, namespace: &str) -> String {
        let name = qualify(namespace, T::default().type_name());
        self.register_constructor(name.clone(), construct::<T>);
        name
    }

    pub fn register_constructor(&mut self, qualified_name: impl Into<String>, constructor: Constructor) {
        let qualified_name = qualified_name.into();
        tracing::debug!(type_name = %qualified_name, "registering record type");
        self.entries.insert(qualified_name, constructor);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.lookup(type_name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, type_name: &str) -> Option<Constructor> {
        let qualified = if is_qualified(type_name) {
            type_name.to_string()
        } else {
            qualify(&self.namespace, type_name)
        };
        if let Some(constructor) = self.entries.get(&qualified) {
            return Some(*constructor);
        }

        // A type registered under another namespace is still found by its short name, as long as that name
        // is unambiguous.
        let short = short_type_name(type_name);
        let mut matches = self
            .entries
            .iter()
            .filter(|(name, _)| short_type_name(name) == short)
            .map(|(_, constructor)| *constructor);
        match (matches.next(), matches.next()) {
            (Some(constructor), None) => Some(constructor),
            (Some(_), Some(_)) => {
                tracing::debug!(type_name, "short type name is ambiguous");
                None
            }
            _ => None,
        }
    }

    /// Create a default instance of `type_name`.
    ///
    /// ## Notes
    /// Qualified names (`ns.Type`) are looked up as is; short names are qualified with the registry namespace.
    /// Either way, a unique match on the short name is accepted as a fallback.
    pub fn resolve(&self, type_name: &str) -> Option<Box<dyn Record>> {
        let resolved = self.lookup(type_name).map(|constructor| constructor());
        if resolved.is_none() {
            tracing::debug!(type_name, "type not registered");
        }
        resolved
    }

    /// Like [`TypeRegistry::resolve`], then let the instance's `refine_type` hook substitute a subtype.
    pub fn resolve_for(&self, type_name: &str, inbound: &Mapping) -> Option<Box<dyn Record>> {
        let instance = self.resolve(type_name)?;
        match instance.refine_type(inbound) {
            Some(refined) => {
                tracing::trace!(from = type_name, to = refined.type_name(), "refined record type");
                Some(refined)
            }
            None => Some(instance),
        }
    }
}

/// Discriminator-field dispatch over a closed set of subtypes; the usual body of a `refine_type` hook.
///
/// ## Examples
/// ```rust
/// use reflectmap::registry::SubtypeTable;
/// use reflectmap::{mapping, Record};
///
/// #[derive(Debug, Default, Record)]
/// struct Circle {
///     radius: f64,
/// }
///
/// #[derive(Debug, Default, Record)]
/// struct Square {
///     side: f64,
/// }
///
/// let table = SubtypeTable::new("shape").variant::<Circle>("circle").variant::<Square>("square");
/// let picked = table.dispatch(&mapping! { "shape" => "square", "side" => 2 }).unwrap();
/// assert_eq!(picked.type_name(), "Square");
/// assert!(table.dispatch(&mapping! { "shape" => "hexagon" }).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SubtypeTable {
    discriminator: &'static str,
    variants: Vec<(String, Constructor)>,
}

impl SubtypeTable {
    pub fn new(discriminator: &'static str) -> Self {
        Self {
            discriminator,
            variants: Vec::new(),
        }
    }

    /// Map discriminator value `tag` to `T`.
    pub fn variant<T: Record + Default>(mut self, tag: impl Into<String>) -> Self {
        self.variants.push((tag.into(), construct::<T>));
        self
    }

    pub fn discriminator(&self) -> &'static str {
        self.discriminator
    }

    /// Pick the subtype named by the discriminator field of `inbound`.
    ///
    /// String tags match verbatim; numeric tags match their decimal rendering.
    pub fn dispatch(&self, inbound: &Mapping) -> Option<Box<dyn Record>> {
        let tag = match inbound.get(self.discriminator)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        self.variants
            .iter()
            .find(|(candidate, _)| *candidate == tag)
            .map(|(_, constructor)| constructor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mapping, Record};

    #[derive(Debug, Default, Record)]
    struct Pet {
        name: String,
    }

    #[derive(Debug, Default, Record)]
    struct Cat {
        #[reflectmap(base)]
        pet: Pet,
        lives: u8,
    }

    #[derive(Debug, Default, Record)]
    #[reflectmap(refine = "Animal::refine")]
    struct Animal {
        kind: String,
    }

    impl Animal {
        fn refine(&self, inbound: &Mapping) -> Option<Box<dyn Record>> {
            SubtypeTable::new("kind").variant::<Cat>("cat").dispatch(inbound)
        }
    }

    #[test]
    fn empty_namespace_registers_short_names() {
        let mut registry = TypeRegistry::default();
        assert_eq!(registry.register::<Pet>(), "Pet");
        assert!(registry.resolve("Pet").is_some());
    }

    #[test]
    fn short_name_fallback_crosses_namespaces() {
        let mut registry = TypeRegistry::new("app");
        registry.register_in::<Pet>("vendor");
        assert_eq!(registry.resolve("Pet").map(|r| r.type_name()), Some("Pet"));
        assert!(registry.contains("vendor.Pet"));
    }

    #[test]
    fn ambiguous_short_name_fails() {
        let mut registry = TypeRegistry::new("app");
        registry.register_in::<Pet>("a");
        registry.register_in::<Pet>("b");
        assert!(registry.resolve("Pet").is_none());
        assert!(registry.resolve("a.Pet").is_some());
    }

    #[test]
    fn namespace_change_moves_entries() {
        let mut registry = TypeRegistry::new("old");
        registry.register::<Pet>();
        registry.register_in::<Cat>("other");
        registry.set_namespace("new");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["new.Pet", "other.Cat"]);
    }

    #[test]
    fn resolve_for_applies_refine_hook() {
        let mut registry = TypeRegistry::new("zoo");
        registry.register::<Animal>();
        let refined = registry.resolve_for("Animal", &mapping! { "kind" => "cat" }).unwrap();
        assert_eq!(refined.type_name(), "Cat");
        let plain = registry.resolve_for("Animal", &mapping! { "kind" => "cow" }).unwrap();
        assert_eq!(plain.type_name(), "Animal");
    }

    #[test]
    fn numeric_tags_dispatch() {
        let table = SubtypeTable::new("t").variant::<Cat>("2");
        assert!(table.dispatch(&mapping! { "t" => 2 }).is_some());
        assert!(table.dispatch(&mapping! { "t" => true }).is_none());
        assert!(table.dispatch(&mapping! {}).is_none());
    }
}
