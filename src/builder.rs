//! Graph builder: [`Mapping`] → record instance.
//!
//! Population is best-effort and in place. Keys the target does not know are ignored, values that cannot be
//! coerced leave their field untouched, and every such decision ends up in the returned [`Report`].

use indexmap::IndexMap;
use reflectmap_core::keys::{cleanup_key, normalize};
use reflectmap_core::namespace::short_type_name;

use crate::coerce::from_canonical;
use crate::config::MapperConfig;
use crate::errors::{join_path, CoercionError, Issue, Outcome, Report};
use crate::reflect::{self, FieldDescriptor, FieldKind, Native, Record};
use crate::registry::TypeRegistry;
use crate::value::{document_keys, Mapping, Value};

/// Document key ↔ field name, for one record and one inbound document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMapping {
    to_field: IndexMap<String, &'static str>,
    to_key: IndexMap<&'static str, String>,
}

impl KeyMapping {
    /// Match every non-excluded field against the keys of `document`.
    ///
    /// Fields are matched with [`reflectmap_core::keys::normalize`] first; a field it cannot place is then
    /// matched against the cleaned form of each document key, so `userName` fills `user_name`.
    ///
    /// ## Examples
    /// ```rust
    /// use reflectmap::builder::KeyMapping;
    /// use reflectmap::reflect;
    /// use reflectmap::{mapping, Record};
    ///
    /// #[derive(Debug, Default, Record)]
    /// struct Account {
    ///     user_name: String,
    ///     r#type: String,
    /// }
    ///
    /// let document = mapping! { "user-name" => "ann", "type" => "admin", "extra" => 1 };
    /// let keys = KeyMapping::build(&reflect::fields(&Account::default()), &document, &["type"]);
    /// assert_eq!(keys.field_for("user-name"), Some("user_name"));
    /// assert_eq!(keys.field_for("type"), Some("type"));
    /// assert_eq!(keys.field_for("extra"), None);
    /// ```
    pub fn build(descriptors: &[FieldDescriptor], document: &Mapping, reserved: &[&str]) -> Self {
        let existing = document_keys(document);
        let mut mapping = Self::default();
        for descriptor in descriptors.iter().filter(|d| !d.excluded) {
            let candidate = descriptor.external_key();
            let matched = normalize(candidate, reserved, Some(&existing)).or_else(|| {
                // Field names are already snake_case, so camelCase documents are matched by cleaning their keys.
                existing
                    .iter()
                    .find(|key| cleanup_key(key, reserved) == candidate)
                    .map(|key| (*key).to_string())
            });
            if let Some(key) = matched {
                mapping.to_field.insert(key.clone(), descriptor.name);
                mapping.to_key.insert(descriptor.name, key);
            }
        }
        mapping
    }

    pub fn field_for(&self, key: &str) -> Option<&'static str> {
        self.to_field.get(key).copied()
    }

    pub fn key_for(&self, field: &str) -> Option<&str> {
        self.to_key.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.to_field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_field.is_empty()
    }
}

/// Create an instance of `type_name` (refined by its polymorphism hook) and populate it from `mapping`.
///
/// ## Returns
/// - (`Outcome<Option<Box<dyn Record>>>`): `None` when the type cannot be resolved; the report then holds a
///   `TypeResolution` issue.
#[tracing::instrument(skip_all, fields(type_name = type_name, keys = mapping.len()))]
pub fn from_mapping(
    mapping: &Mapping,
    type_name: &str,
    registry: &TypeRegistry,
    config: &MapperConfig,
) -> Outcome<Option<Box<dyn Record>>> {
    let mut builder = Builder::new(registry, config);
    let Some(mut instance) = registry.resolve_for(type_name, mapping) else {
        builder.report.push(
            "",
            Issue::TypeResolution {
                type_name: type_name.to_string(),
            },
        );
        return Outcome::new(None, builder.report);
    };
    builder.populate(instance.as_mut(), mapping, "");
    Outcome::new(Some(instance), builder.report)
}

/// Update an existing instance in place from `mapping`.
#[tracing::instrument(skip_all, fields(type_name = instance.type_name(), keys = mapping.len()))]
pub fn populate(
    instance: &mut dyn Record,
    mapping: &Mapping,
    registry: &TypeRegistry,
    config: &MapperConfig,
) -> Report {
    let mut builder = Builder::new(registry, config);
    builder.populate(instance, mapping, "");
    builder.report
}

/// Builds one object graph; owns the report for the pass.
pub struct Builder<'r> {
    registry: &'r TypeRegistry,
    config: &'r MapperConfig,
    report: Report,
}

impl<'r> Builder<'r> {
    pub fn new(registry: &'r TypeRegistry, config: &'r MapperConfig) -> Self {
        Self {
            registry,
            config,
            report: Report::default(),
        }
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    /// Populate `instance` from `mapping`; nested issues are reported under `path`.
    pub fn populate(&mut self, instance: &mut dyn Record, mapping: &Mapping, path: &str) {
        let descriptors = reflect::fields(instance);
        let keys = KeyMapping::build(&descriptors, mapping, &self.config.reserved());

        for (key, value) in mapping {
            let Some(name) = keys.field_for(key) else {
                tracing::trace!(key = key.as_str(), "ignoring unmapped key");
                continue;
            };
            let Some(descriptor) = descriptors.iter().rev().find(|d| d.name == name) else {
                continue;
            };
            self.assign(instance, descriptor, value, &join_path(path, name));
        }
    }

    fn assign(&mut self, instance: &mut dyn Record, descriptor: &FieldDescriptor, value: &Value, path: &str) {
        if descriptor.setter && reflect::custom_set(instance, descriptor.name, value) {
            return;
        }

        let kind = &descriptor.kind;
        match value {
            Value::Null if !kind.is_optional() => {
                tracing::trace!(field = descriptor.name, "null for a required field, leaving it unchanged");
            }
            Value::Map(map) if kind.is_list() => {
                let items = match singleton_list(map) {
                    Some(items) => items.to_vec(),
                    None => vec![value.clone()],
                };
                self.assign_value(instance, descriptor, &Value::List(items), path);
            }
            _ => self.assign_value(instance, descriptor, value, path),
        }
    }

    fn assign_value(&mut self, instance: &mut dyn Record, descriptor: &FieldDescriptor, value: &Value, path: &str) {
        let kind = &descriptor.kind;
        match value {
            Value::Map(map) if kind.is_record() => self.assign_record(instance, descriptor, map, path),
            Value::List(items) if kind.element().is_some_and(FieldKind::is_record) => {
                self.assign_record_list(instance, descriptor, items, path)
            }
            _ => {
                let result = from_canonical(value, kind, self.config)
                    .and_then(|native| reflect::set_field(instance, descriptor.name, native));
                if let Err(err) = result {
                    self.report.push(path, err);
                }
            }
        }
    }

    fn assign_record(&mut self, instance: &mut dyn Record, descriptor: &FieldDescriptor, map: &Mapping, path: &str) {
        let kind = &descriptor.kind;
        let Some(type_name) = kind.record_type() else {
            return;
        };

        let mut record = match reflect::nested_record_mut(instance, descriptor.name) {
            Some(nested) => match kind.holds_subtypes().then(|| nested.refine_type(map)).flatten() {
                Some(refined) => refined,
                None => {
                    self.populate(nested, map, path);
                    return;
                }
            },
            None => match self.construct(kind, type_name, map, path) {
                Some(record) => record,
                None => return,
            },
        };

        self.populate(record.as_mut(), map, path);
        if let Err(err) = reflect::set_field(instance, descriptor.name, Native::Record(record)) {
            self.report.push(path, err);
        }
    }

    fn assign_record_list(
        &mut self,
        instance: &mut dyn Record,
        descriptor: &FieldDescriptor,
        items: &[Value],
        path: &str,
    ) {
        let Some(element) = descriptor.kind.element() else {
            return;
        };
        let Some(type_name) = element.record_type() else {
            return;
        };

        let mut natives = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{i}]");
            match item {
                Value::Map(map) => {
                    if let Some(mut record) = self.construct(element, type_name, map, &item_path) {
                        self.populate(record.as_mut(), map, &item_path);
                        natives.push(Native::Record(record));
                    }
                }
                Value::Null if element.is_optional() => natives.push(Native::Null),
                Value::Null => tracing::trace!(path = item_path.as_str(), "dropping null list element"),
                other => self.report.push(
                    &item_path,
                    CoercionError::TypeMismatch {
                        expected: element.to_string(),
                        found: other.kind_name(),
                    },
                ),
            }
        }

        if let Err(err) = reflect::set_field(instance, descriptor.name, Native::List(natives)) {
            self.report.push(path, err);
        }
    }

    /// A fresh record for a slot of `kind`. Only polymorphic slots are refined; anything else must resolve to
    /// exactly `type_name`, so one stray registration is reported here instead of failing the whole field.
    fn construct(
        &mut self,
        kind: &FieldKind,
        type_name: &str,
        map: &Mapping,
        path: &str,
    ) -> Option<Box<dyn Record>> {
        let resolved = if kind.holds_subtypes() {
            self.registry.resolve_for(type_name, map)
        } else {
            self.registry.resolve(type_name)
        };
        let Some(record) = resolved else {
            self.report.push(
                path,
                Issue::TypeResolution {
                    type_name: type_name.to_string(),
                },
            );
            return None;
        };
        if !kind.holds_subtypes() && record.type_name() != short_type_name(type_name) {
            self.report.push(
                path,
                CoercionError::TypeMismatch {
                    expected: type_name.to_string(),
                    found: record.type_name(),
                },
            );
            return None;
        }
        Some(record)
    }
}

/// `{"items": [...]}`: a mapping with a single entry holding a list.
fn singleton_list(map: &Mapping) -> Option<&[Value]> {
    match map.first() {
        Some((_, Value::List(items))) if map.len() == 1 => Some(items),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mapping, Record};

    #[derive(Debug, Default, Record)]
    struct Line {
        sku: String,
        qty: u32,
    }

    #[derive(Debug, Default, Record)]
    struct Customer {
        name: String,
    }

    #[derive(Debug, Default, Record)]
    struct Order {
        order_id: i64,
        customer: Customer,
        backup: Option<Customer>,
        lines: Vec<Line>,
        notes: Vec<String>,
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new("shop");
        registry.register::<Order>();
        registry.register::<Customer>();
        registry.register::<Line>();
        registry
    }

    #[test]
    fn builds_nested_graph() {
        let config = MapperConfig::default();
        let document = mapping! {
            "orderId" => 7,
            "customer" => mapping! { "name" => "Ann" },
            "backup" => mapping! { "name" => "Bob" },
            "lines" => vec![Value::Map(mapping! { "sku" => "A1", "qty" => "2" })],
            "unknown" => true,
        };
        let outcome = from_mapping(&document, "Order", &registry(), &config);
        assert!(outcome.report.is_clean(), "{:?}", outcome.report);
        let order = outcome.value.unwrap();
        let order = order.as_any().downcast_ref::<Order>().unwrap();
        assert_eq!(order.order_id, 7);
        assert_eq!(order.customer.name, "Ann");
        assert_eq!(order.backup.as_ref().map(|c| c.name.as_str()), Some("Bob"));
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].qty, 2);
    }

    #[test]
    fn unresolved_root_type() {
        let config = MapperConfig::default();
        let outcome = from_mapping(&mapping! {}, "Invoice", &registry(), &config);
        assert!(outcome.value.is_none());
        assert!(matches!(outcome.report.at(""), Some(Issue::TypeResolution { .. })));
    }

    #[test]
    fn unregistered_nested_type_is_reported() {
        let config = MapperConfig::default();
        let mut order = Order::default();
        let report = populate(
            &mut order,
            &mapping! { "backup" => mapping! { "name" => "Bob" } },
            &TypeRegistry::default(),
            &config,
        );
        assert!(order.backup.is_none());
        assert_eq!(
            report.at("backup"),
            Some(&Issue::TypeResolution {
                type_name: "Customer".to_string()
            })
        );
    }

    #[test]
    fn singleton_mapping_unwraps_into_list() {
        let config = MapperConfig::default();
        let mut order = Order::default();
        let document = mapping! { "notes" => mapping! { "note" => vec![Value::from("a"), Value::from("b")] } };
        populate(&mut order, &document, &registry(), &config);
        assert_eq!(order.notes, vec!["a", "b"]);
    }

    #[test]
    fn plain_mapping_wraps_into_list() {
        let config = MapperConfig::default();
        let mut order = Order::default();
        let document = mapping! { "lines" => mapping! { "sku" => "B2", "qty" => 1 } };
        populate(&mut order, &document, &registry(), &config);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].sku, "B2");
    }

    #[test]
    fn bad_leaf_leaves_field_untouched() {
        let config = MapperConfig::default();
        let mut order = Order {
            order_id: 5,
            ..Order::default()
        };
        let report = populate(&mut order, &mapping! { "order_id" => "abc" }, &registry(), &config);
        assert_eq!(order.order_id, 5);
        assert!(matches!(
            report.at("order_id"),
            Some(Issue::Coercion(CoercionError::NumericParse { .. }))
        ));
    }

    #[test]
    fn null_skips_required_and_clears_optional() {
        let config = MapperConfig::default();
        let mut order = Order {
            order_id: 5,
            backup: Some(Customer { name: "Bob".into() }),
            ..Order::default()
        };
        let report = populate(
            &mut order,
            &mapping! { "order_id" => Value::Null, "backup" => Value::Null },
            &registry(),
            &config,
        );
        assert!(report.is_clean());
        assert_eq!(order.order_id, 5);
        assert!(order.backup.is_none());
    }

    #[test]
    fn non_mapping_list_element_is_reported() {
        let config = MapperConfig::default();
        let mut order = Order::default();
        let document = mapping! { "lines" => vec![Value::from(1), Value::Map(mapping! { "sku" => "C" })] };
        let report = populate(&mut order, &document, &registry(), &config);
        assert_eq!(order.lines.len(), 1);
        assert!(report.at("lines[0]").is_some());
    }

    #[derive(Debug, Default, Record)]
    #[reflectmap(refine = "Shape::refine")]
    struct Shape {
        kind: String,
    }

    impl Shape {
        fn refine(&self, inbound: &Mapping) -> Option<Box<dyn Record>> {
            crate::registry::SubtypeTable::new("kind")
                .variant::<Circle>("circle")
                .dispatch(inbound)
        }
    }

    #[derive(Debug, Default, Record)]
    struct Circle {
        #[reflectmap(base)]
        shape: Shape,
        radius: f64,
    }

    #[derive(Debug, Default, Record)]
    struct Canvas {
        main: Shape,
        all: Vec<Shape>,
    }

    #[test]
    fn plain_slots_ignore_subtype_hooks() {
        let config = MapperConfig::default();
        let mut registry = TypeRegistry::new("draw");
        registry.register::<Shape>();
        registry.register::<Circle>();

        let mut canvas = Canvas {
            main: Shape { kind: "old".into() },
            all: Vec::new(),
        };
        let document = mapping! {
            "main" => mapping! { "kind" => "circle", "radius" => 2 },
            "all" => vec![
                Value::Map(mapping! { "kind" => "square" }),
                Value::Map(mapping! { "kind" => "circle" }),
            ],
        };
        let report = populate(&mut canvas, &document, &registry, &config);

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(canvas.main.kind, "circle");
        let kinds: Vec<_> = canvas.all.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, vec!["square", "circle"]);
    }
}
