//! Graph walker: record instance → [`Mapping`].

use reflectmap_core::keys::cleanup_key;

use crate::coerce::{to_canonical, Coerced};
use crate::config::MapperConfig;
use crate::errors::{join_path, Issue, Outcome, Report};
use crate::reflect::{self, FieldDescriptor, FieldKind, NativeRef, Record};
use crate::value::{Mapping, Value};

/// Serialize `instance` into a mapping.
///
/// ## Parameters
/// - `instance`: the record to walk.
/// - `cleanup_keys`: rewrite every key (nested records included) with
///   [`reflectmap_core::keys::cleanup_key`].
/// - `config`: supplies the reserved words used by key cleanup.
///
/// ## Returns
/// - (`Outcome<Mapping>`): the mapping plus every issue found on the way. Fields that could not be converted
///   are present with a `Null` value.
///
/// ## Notes
/// Fields are visited ancestors first. Excluded fields are skipped, custom getters win over the stored value,
/// and renamed fields are written under their custom key.
#[tracing::instrument(skip_all, fields(type_name = instance.type_name(), cleanup_keys = cleanup_keys))]
pub fn to_mapping(instance: &dyn Record, cleanup_keys: bool, config: &MapperConfig) -> Outcome<Mapping> {
    let mut walker = Walker::new(config, cleanup_keys);
    let mapping = walker.record(instance, "");
    Outcome::new(mapping, walker.report)
}

/// Walks one object graph; owns the report for the pass.
pub struct Walker<'c> {
    config: &'c MapperConfig,
    cleanup_keys: bool,
    report: Report,
}

impl<'c> Walker<'c> {
    pub fn new(config: &'c MapperConfig, cleanup_keys: bool) -> Self {
        Self {
            config,
            cleanup_keys,
            report: Report::default(),
        }
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    /// Serialize one record at `path`.
    pub fn record(&mut self, instance: &dyn Record, path: &str) -> Mapping {
        let mut out = Mapping::new();
        for descriptor in reflect::fields(instance) {
            if descriptor.excluded {
                tracing::trace!(field = descriptor.name, "skipping excluded field");
                continue;
            }
            let field_path = join_path(path, descriptor.name);
            let value = self.field(instance, &descriptor, &field_path);
            out.insert(self.key_for(&descriptor), value);
        }
        out
    }

    fn key_for(&self, descriptor: &FieldDescriptor) -> String {
        let key = descriptor.external_key();
        if self.cleanup_keys {
            cleanup_key(key, &self.config.reserved())
        } else {
            key.to_string()
        }
    }

    fn field(&mut self, instance: &dyn Record, descriptor: &FieldDescriptor, path: &str) -> Value {
        if descriptor.getter {
            if let Some(value) = reflect::custom_get(instance, descriptor.name) {
                return value;
            }
        }

        let Some(native) = reflect::get_field(instance, descriptor.name) else {
            self.report.push(
                path,
                Issue::UnknownKind {
                    kind: descriptor.kind.to_string(),
                },
            );
            return Value::Null;
        };

        if holds_optional_records(&descriptor.kind) {
            if let Some(items) = list_items(&native) {
                if let Some(converted) = reflect::convert_array(instance, descriptor.name, items) {
                    return converted;
                }
                // Reported, then passed through unconverted.
                self.report.push(path, Issue::MissingArrayHook);
                return Value::List(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| self.value(item.clone(), &format!("{path}[{i}]")))
                        .collect(),
                );
            }
        }

        self.value(native, path)
    }

    /// Convert any native value, recursing into records and lists.
    pub fn value(&mut self, native: NativeRef<'_>, path: &str) -> Value {
        match to_canonical(native, path, &mut self.report) {
            Coerced::Leaf(value, _) => value,
            Coerced::Record(record, _) => Value::Map(self.record(record, path)),
            Coerced::List(items, _) => Value::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| self.value(item, &format!("{path}[{i}]")))
                    .collect(),
            ),
        }
    }
}

/// A list whose elements are optional records.
fn holds_optional_records(kind: &FieldKind) -> bool {
    kind.element()
        .is_some_and(|element| element.is_optional() && element.is_record())
}

fn list_items<'n, 'a>(native: &'n NativeRef<'a>) -> Option<&'n [NativeRef<'a>]> {
    match native {
        NativeRef::List(items, _) => Some(items),
        NativeRef::Optional(Some(inner), _) => list_items(inner),
        _ => None,
    }
}
