//! The engine facade.
//!
//! A [`Mapper`] owns the configuration and the type registry; every conversion borrows it immutably, so a
//! configured mapper can be shared across threads and reconfigured only when nobody is using it.

use crate::builder;
use crate::config::MapperConfig;
use crate::equality;
use crate::errors::{MapError, Outcome, Report};
use crate::json;
use crate::reflect::Record;
use crate::registry::TypeRegistry;
use crate::value::Mapping;
use crate::walker;

use reflectmap_core::namespace::qualify;

/// Capture the calling crate's package name as a type namespace.
///
/// ```rust
/// let namespace = reflectmap::app_namespace!();
/// assert_eq!(namespace, "reflectmap");
/// ```
#[macro_export]
macro_rules! app_namespace {
    () => {
        $crate::clean_app_name(env!("CARGO_PKG_NAME"))
    };
}

/// A [`Mapper`] whose namespace is the calling crate's cleaned package name.
///
/// ```rust
/// let mapper = reflectmap::mapper!();
/// assert_eq!(mapper.registry().namespace(), "reflectmap");
/// ```
#[macro_export]
macro_rules! mapper {
    () => {
        $crate::Mapper::with_namespace($crate::app_namespace!())
    };
}

/// Converts records to and from mappings and JSON text.
///
/// ## Examples
/// ```rust
/// use reflectmap::{Mapper, Record};
///
/// #[derive(Debug, Default, Record)]
/// struct User {
///     user_name: String,
///     age: u32,
/// }
///
/// let mut mapper = Mapper::new();
/// mapper.register::<User>();
///
/// let json = mapper.to_json_string(&User { user_name: "ann".into(), age: 41 }).unwrap();
/// assert_eq!(json, r#"{"user_name":"ann","age":41}"#);
///
/// let user = mapper.from_json::<User>(r#"{"userName": "bob", "age": "7"}"#).unwrap().into_value();
/// assert_eq!((user.user_name.as_str(), user.age), ("bob", 7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    config: MapperConfig,
    registry: TypeRegistry,
}

impl Mapper {
    /// A mapper with no namespace: short type names stay unqualified.
    ///
    /// Use [`mapper!`] to qualify them with the calling crate's package name.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MapperConfig) -> Self {
        let registry = TypeRegistry::new(config.namespace.clone().unwrap_or_default());
        Self { config, registry }
    }

    /// A mapper whose registry namespace is `namespace`, typically [`app_namespace!`].
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self::with_config(MapperConfig::new().with_namespace(namespace))
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Register `T` so it can be created by name; returns the qualified name.
    pub fn register<T: Record + Default>(&mut self) -> String {
        self.registry.register::<T>()
    }

    pub fn register_in<T: Record + Default>(&mut self, namespace: &str) -> String {
        self.registry.register_in::<T>(namespace)
    }

    pub fn set_date_format(&mut self, format: impl Into<String>) {
        self.config.date_format = format.into();
    }

    /// Override the namespace used to qualify short type names.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.registry.set_namespace(namespace.clone());
        self.config.namespace = Some(namespace);
    }

    pub fn set_reserved_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.reserved_words = words.into_iter().map(Into::into).collect();
    }

    pub fn set_pretty(&mut self, pretty: bool) {
        self.config.pretty = pretty;
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize with raw field keys.
    pub fn to_mapping(&self, instance: &dyn Record) -> Mapping {
        self.to_mapping_with_report(instance, false).into_value()
    }

    pub fn to_mapping_with_report(&self, instance: &dyn Record, cleanup_keys: bool) -> Outcome<Mapping> {
        walker::to_mapping(instance, cleanup_keys, &self.config)
    }

    /// Serialize to JSON text.
    pub fn to_json(&self, instance: &dyn Record, cleanup_keys: bool, pretty: bool) -> Result<String, MapError> {
        self.to_json_with_report(instance, cleanup_keys, pretty)
            .map(Outcome::into_value)
    }

    /// Serialize to JSON text, keeping the issues found while walking the record.
    pub fn to_json_with_report(
        &self,
        instance: &dyn Record,
        cleanup_keys: bool,
        pretty: bool,
    ) -> Result<Outcome<String>, MapError> {
        let Outcome { value, report } = self.to_mapping_with_report(instance, cleanup_keys);
        let text = json::render_text(&value, pretty, &self.config)?;
        Ok(Outcome::new(text, report))
    }

    /// Serialize to JSON text with key cleanup and the configured pretty setting.
    pub fn to_json_string(&self, instance: &dyn Record) -> Result<String, MapError> {
        self.to_json(instance, true, self.config.pretty)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Build a registered type (or the subtype its polymorphism hook picks) from a mapping.
    pub fn from_mapping(&self, mapping: &Mapping, type_name: &str) -> Outcome<Option<Box<dyn Record>>> {
        builder::from_mapping(mapping, type_name, &self.registry, &self.config)
    }

    /// Build a `T` from a mapping. `T` itself need not be registered.
    pub fn from_mapping_as<T: Record + Default>(&self, mapping: &Mapping) -> Outcome<T> {
        let mut instance = T::default();
        let report = self.populate(&mut instance, mapping);
        Outcome::new(instance, report)
    }

    /// Update `instance` in place.
    pub fn populate(&self, instance: &mut dyn Record, mapping: &Mapping) -> Report {
        builder::populate(instance, mapping, &self.registry, &self.config)
    }

    pub fn from_json<T: Record + Default>(&self, text: &str) -> Result<Outcome<T>, MapError> {
        let mapping = json::parse_text(text)?;
        Ok(self.from_mapping_as(&mapping))
    }

    /// Build a registered type by name from JSON text.
    pub fn from_json_as(&self, text: &str, type_name: &str) -> Result<Outcome<Box<dyn Record>>, MapError> {
        let mapping = json::parse_text(text)?;
        let Outcome { value, report } = self.from_mapping(&mapping, type_name);
        match value {
            Some(record) => Ok(Outcome::new(record, report)),
            None => Err(MapError::TypeResolution(type_name.to_string())),
        }
    }

    /// Build one `T` per object of a JSON array.
    pub fn array_from_json<T: Record + Default>(&self, text: &str) -> Result<Outcome<Vec<T>>, MapError> {
        let mut report = Report::default();
        let items = json::parse_list_text(text)?
            .iter()
            .map(|mapping| {
                let outcome = self.from_mapping_as::<T>(mapping);
                report.extend(outcome.report);
                outcome.value
            })
            .collect();
        Ok(Outcome::new(items, report))
    }

    pub fn populate_from_json(&self, instance: &mut dyn Record, text: &str) -> Result<Report, MapError> {
        let mapping = json::parse_text(text)?;
        Ok(self.populate(instance, &mapping))
    }

    // ========================================================================
    // Equality and debugging
    // ========================================================================

    pub fn equal(&self, lhs: &dyn Record, rhs: &dyn Record) -> bool {
        equality::equal(lhs, rhs, &self.config)
    }

    pub fn hash_value(&self, instance: &dyn Record) -> u64 {
        equality::hash_value(instance, &self.config)
    }

    pub fn describe(&self, instance: &dyn Record) -> String {
        equality::describe(instance, &self.config)
    }

    /// Emit [`Mapper::describe`] through `tracing` at info level.
    pub fn log_object(&self, instance: &dyn Record) {
        tracing::info!(type_name = instance.type_name(), "\n{}", self.describe(instance));
    }

    /// The qualified name `instance` would be registered under.
    pub fn type_name_of(&self, instance: &dyn Record) -> String {
        qualify(self.registry.namespace(), instance.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Issue;
    use crate::{mapping, Record, Value};

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct Tag {
        label: String,
    }

    #[derive(Debug, Default, Record)]
    struct Post {
        title: String,
        views: u64,
        tags: Vec<Tag>,
    }

    fn mapper() -> Mapper {
        let mut mapper = Mapper::with_namespace("blog");
        mapper.register::<Post>();
        mapper.register::<Tag>();
        mapper
    }

    #[test]
    fn mapper_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Mapper>();
    }

    #[test]
    fn json_round_trip() {
        let mapper = mapper();
        let post = Post {
            title: "Hello".into(),
            views: 3,
            tags: vec![Tag { label: "rust".into() }],
        };
        let text = mapper.to_json_string(&post).unwrap();
        let back = mapper.from_json::<Post>(&text).unwrap();
        assert!(back.report.is_clean());
        assert!(mapper.equal(&post, &back.value));
        assert_eq!(back.value.tags, post.tags);
    }

    #[test]
    fn from_json_as_unknown_type_fails() {
        let err = mapper().from_json_as("{}", "Comment").unwrap_err();
        assert!(matches!(err, MapError::TypeResolution(ref name) if name == "Comment"));
    }

    #[test]
    fn from_json_as_qualified_name() {
        let built = mapper().from_json_as(r#"{"title": "x"}"#, "blog.Post").unwrap();
        let post = built.value.as_any().downcast_ref::<Post>().unwrap();
        assert_eq!(post.title, "x");
    }

    #[test]
    fn array_collects_reports() {
        let outcome = mapper()
            .array_from_json::<Post>(r#"[{"views": "many"}, {"views": 2}]"#)
            .unwrap();
        assert_eq!(outcome.value.len(), 2);
        assert_eq!(outcome.value[1].views, 2);
        assert!(matches!(outcome.report.at("views"), Some(Issue::Coercion(_))));
    }

    #[test]
    fn populate_keeps_untouched_fields() {
        let mapper = mapper();
        let mut post = Post {
            title: "Old".into(),
            views: 9,
            tags: Vec::new(),
        };
        mapper.populate_from_json(&mut post, r#"{"title": "New"}"#).unwrap();
        assert_eq!(post.title, "New");
        assert_eq!(post.views, 9);
    }

    #[test]
    fn namespace_override_requalifies() {
        let mut mapper = mapper();
        mapper.set_namespace("news");
        assert_eq!(mapper.type_name_of(&Tag::default()), "news.Tag");
        assert!(mapper.registry().contains("news.Post"));
        assert_eq!(mapper.config().namespace.as_deref(), Some("news"));
    }

    #[derive(Debug, Default, Record)]
    struct Reading {
        level: f64,
    }

    #[test]
    fn json_report_keeps_outbound_issues() {
        let outcome = mapper()
            .to_json_with_report(&Reading { level: f64::NAN }, true, false)
            .unwrap();
        assert_eq!(outcome.value, r#"{"level":null}"#);
        assert!(matches!(outcome.report.at("level"), Some(Issue::UnknownKind { .. })));
    }

    #[test]
    fn mapper_macro_uses_package_namespace() {
        let mut mapper = crate::mapper!();
        assert_eq!(mapper.registry().namespace(), "reflectmap");
        assert_eq!(mapper.register::<Tag>(), "reflectmap.Tag");
        assert!(Mapper::new().registry().namespace().is_empty());
    }

    #[test]
    fn raw_mapping_keeps_field_names() {
        let post = Post::default();
        assert_eq!(
            mapper().to_mapping(&post),
            mapping! { "title" => "", "views" => 0, "tags" => Value::List(Vec::new()) }
        );
    }
}
