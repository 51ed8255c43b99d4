//! Error taxonomy and conversion reports.
//!
//! Conversions are best-effort: a field that cannot be read or written never aborts the rest of the object
//! graph. Instead, every failure becomes a [`ConversionIssue`] in the [`Report`] returned next to the
//! (partial) result, and is logged through `tracing` at the point it happens.
//!
//! Only failures that leave the caller with nothing at all (unparseable text, wrong top-level shape) are
//! returned as [`MapError`].

use miette::Diagnostic;
use thiserror::Error;

/// A single value could not be converted to or from its native field type.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CoercionError {
    #[error("cannot parse '{input}' as a number")]
    #[diagnostic(code(reflectmap::coerce::numeric_parse))]
    NumericParse { input: String },

    #[error("'{input}' does not match date format '{format}'")]
    #[diagnostic(code(reflectmap::coerce::date_parse))]
    DateParse { input: String, format: String },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(reflectmap::coerce::type_mismatch))]
    TypeMismatch { expected: String, found: &'static str },

    #[error("{value} is out of range for {target}")]
    #[diagnostic(code(reflectmap::coerce::out_of_range))]
    OutOfRange { value: String, target: &'static str },

    #[error("no field named '{0}'")]
    #[diagnostic(code(reflectmap::reflect::unknown_field))]
    UnknownField(String),
}

/// A non-fatal problem found while walking or building an object graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum Issue {
    #[error("cannot resolve type '{type_name}'")]
    #[diagnostic(code(reflectmap::registry::unresolved), help("register the type with `Mapper::register`"))]
    TypeResolution { type_name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Coercion(#[from] CoercionError),

    #[error("no canonical form for a value of kind '{kind}'")]
    #[diagnostic(code(reflectmap::coerce::unknown_kind))]
    UnknownKind { kind: String },

    #[error("list of optional records has no `convert_array` hook")]
    #[diagnostic(
        code(reflectmap::walker::missing_array_hook),
        help("add `#[reflectmap(convert_array = \"...\")]` to the owning record")
    )]
    MissingArrayHook,
}

/// An [`Issue`] together with the field path it was found at (`address.city`, `items[2]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionIssue {
    pub path: String,
    pub issue: Issue,
}

/// Issues collected during one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    issues: Vec<ConversionIssue>,
}

impl Report {
    /// Record an issue and log it.
    pub fn push(&mut self, path: &str, issue: impl Into<Issue>) {
        let issue = issue.into();
        tracing::warn!(path, %issue, "conversion issue");
        self.issues.push(ConversionIssue {
            path: path.to_string(),
            issue,
        });
    }

    /// Whether the conversion finished without any issue.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ConversionIssue] {
        &self.issues
    }

    /// Find the first issue recorded for `path`.
    pub fn at(&self, path: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.path == path).map(|i| &i.issue)
    }

    pub fn extend(&mut self, other: Report) {
        self.issues.extend(other.issues);
    }
}

/// A best-effort conversion result plus everything that went wrong producing it.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub report: Report,
}

impl<T> Outcome<T> {
    pub fn new(value: T, report: Report) -> Self {
        Self { value, report }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            report: self.report,
        }
    }
}

/// Failures that leave a conversion with no result at all.
#[derive(Debug, Error, Diagnostic)]
pub enum MapError {
    #[error("invalid JSON: {0}")]
    #[diagnostic(code(reflectmap::json::syntax))]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON {expected} at the top level, found {found}")]
    #[diagnostic(code(reflectmap::json::shape))]
    Shape { expected: &'static str, found: &'static str },

    #[error("cannot resolve type '{0}'")]
    #[diagnostic(code(reflectmap::registry::unresolved))]
    TypeResolution(String),

    #[error("cannot render date with format '{0}'")]
    #[diagnostic(code(reflectmap::json::date_format))]
    DateFormat(String),
}

/// Join a parent path and a field name.
pub(crate) fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}
