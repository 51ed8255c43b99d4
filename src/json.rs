//! JSON text on top of `serde_json`.
//!
//! Canonical values map onto JSON one to one, except dates: they are rendered as text with the configured
//! date format, and come back as plain strings that the coercion engine parses when a date field asks for one.

use crate::config::MapperConfig;
use crate::errors::MapError;
use crate::value::{Mapping, Value};

type Json = serde_json::Value;

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Convert parsed JSON into a canonical value.
pub fn from_json_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => Value::Number(n),
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(from_json_value).collect()),
        Json::Object(object) => Value::Map(object_to_mapping(object)),
    }
}

fn object_to_mapping(object: serde_json::Map<String, Json>) -> Mapping {
    object
        .into_iter()
        .map(|(key, value)| (key, from_json_value(value)))
        .collect()
}

/// Convert a canonical value into JSON, rendering dates with the configured format.
pub fn to_json_value(value: &Value, config: &MapperConfig) -> Result<Json, MapError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(
            config
                .format_date(d)
                .ok_or_else(|| MapError::DateFormat(config.date_format.clone()))?,
        ),
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(|item| to_json_value(item, config))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => Json::Object(mapping_to_object(map, config)?),
    })
}

fn mapping_to_object(map: &Mapping, config: &MapperConfig) -> Result<serde_json::Map<String, Json>, MapError> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), to_json_value(value, config)?)))
        .collect()
}

/// Parse JSON text whose top level is an object.
///
/// ## Examples
/// ```rust
/// use reflectmap::json::parse_text;
///
/// let mapping = parse_text(r#"{"b": 1, "a": [true, null]}"#).unwrap();
/// assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["b", "a"]);
/// assert!(parse_text("[1, 2]").is_err());
/// ```
pub fn parse_text(text: &str) -> Result<Mapping, MapError> {
    match serde_json::from_str::<Json>(text)? {
        Json::Object(object) => Ok(object_to_mapping(object)),
        other => Err(MapError::Shape {
            expected: "object",
            found: json_kind(&other),
        }),
    }
}

/// Parse JSON text whose top level is an array of objects.
///
/// Elements that are not objects are skipped with a warning.
pub fn parse_list_text(text: &str) -> Result<Vec<Mapping>, MapError> {
    let items = match serde_json::from_str::<Json>(text)? {
        Json::Array(items) => items,
        other => {
            return Err(MapError::Shape {
                expected: "array",
                found: json_kind(&other),
            });
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Json::Object(object) => out.push(object_to_mapping(object)),
            other => tracing::warn!(index, found = json_kind(&other), "skipping non-object array element"),
        }
    }
    Ok(out)
}

/// Render a mapping as JSON text.
pub fn render_text(mapping: &Mapping, pretty: bool, config: &MapperConfig) -> Result<String, MapError> {
    render_json(&Json::Object(mapping_to_object(mapping, config)?), pretty)
}

/// Render any canonical value as JSON text.
pub fn render_value(value: &Value, pretty: bool, config: &MapperConfig) -> Result<String, MapError> {
    render_json(&to_json_value(value, config)?, pretty)
}

/// Parse any JSON text into a canonical value.
pub fn parse_value(text: &str) -> Result<Value, MapError> {
    Ok(from_json_value(serde_json::from_str(text)?))
}

fn render_json(json: &Json, pretty: bool) -> Result<String, MapError> {
    let text = if pretty {
        serde_json::to_string_pretty(json)?
    } else {
        serde_json::to_string(json)?
    };
    Ok(text)
}
