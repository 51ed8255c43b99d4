//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;

use reflectmap_core::keys::{camel_to_snake, cleanup_key};

use crate::config::MapperConfig;
use crate::json;
use crate::value::{Mapping, Value};

use super::{CliError, CliResult, ExitCode};

/// Maximum input file size (100 MB)
const MAX_INPUT_SIZE: u64 = 100 * 1024 * 1024;

/// Default configuration plus extra reserved words from the command line.
pub fn config_with(extra_reserved: &[String]) -> MapperConfig {
    let mut config = MapperConfig::default();
    config.reserved_words.extend(extra_reserved.iter().cloned());
    config
}

/// Read an input file to a string.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be accessed
/// - The file exceeds `MAX_INPUT_SIZE` (100 MB)
pub fn read_input(file_path: &str) -> CliResult<String> {
    let metadata =
        fs::metadata(file_path).map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", file_path, e)))?;

    if metadata.len() > MAX_INPUT_SIZE {
        return Err(CliError::failure(format!(
            "Input file '{}' is too large ({} bytes, max {} bytes)",
            file_path,
            metadata.len(),
            MAX_INPUT_SIZE
        )));
    }

    fs::read_to_string(file_path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", file_path, e)))
}

/// Rewrite every key of `value`, at every depth, in cleanup mode.
pub fn cleanup_value(value: Value, reserved: &[&str]) -> Value {
    match value {
        Value::Map(map) => Value::Map(cleanup_mapping(map, reserved)),
        Value::List(items) => Value::List(items.into_iter().map(|item| cleanup_value(item, reserved)).collect()),
        other => other,
    }
}

pub fn cleanup_mapping(map: Mapping, reserved: &[&str]) -> Mapping {
    map.into_iter()
        .map(|(key, value)| (cleanup_key(&key, reserved), cleanup_value(value, reserved)))
        .collect()
}

/// One `key -> cleaned` line per top-level key.
pub fn key_report(mapping: &Mapping, config: &MapperConfig) -> String {
    let reserved = config.reserved();
    let mut out = String::new();
    for key in mapping.keys() {
        out.push_str(&format!("{key} -> {}\n", cleanup_key(key, &reserved)));
    }
    out
}

/// Parse `text`, clean every key, and render it back.
pub fn normalize_text(text: &str, pretty: bool, config: &MapperConfig) -> CliResult<String> {
    let value = json::parse_value(text)?;
    let cleaned = cleanup_value(value, &config.reserved());
    Ok(json::render_value(&cleaned, pretty, config)?)
}

/// `reflectmap keys <file>`
pub fn list_keys(file_path: &str, config: &MapperConfig) -> CliResult<ExitCode> {
    let source = read_input(file_path)?;
    let mapping = json::parse_text(&source)?;
    tracing::debug!(file = file_path, keys = mapping.len(), "listing keys");
    print!("{}", key_report(&mapping, config));
    Ok(ExitCode::SUCCESS)
}

/// `reflectmap normalize <file> [--pretty]`
pub fn normalize_file(file_path: &str, pretty: bool, config: &MapperConfig) -> CliResult<ExitCode> {
    let source = read_input(file_path)?;
    println!("{}", normalize_text(&source, pretty, config)?);
    Ok(ExitCode::SUCCESS)
}

/// `reflectmap snake <word>...`
pub fn snake_words(words: &[String]) -> CliResult<ExitCode> {
    for word in words {
        println!("{}", camel_to_snake(word));
    }
    Ok(ExitCode::SUCCESS)
}
