//! Mapper configuration.
//!
//! Everything a conversion reads besides the object graph itself lives here. A [`MapperConfig`] is owned by a
//! [`crate::Mapper`]; changing it requires `&mut Mapper`, so reconfiguration can never race a conversion.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reflectmap_core::lang::reserved;

use crate::errors::CoercionError;

/// ISO-8601 with an explicit UTC offset, e.g. `2024-05-01T12:30:00+0000`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Conversion settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// `chrono` strftime pattern used to parse date strings and render dates as text
    pub date_format: String,
    /// Namespace used to qualify short type names; `None` leaves them unqualified
    pub namespace: Option<String>,
    /// Words that fields escape with a leading underscore (`_type`)
    pub reserved_words: Vec<String>,
    /// Pretty-print rendered JSON
    pub pretty: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            namespace: None,
            reserved_words: reserved::words().into_iter().map(String::from).collect(),
            pretty: false,
        }
    }
}

impl MapperConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date format
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Set the namespace used for short type names
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Replace the reserved-word table
    pub fn with_reserved_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable pretty-printed JSON
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Borrow the reserved words in the shape the key normalizer takes.
    pub fn reserved(&self) -> Vec<&str> {
        self.reserved_words.iter().map(String::as_str).collect()
    }

    /// Parse a date string with the configured format.
    ///
    /// Formats carrying an offset (`%z`, `%:z`) are honored and the result converted to UTC; formats without one
    /// are read as UTC wall time, and date-only formats (`%Y-%m-%d`) as UTC midnight.
    pub fn parse_date(&self, input: &str) -> Result<DateTime<Utc>, CoercionError> {
        let format = self.date_format.as_str();
        DateTime::parse_from_str(input, format)
            .map(|d| d.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(input, format).map(|n| n.and_utc()))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(input, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|n| n.and_utc())
            })
            .ok_or_else(|| CoercionError::DateParse {
                input: input.to_string(),
                format: self.date_format.clone(),
            })
    }

    /// Render a date with the configured format.
    ///
    /// Returns `None` when the format string itself is invalid.
    pub fn format_date(&self, date: &DateTime<Utc>) -> Option<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.date_format)).ok()?;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ========================================
    // Default config tests
    // ========================================

    #[test]
    fn test_default_date_format() {
        let config = MapperConfig::default();
        assert_eq!(config.date_format, "%Y-%m-%dT%H:%M:%S%z");
    }

    #[test]
    fn test_default_namespace_is_unset() {
        assert_eq!(MapperConfig::default().namespace, None);
    }

    #[test]
    fn test_default_reserved_words_include_type() {
        assert!(MapperConfig::default().reserved().contains(&"type"));
    }

    #[test]
    fn test_new_equals_default() {
        assert_eq!(MapperConfig::new(), MapperConfig::default());
    }

    // ========================================
    // Builder tests
    // ========================================

    #[test]
    fn test_with_reserved_words() {
        let config = MapperConfig::new().with_reserved_words(["class"]);
        assert_eq!(config.reserved(), vec!["class"]);
    }

    #[test]
    fn test_builder_chain() {
        let config = MapperConfig::new()
            .with_date_format("%Y-%m-%d %H:%M:%S")
            .with_namespace("shop")
            .with_pretty(true);
        assert_eq!(config.date_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(config.namespace.as_deref(), Some("shop"));
        assert!(config.pretty);
    }

    // ========================================
    // Date handling
    // ========================================

    #[test]
    fn test_parse_default_format_normalizes_to_utc() {
        let config = MapperConfig::default();
        let parsed = config.parse_date("2024-05-01T14:30:00+0200").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_without_offset_reads_utc() {
        let config = MapperConfig::new().with_date_format("%Y-%m-%d %H:%M:%S");
        let parsed = config.parse_date("2024-05-01 12:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_date_only_format_round_trips_at_midnight() {
        let config = MapperConfig::new().with_date_format("%Y-%m-%d");
        let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let text = config.format_date(&midnight).unwrap();
        assert_eq!(text, "2024-05-01");
        assert_eq!(config.parse_date(&text).unwrap(), midnight);
        assert!(config.parse_date("2024-13-01").is_err());
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let err = MapperConfig::default().parse_date("yesterday").unwrap_err();
        assert!(matches!(err, CoercionError::DateParse { ref input, .. } if input == "yesterday"));
    }

    #[test]
    fn test_format_round_trips() {
        let config = MapperConfig::default();
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let text = config.format_date(&date).unwrap();
        assert_eq!(text, "2024-05-01T12:30:00+0000");
        assert_eq!(config.parse_date(&text).unwrap(), date);
    }
}
