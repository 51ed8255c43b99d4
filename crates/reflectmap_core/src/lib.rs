//! Provide the pure, dependency-free helpers the reflectmap engine is built on.
//!
//! This crate owns the string-level half of the mapper:
//! - key normalization between idiomatic Rust field names and external document keys ([`keys`]),
//! - the reserved-word vocabulary used to unescape `_type`-style field names ([`lang::reserved`]),
//! - cleanup of host application names into type namespaces ([`namespace`]).
//!
//! ## Notes
//!
//! - **No IO**, no global state, no value model. Everything here works on `&str` so the CLI and the engine can
//!   share it without pulling in the canonical value types.

pub mod keys;
pub mod lang;
pub mod namespace;

pub use keys::{camel_to_snake, cleanup_key, normalize, sanitize_key, ILLEGAL_KEY_CHARACTERS};
pub use namespace::clean_app_name;
