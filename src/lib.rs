#![forbid(unsafe_code)]
//! reflectmap: bidirectional mapping between Rust records and key-value documents.
//!
//! Records opt in with `#[derive(Record)]`, which generates the field tables the engine walks. From there a
//! [`Mapper`] serializes any record into a canonical [`Mapping`] (and JSON text), and rebuilds records from
//! one: nested records, collections, embedded base records and polymorphic subtypes included.
//!
//! ## Panic Policy
//!
//! - **Production code**: Conversions are best-effort. A field that cannot be converted is reported in the
//!   returned [`Report`] and skipped; library code never panics on input data.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! ## Examples
//! ```rust
//! use reflectmap::{Mapper, Record};
//!
//! #[derive(Debug, Default, Record)]
//! struct Address {
//!     city: String,
//! }
//!
//! #[derive(Debug, Default, Record)]
//! struct Person {
//!     name: String,
//!     address: Address,
//! }
//!
//! let mapper = Mapper::new();
//! let person = mapper
//!     .from_json::<Person>(r#"{"name": "Ann", "address": {"city": "Oslo"}}"#)
//!     .unwrap()
//!     .into_value();
//! assert_eq!(person.address.city, "Oslo");
//! ```

extern crate self as reflectmap;

pub mod builder;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod equality;
pub mod errors;
pub mod json;
pub mod mapper;
pub mod reflect;
pub mod registry;
pub mod value;
pub mod walker;

pub use config::{DEFAULT_DATE_FORMAT, MapperConfig};
pub use errors::{CoercionError, ConversionIssue, Issue, MapError, Outcome, Report};
pub use mapper::Mapper;
pub use reflect::{Field, FieldDescriptor, FieldKind, Polymorphic, PropertyMapping, Record};
pub use registry::{SubtypeTable, TypeRegistry};
pub use value::{Mapping, Number, Value};

pub use reflectmap_core::namespace::{clean_app_name, short_type_name};
pub use reflectmap_derive::{Record, RecordEnum};
