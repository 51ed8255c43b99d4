//! Vocabulary registries used by key normalization.
//!
//! ## Examples
//! ```rust
//! use reflectmap_core::lang::reserved;
//!
//! assert!(reserved::is_reserved("type"));
//! assert!(!reserved::is_reserved("user_name"));
//! ```

pub mod reserved;
