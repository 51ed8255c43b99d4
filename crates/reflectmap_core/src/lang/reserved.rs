//! Reserved-word vocabulary for field-name unescaping.
//!
//! A Rust field cannot be called `type` or `match`, so records spell such fields `_type` / `_match` (the raw
//! identifier form `r#type` is reported by the derive macro without its `r#` prefix). Key normalization strips
//! the leading underscore when the remainder is one of the words listed here.
//!
//! ## Notes
//! - Lookup is **case-sensitive** (`Self` and `self` are distinct entries).
//! - The table is the default; mappers can be configured with a different set.

/// Why a word cannot be used as a plain field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedCategory {
    /// Keyword in every edition (`fn`, `match`, ...).
    Strict,
    /// Keyword added by a later edition (`async`, `dyn`, `try`, ...).
    Edition,
    /// Reserved for future use (`abstract`, `become`, ...).
    Future,
}

/// Metadata for one reserved word.
#[derive(Debug, Clone, Copy)]
pub struct ReservedInfo {
    pub word: &'static str,
    pub category: ReservedCategory,
}

const fn info(word: &'static str, category: ReservedCategory) -> ReservedInfo {
    ReservedInfo { word, category }
}

use ReservedCategory::{Edition, Future, Strict};

/// Registry of reserved words, in keyword-reference order.
pub const RESERVED: &[ReservedInfo] = &[
    info("as", Strict),
    info("break", Strict),
    info("const", Strict),
    info("continue", Strict),
    info("crate", Strict),
    info("else", Strict),
    info("enum", Strict),
    info("extern", Strict),
    info("false", Strict),
    info("fn", Strict),
    info("for", Strict),
    info("if", Strict),
    info("impl", Strict),
    info("in", Strict),
    info("let", Strict),
    info("loop", Strict),
    info("match", Strict),
    info("mod", Strict),
    info("move", Strict),
    info("mut", Strict),
    info("pub", Strict),
    info("ref", Strict),
    info("return", Strict),
    info("self", Strict),
    info("Self", Strict),
    info("static", Strict),
    info("struct", Strict),
    info("super", Strict),
    info("trait", Strict),
    info("true", Strict),
    info("type", Strict),
    info("unsafe", Strict),
    info("use", Strict),
    info("where", Strict),
    info("while", Strict),
    info("async", Edition),
    info("await", Edition),
    info("dyn", Edition),
    info("try", Edition),
    info("gen", Edition),
    info("abstract", Future),
    info("become", Future),
    info("box", Future),
    info("do", Future),
    info("final", Future),
    info("macro", Future),
    info("override", Future),
    info("priv", Future),
    info("typeof", Future),
    info("unsized", Future),
    info("virtual", Future),
    info("yield", Future),
];

/// Return every reserved spelling, in registry order.
pub fn words() -> Vec<&'static str> {
    RESERVED.iter().map(|r| r.word).collect()
}

/// Check whether `word` is reserved.
pub fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| r.word == word)
}

/// Look up the metadata for `word`.
pub fn lookup(word: &str) -> Option<&'static ReservedInfo> {
    RESERVED.iter().find(|r| r.word == word)
}
