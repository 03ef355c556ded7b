//! Parsing feature (C1/C2): per-language fact extraction.
//!
//! ## Structure
//! - `ports/` - `LanguagePlugin` trait, `SyntaxProfile`, `LanguageRegistry`
//! - `infrastructure/` - the generic `SyntaxProfile`-driven extractor shared
//!   by every grammar-backed plugin
//! - `plugins/` - one plugin per language: grammar-backed (Python, JS, TS,
//!   Rust, Go, Java, Kotlin, Lua), a dedicated Luau extractor, and the
//!   regex-fallback extractor for languages with no wired-up grammar

pub mod infrastructure;
pub mod plugins;
pub mod ports;

pub use plugins::create_full_registry;
pub use ports::{ExtractionContext, LanguagePlugin, LanguageRegistry, SyntaxProfile};
