pub mod language_plugin;

pub use language_plugin::{ExtractionContext, LanguagePlugin, LanguageRegistry, SyntaxProfile};
