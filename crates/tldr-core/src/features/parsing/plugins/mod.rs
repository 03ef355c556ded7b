//! One plugin per language (C1/C2): grammar-backed plugins implement a
//! `SyntaxProfile`, Luau gets a dedicated structural extractor, and
//! everything else without a wired-up grammar shares the regex fallback.

pub mod go;
pub mod java;
pub mod javascript;
pub mod kotlin;
pub mod lua;
pub mod luau;
pub mod python;
pub mod regex_fallback;
pub mod rust_lang;
pub mod typescript;

use crate::shared::ports::language::Language;

use super::ports::LanguageRegistry;

pub use go::GoPlugin;
pub use java::JavaPlugin;
pub use javascript::JavaScriptPlugin;
pub use kotlin::KotlinPlugin;
pub use lua::LuaPlugin;
pub use luau::LuauPlugin;
pub use python::PythonPlugin;
pub use regex_fallback::RegexFallbackPlugin;
pub use rust_lang::RustPlugin;
pub use typescript::TypeScriptPlugin;

const FALLBACK_LANGUAGES: &[Language] = &[
    Language::C,
    Language::Cpp,
    Language::CSharp,
    Language::Ruby,
    Language::Php,
    Language::Swift,
    Language::Scala,
];

/// Builds the registry with every language this crate supports: the 8
/// grammar-backed plugins, the dedicated Luau extractor, and the
/// regex-fallback extractor registered once per fallback language.
pub fn create_full_registry() -> LanguageRegistry {
    let mut registry = LanguageRegistry::new();
    registry.register(Box::new(PythonPlugin::new()));
    registry.register(Box::new(JavaScriptPlugin::new()));
    registry.register(Box::new(TypeScriptPlugin::new()));
    registry.register(Box::new(RustPlugin::new()));
    registry.register(Box::new(GoPlugin::new()));
    registry.register(Box::new(JavaPlugin::new()));
    registry.register(Box::new(KotlinPlugin::new()));
    registry.register(Box::new(LuaPlugin::new()));
    registry.register(Box::new(LuauPlugin::new()));
    for lang in FALLBACK_LANGUAGES {
        registry.register(Box::new(RegexFallbackPlugin::new(*lang)));
    }
    registry
}

/// A smaller registry for tests/tools that only care about the languages
/// with real grammars.
pub fn create_registry() -> LanguageRegistry {
    let mut registry = LanguageRegistry::new();
    registry.register(Box::new(PythonPlugin::new()));
    registry.register(Box::new(JavaScriptPlugin::new()));
    registry.register(Box::new(TypeScriptPlugin::new()));
    registry.register(Box::new(RustPlugin::new()));
    registry.register(Box::new(GoPlugin::new()));
    registry.register(Box::new(JavaPlugin::new()));
    registry.register(Box::new(KotlinPlugin::new()));
    registry.register(Box::new(LuaPlugin::new()));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_registry_covers_all_languages() {
        let registry = create_full_registry();
        assert!(registry.supports(Language::Python));
        assert!(registry.supports(Language::Luau));
        assert!(registry.supports(Language::Ruby));
        assert!(registry.supports(Language::Scala));
    }
}
