//! Localization lookup
//!
//! Message catalogs for every supported language are embedded at compile time
//! and parsed once into a process-wide table on first use. The table is
//! read-only afterwards; there is no reload.
//!
//! Lookup order for a key: requested language, then [`DEFAULT_LANGUAGE`],
//! then the key itself. Lookup never fails.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{error, warn};

use crate::Error;

/// Storage key the frontend persists its language preference under
pub const LANGUAGE_STORAGE_KEY: &str = "recipe-vault-lang";

/// Language used when nothing else matches
pub const DEFAULT_LANGUAGE: Language = Language::En;

/// Supported UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    Sv,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Sv];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sv => "sv",
        }
    }

    /// Parse a language code, ignoring case and any region subtag (`sv-SE`)
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.trim().split('-').next().unwrap_or("");
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(primary))
    }

    /// Parse a bare language code, ignoring case; `sv-SE` is not `sv`
    pub fn from_exact_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    /// Pick the language for a request.
    ///
    /// An explicit `lang` parameter wins if it is exactly a supported code.
    /// Otherwise the first supported entry of an `Accept-Language` style
    /// list, in list order, where region subtags are ignored. Otherwise
    /// [`DEFAULT_LANGUAGE`].
    pub fn negotiate(explicit: Option<&str>, accept_language: Option<&str>) -> Self {
        if let Some(lang) = explicit.and_then(Self::from_exact_code) {
            return lang;
        }

        accept_language
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(|entry| entry.split(';').next())
            .find_map(Self::from_code)
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| Error::InvalidInput(format!("Unsupported language: {}", s)))
    }
}

/// Parsed message tables, one per language
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<Language, Value>,
}

impl Catalog {
    /// Build a catalog from raw JSON documents.
    ///
    /// A document that fails to parse is logged and treated as empty.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = (Language, &'a str)>) -> Self {
        let tables = sources
            .into_iter()
            .map(|(lang, raw)| {
                let table = serde_json::from_str(raw).unwrap_or_else(|e| {
                    error!("Failed to load translations for {}: {}", lang, e);
                    Value::Object(Default::default())
                });
                (lang, table)
            })
            .collect();

        Self { tables }
    }

    /// Catalogs compiled into the binary
    pub fn embedded() -> Self {
        Self::from_sources([
            (Language::En, include_str!("../locales/en.json")),
            (Language::Sv, include_str!("../locales/sv.json")),
        ])
    }

    /// Look up a key without fallback or interpolation
    pub fn lookup(&self, lang: Language, key: &str) -> Option<&str> {
        let table = self.tables.get(&lang)?;

        // An exact flat key wins over a dotted path
        if let Some(Value::String(s)) = table.get(key) {
            return Some(s.as_str());
        }

        key.split('.')
            .try_fold(table, |node, part| node.get(part))
            .and_then(Value::as_str)
    }

    /// Translate `key` into `lang`, filling `{name}` placeholders from `params`
    pub fn translate(&self, key: &str, lang: Language, params: &[(&str, &str)]) -> String {
        let template = self
            .lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANGUAGE, key));

        match template {
            Some(template) => interpolate(template, params),
            None => key.to_string(),
        }
    }
}

fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
}

static CATALOG: Lazy<Catalog> = Lazy::new(Catalog::embedded);

/// Translate a key with the embedded catalog
pub fn t(key: &str, lang: Language) -> String {
    CATALOG.translate(key, lang, &[])
}

/// Translate a key with the embedded catalog and placeholder values
pub fn t_with(key: &str, lang: Language, params: &[(&str, &str)]) -> String {
    CATALOG.translate(key, lang, params)
}

/// Client-side language preference
///
/// Unsupported languages are rejected and leave the preference unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguagePreference {
    current: Language,
}

impl LanguagePreference {
    pub fn new(initial: Language) -> Self {
        Self { current: initial }
    }

    /// Initial preference: a saved value if supported, else the browser's
    /// language if supported, else the default
    pub fn detect(saved: Option<&str>, browser: Option<&str>) -> Self {
        let current = saved
            .and_then(Language::from_code)
            .or_else(|| browser.and_then(Language::from_code))
            .unwrap_or(DEFAULT_LANGUAGE);
        Self { current }
    }

    pub fn current(&self) -> Language {
        self.current
    }

    /// Switch language; returns `false` and keeps the old one if unsupported
    pub fn set_language(&mut self, code: &str) -> bool {
        match Language::from_code(code) {
            Some(lang) => {
                self.current = lang;
                true
            }
            None => {
                warn!("Unsupported language: {}", code);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> Catalog {
        Catalog::from_sources([
            (
                Language::En,
                r#"{"greeting": "Hello {name}", "only.en": "English only",
                    "nested": {"deep": {"key": "Deep value"}},
                    "repeat": "{x} and {x}"}"#,
            ),
            (Language::Sv, r#"{"greeting": "Hej {name}"}"#),
        ])
    }

    #[test]
    fn test_requested_language_wins() {
        let catalog = test_catalog();
        assert_eq!(
            catalog.translate("greeting", Language::Sv, &[("name", "Ana")]),
            "Hej Ana"
        );
    }

    #[test]
    fn test_falls_back_to_default_language_then_key() {
        let catalog = test_catalog();
        assert_eq!(catalog.translate("only.en", Language::Sv, &[]), "English only");
        assert_eq!(catalog.translate("missing.key", Language::Sv, &[]), "missing.key");
        assert_eq!(catalog.translate("missing.key", Language::En, &[]), "missing.key");
    }

    #[test]
    fn test_dotted_path_resolves_nested_keys() {
        let catalog = test_catalog();
        assert_eq!(catalog.translate("nested.deep.key", Language::En, &[]), "Deep value");
        // Non-string nodes do not resolve
        assert_eq!(catalog.translate("nested.deep", Language::En, &[]), "nested.deep");
    }

    #[test]
    fn test_interpolation_replaces_every_occurrence() {
        let catalog = test_catalog();
        assert_eq!(catalog.translate("repeat", Language::En, &[("x", "1")]), "1 and 1");
        // Unknown params are left alone
        assert_eq!(catalog.translate("greeting", Language::En, &[]), "Hello {name}");
    }

    #[test]
    fn test_broken_catalog_is_treated_as_empty() {
        let catalog = Catalog::from_sources([
            (Language::En, r#"{"a": "A"}"#),
            (Language::Sv, "{not json"),
        ]);
        assert_eq!(catalog.translate("a", Language::Sv, &[]), "A");
    }

    #[test]
    fn test_embedded_catalogs() {
        assert_eq!(t("recipeNotFound", Language::En), "Recipe not found");
        assert_eq!(t("recipeNotFound", Language::Sv), "Receptet hittades inte");
        // Swedish catalog has no entry; English is used
        assert_eq!(t("unexpectedError", Language::Sv), "Unexpected error");
        assert_eq!(t("missing.key", Language::Sv), "missing.key");
        assert_eq!(
            t_with("recipes.count", Language::Sv, &[("count", "3")]),
            "3 recept"
        );
    }

    #[test]
    fn test_negotiate() {
        assert_eq!(Language::negotiate(Some("sv"), Some("en")), Language::Sv);
        assert_eq!(Language::negotiate(Some("xx"), Some("sv-SE,en;q=0.5")), Language::Sv);
        assert_eq!(Language::negotiate(None, Some("de-DE, sv;q=0.8")), Language::Sv);
        assert_eq!(Language::negotiate(None, Some("de, fr")), Language::En);
        assert_eq!(Language::negotiate(None, None), Language::En);
        assert_eq!(Language::negotiate(Some("SV"), None), Language::Sv);
    }

    #[test]
    fn test_explicit_lang_must_be_exact() {
        assert_eq!(Language::from_exact_code("sv-SE"), None);
        assert_eq!(Language::from_exact_code(" sv "), Some(Language::Sv));
        assert_eq!(Language::negotiate(Some("sv-SE"), None), Language::En);
        assert_eq!(Language::negotiate(Some("sv-SE"), Some("sv")), Language::Sv);
        assert_eq!(Language::negotiate(Some("en-GB"), Some("sv-SE")), Language::Sv);
    }

    #[test]
    fn test_language_preference_rejects_unsupported() {
        let mut pref = LanguagePreference::new(Language::Sv);
        assert!(!pref.set_language("de"));
        assert_eq!(pref.current(), Language::Sv);
        assert!(pref.set_language("en"));
        assert_eq!(pref.current(), Language::En);
    }

    #[test]
    fn test_language_preference_detect() {
        assert_eq!(LanguagePreference::detect(Some("sv"), Some("en-US")).current(), Language::Sv);
        assert_eq!(LanguagePreference::detect(Some("xx"), Some("sv-SE")).current(), Language::Sv);
        assert_eq!(LanguagePreference::detect(None, Some("fr")).current(), Language::En);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("sv".parse::<Language>().unwrap(), Language::Sv);
        assert!("de".parse::<Language>().is_err());
    }
}
