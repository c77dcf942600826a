//! Locale phrase tables for human-readable differences.
//!
//! Tables are embedded JSON objects mapping a unit or relational key to a
//! template. Unit templates hold plural branches separated by `|` and a
//! `{count}` placeholder; relational templates (`ago`, `from_now`, `before`,
//! `after`) hold a `{time}` placeholder. The registry is parsed once, on
//! first use, and lives for the rest of the process.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded tables, keyed by normalized locale code.
const SOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../lang/en.json")),
    ("fr", include_str!("../lang/fr.json")),
    ("de", include_str!("../lang/de.json")),
    ("es", include_str!("../lang/es.json")),
    ("nl", include_str!("../lang/nl.json")),
    ("pt_BR", include_str!("../lang/pt_BR.json")),
    ("ru", include_str!("../lang/ru.json")),
    ("ja", include_str!("../lang/ja.json")),
];

pub const FALLBACK_LOCALE: &str = "en";

/// Plural-branch selection rule for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluralRule {
    /// One form for every count (ja, zh, ...).
    Invariant,
    /// `1` is singular, everything else plural (en, de, es, nl, ...).
    OneOther,
    /// `0` and `1` are singular (fr, pt_BR).
    ZeroOneOther,
    /// Three-way East Slavic rule (ru, uk).
    Slavic,
}

impl PluralRule {
    fn for_locale(code: &str) -> Self {
        let language = code.split('_').next().unwrap_or(code);
        match (language, code) {
            (_, "pt_BR") => PluralRule::ZeroOneOther,
            ("fr", _) => PluralRule::ZeroOneOther,
            ("ja" | "zh" | "ko" | "th" | "vi", _) => PluralRule::Invariant,
            ("ru" | "uk" | "be", _) => PluralRule::Slavic,
            _ => PluralRule::OneOther,
        }
    }

    /// Index of the plural branch to use for `count`.
    pub fn index(self, count: i64) -> usize {
        let n = count.unsigned_abs();
        match self {
            PluralRule::Invariant => 0,
            PluralRule::OneOther => usize::from(n != 1),
            PluralRule::ZeroOneOther => usize::from(n > 1),
            PluralRule::Slavic => {
                if n % 10 == 1 && n % 100 != 11 {
                    0
                } else if (2..=4).contains(&(n % 10)) && !(12..=14).contains(&(n % 100)) {
                    1
                } else {
                    2
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct Locale {
    code: String,
    rule: PluralRule,
    phrases: HashMap<String, String>,
}

impl Locale {
    fn new(code: &str, phrases: HashMap<String, String>) -> Self {
        Self {
            code: code.to_string(),
            rule: PluralRule::for_locale(code),
            phrases,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn plural_rule(&self) -> PluralRule {
        self.rule
    }

    pub fn has(&self, key: &str) -> bool {
        self.phrases.contains_key(key)
    }

    /// Pick the plural branch of `key` for `count` and substitute `{count}`.
    pub fn trans_choice(&self, key: &str, count: i64) -> Option<String> {
        let template = self.phrases.get(key)?;
        let branches: Vec<&str> = template.split('|').collect();
        let idx = self.rule.index(count).min(branches.len() - 1);
        Some(branches[idx].replace("{count}", &count.to_string()))
    }

    /// Substitute `{time}` in a relational phrase.
    pub fn trans(&self, key: &str, time: &str) -> Option<String> {
        self.phrases
            .get(key)
            .map(|template| template.replace("{time}", time))
    }
}

struct Registry {
    locales: HashMap<String, Locale>,
    fallback: Locale,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(load_registry)
}

fn load_registry() -> Registry {
    let mut locales = HashMap::new();
    for (code, source) in SOURCES {
        match serde_json::from_str::<HashMap<String, String>>(source) {
            Ok(phrases) => {
                locales.insert(code.to_string(), Locale::new(code, phrases));
            }
            Err(e) => tracing::error!(locale = code, error = %e, "skipping malformed locale table"),
        }
    }
    tracing::debug!(count = locales.len(), "loaded locale tables");
    let fallback = locales
        .remove(FALLBACK_LOCALE)
        .unwrap_or_else(|| Locale::new(FALLBACK_LOCALE, HashMap::new()));
    Registry { locales, fallback }
}

/// Normalize a locale code to `language_COUNTRY` casing
/// (`"PT-br"` → `"pt_BR"`, `"zh-hant-tw"` → `"zh_Hant_TW"`).
pub fn normalize_locale(code: &str) -> String {
    let parts: Vec<&str> = code
        .trim()
        .split(['-', '_'])
        .filter(|p| !p.is_empty())
        .collect();
    let mut out = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let normalized = if i == 0 {
            part.to_ascii_lowercase()
        } else if part.len() == 4 {
            let mut script = part.to_ascii_lowercase();
            script[..1].make_ascii_uppercase();
            script
        } else {
            part.to_ascii_uppercase()
        };
        out.push(normalized);
    }
    out.join("_")
}

/// Look up a locale table. Unknown regions fall back to the bare language.
pub fn find(code: &str) -> Option<&'static Locale> {
    let normalized = normalize_locale(code);
    let registry = registry();
    if normalized == FALLBACK_LOCALE {
        return Some(&registry.fallback);
    }
    if let Some(locale) = registry.locales.get(&normalized) {
        return Some(locale);
    }
    let language = normalized.split('_').next()?;
    if language == FALLBACK_LOCALE {
        return Some(&registry.fallback);
    }
    registry.locales.get(language)
}

/// The English table every other locale falls back to.
pub fn fallback() -> &'static Locale {
    &registry().fallback
}

/// Codes of every embedded locale.
pub fn available() -> Vec<&'static str> {
    SOURCES.iter().map(|(code, _)| *code).collect()
}
