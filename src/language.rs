use std::collections::BTreeMap;

/// Short language codes mapped to the FLORES-200 identifiers NLLB models expect
const BUILTIN_CODES: &[(&str, &str)] = &[
    ("en", "eng_Latn"),
    ("ru", "rus_Cyrl"),
    ("he", "heb_Hebr"),
    ("de", "deu_Latn"),
    ("fr", "fra_Latn"),
    ("es", "spa_Latn"),
    ("it", "ita_Latn"),
    ("pt", "por_Latn"),
    ("uk", "ukr_Cyrl"),
    ("zh", "zho_Hans"),
    ("ja", "jpn_Jpan"),
    ("ko", "kor_Hang"),
    ("ar", "arb_Arab"),
];

/// Source code that asks for script-based detection
pub const AUTO_DETECT: &str = "auto";

/// Immutable language code table with pass-through for unknown codes.
///
/// Extra entries (from the config file) shadow the built-in ones.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    extra: BTreeMap<String, String>,
}

impl LanguageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(extra: BTreeMap<String, String>) -> Self {
        Self { extra }
    }

    /// Resolve a short code to the oracle's identifier, or return it unchanged
    pub fn resolve(&self, code: &str) -> String {
        if let Some(mapped) = self.extra.get(code) {
            return mapped.clone();
        }

        BUILTIN_CODES
            .iter()
            .find(|(short, _)| *short == code)
            .map(|(_, native)| native.to_string())
            .unwrap_or_else(|| code.to_string())
    }
}

/// Guess the source language from the script of the text.
///
/// Hebrew wins over Cyrillic, anything else is treated as English.
pub fn detect_source_language(text: &str) -> &'static str {
    if text.chars().any(is_hebrew) {
        "he"
    } else if text.chars().any(is_cyrillic) {
        "ru"
    } else {
        "en"
    }
}

fn is_hebrew(c: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&c)
}

fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}
