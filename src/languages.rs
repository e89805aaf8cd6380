use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A translation target: display name plus language code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub code: String,
}

impl Language {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

const BUILTIN: &[(&str, &str)] = &[
    ("English", "en"),
    ("Bengali", "bn"),
    ("Hindi", "hi"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese", "pt"),
    ("Russian", "ru"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Chinese (Simplified)", "zh"),
    ("Arabic", "ar"),
    ("Dutch", "nl"),
    ("Turkish", "tr"),
    ("Polish", "pl"),
    ("Ukrainian", "uk"),
    ("Vietnamese", "vi"),
    ("Thai", "th"),
    ("Indonesian", "id"),
    ("Malay", "ms"),
    ("Swedish", "sv"),
    ("Norwegian", "no"),
    ("Danish", "da"),
    ("Finnish", "fi"),
    ("Greek", "el"),
    ("Hebrew", "he"),
    ("Romanian", "ro"),
    ("Hungarian", "hu"),
    ("Czech", "cs"),
    ("Slovak", "sk"),
    ("Croatian", "hr"),
    ("Serbian", "sr"),
    ("Bulgarian", "bg"),
    ("Slovenian", "sl"),
    ("Estonian", "et"),
    ("Latvian", "lv"),
    ("Lithuanian", "lt"),
    ("Icelandic", "is"),
    ("Maltese", "mt"),
    ("Welsh", "cy"),
    ("Irish", "ga"),
    ("Scottish Gaelic", "gd"),
    ("Manx", "gv"),
    ("Cornish", "kw"),
    ("Breton", "br"),
    ("Basque", "eu"),
    ("Catalan", "ca"),
    ("Galician", "gl"),
    ("Afrikaans", "af"),
    ("Swahili", "sw"),
    ("Zulu", "zu"),
    ("Xhosa", "xh"),
    ("Yoruba", "yo"),
    ("Igbo", "ig"),
    ("Hausa", "ha"),
    ("Somali", "so"),
    ("Amharic", "am"),
    ("Oromo", "om"),
    ("Tigrinya", "ti"),
    ("Kinyarwanda", "rw"),
    ("Kirundi", "rn"),
    ("Malagasy", "mg"),
    ("Sesotho", "st"),
    ("Setswana", "tn"),
    ("Siswati", "ss"),
    ("Tsonga", "ts"),
    ("Venda", "ve"),
    ("Ndebele", "nd"),
    ("Shona", "sn"),
    ("Chichewa", "ny"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
    ("Kannada", "kn"),
    ("Malayalam", "ml"),
    ("Gujarati", "gu"),
    ("Marathi", "mr"),
    ("Punjabi", "pa"),
    ("Urdu", "ur"),
    ("Nepali", "ne"),
    ("Sinhala", "si"),
    ("Burmese", "my"),
    ("Khmer", "km"),
    ("Lao", "lo"),
    ("Mongolian", "mn"),
    ("Tibetan", "bo"),
    ("Uyghur", "ug"),
    ("Kazakh", "kk"),
    ("Kyrgyz", "ky"),
    ("Uzbek", "uz"),
    ("Turkmen", "tk"),
    ("Tajik", "tg"),
    ("Pashto", "ps"),
    ("Dari", "prs"),
    ("Kurdish", "ku"),
    ("Persian", "fa"),
    ("Sindhi", "sd"),
    ("Balochi", "bal"),
    ("Kashmiri", "ks"),
    ("Dogri", "doi"),
    ("Konkani", "kok"),
    ("Manipuri", "mni"),
    ("Bodo", "brx"),
    ("Sanskrit", "sa"),
    ("Maithili", "mai"),
    ("Santali", "sat"),
    ("Sikkimese", "sip"),
    ("Ladakhi", "lbj"),
    ("Tulu", "tcy"),
    ("Kodava", "kfa"),
    ("Toda", "tcx"),
    ("Badaga", "bfq"),
    ("Kurumba", "kfi"),
    ("Irula", "iru"),
    ("Paniya", "pcg"),
    ("Mala Malasar", "ymr"),
    ("Mannan", "mjv"),
    ("Muthuvan", "muv"),
    ("Hill Pandaram", "pci"),
    ("Malapandaram", "mjp"),
    ("Urali", "url"),
];

/// Deduplicated list of translation targets
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::new(BUILTIN.iter().map(|(name, code)| Language::new(name, code)))
    }
}

impl LanguageCatalog {
    /// Build a catalog keeping the first entry for each code (case-insensitive)
    pub fn new(entries: impl IntoIterator<Item = Language>) -> Self {
        let mut seen = HashSet::new();
        let languages = entries
            .into_iter()
            .filter(|l| !l.code.trim().is_empty())
            .filter(|l| seen.insert(l.code.trim().to_lowercase()))
            .collect();
        Self { languages }
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Look a language up by name or code, ignoring case
    pub fn find(&self, query: &str) -> Option<&Language> {
        let query = query.trim();
        self.languages
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(query))
            .or_else(|| self.languages.iter().find(|l| l.code.eq_ignore_ascii_case(query)))
    }
}
