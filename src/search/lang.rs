use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages that have their own search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
    Fr,
    Ja,
    Ko,
    Zh,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::De,
        Language::Fr,
        Language::Ja,
        Language::Ko,
        Language::Zh,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
            Language::Fr => "fr",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Zh => "zh",
        }
    }

    /// Resolves a user-selected search language, falling back to English for
    /// anything without an index.
    pub fn from_code_or_default(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }

    /// Language code sent to the lore service. The lore service only knows a
    /// subset of languages; this table is kept literally.
    pub fn lore_code(self, region: Region) -> &'static str {
        match (self, region) {
            (Language::En, _) => "en",
            (Language::De, _) => "de",
            (Language::Fr, _) => "fr",
            (Language::Ja, _) => "ja",
            (Language::Zh, Region::China) => "chs",
            (Language::Zh, _) | (Language::Ko, _) => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Game service region. Only `China` changes behavior: it has its own lore
/// mirror and its own lore language code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Global,
    China,
    Korea,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_fall_back_to_english() {
        assert_eq!(Language::from_code_or_default("pt"), Language::En);
        assert_eq!(Language::from_code_or_default(""), Language::En);
        assert_eq!(Language::from_code_or_default("JA"), Language::Ja);
    }

    #[test]
    fn lore_codes_follow_region_table() {
        assert_eq!(Language::Fr.lore_code(Region::Global), "fr");
        assert_eq!(Language::Ja.lore_code(Region::China), "ja");
        assert_eq!(Language::Zh.lore_code(Region::China), "chs");
        assert_eq!(Language::Zh.lore_code(Region::Global), "en");
        assert_eq!(Language::Ko.lore_code(Region::Korea), "en");
        assert_eq!(Language::Ko.lore_code(Region::China), "en");
    }

    #[test]
    fn language_deserializes_from_json() {
        let ko: Language = serde_json::from_str(r#""ko""#).unwrap();
        assert_eq!(ko, Language::Ko);
    }
}
