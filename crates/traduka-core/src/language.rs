//! Supported languages for the listing site

use serde::{Deserialize, Serialize};

/// Supported languages.
///
/// The site's copy is authored in Spanish; every other variant is a machine
/// translation target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    Spanish,
    English,
    French,
    German,
    Italian,
    Portuguese,
    Dutch,
    Russian,
}

impl Default for Language {
    fn default() -> Self {
        Self::Spanish
    }
}

impl Language {
    /// Language in which the site's source text is authored.
    pub const NATIVE: Language = Language::Spanish;

    /// Get the language code for this language
    pub fn code(&self) -> &'static str {
        match self {
            Self::Spanish => "es",
            Self::English => "en",
            Self::French => "fr",
            Self::German => "de",
            Self::Italian => "it",
            Self::Portuguese => "pt",
            Self::Dutch => "nl",
            Self::Russian => "ru",
        }
    }

    /// Parse a language from its code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "es" => Some(Self::Spanish),
            "en" => Some(Self::English),
            "fr" => Some(Self::French),
            "de" => Some(Self::German),
            "it" => Some(Self::Italian),
            "pt" => Some(Self::Portuguese),
            "nl" => Some(Self::Dutch),
            "ru" => Some(Self::Russian),
            _ => None,
        }
    }

    /// Get all supported languages
    pub fn all() -> Vec<Self> {
        vec![
            Self::Spanish,
            Self::English,
            Self::French,
            Self::German,
            Self::Italian,
            Self::Portuguese,
            Self::Dutch,
            Self::Russian,
        ]
    }

    /// Get the display name for this language
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Spanish => "Español",
            Self::English => "English",
            Self::French => "Français",
            Self::German => "Deutsch",
            Self::Italian => "Italiano",
            Self::Portuguese => "Português",
            Self::Dutch => "Nederlands",
            Self::Russian => "Русский",
        }
    }
}
