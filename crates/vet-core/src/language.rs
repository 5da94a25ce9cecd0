//! Response language types.

use serde::{Deserialize, Serialize};

/// A language the assistant can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Es,
    En,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    /// Resolve a browser locale such as `es-AR` or `en_US`.
    ///
    /// Anything that does not start with `es` resolves to English.
    pub fn from_locale(locale: &str) -> Self {
        if locale.trim().to_lowercase().starts_with("es") {
            Self::Es
        } else {
            Self::En
        }
    }

    /// Pick the string matching this language.
    pub fn pick<'a>(&self, es: &'a str, en: &'a str) -> &'a str {
        match self {
            Self::Es => es,
            Self::En => en,
        }
    }
}

/// The language selection made in the conversation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguagePreference {
    Es,
    En,
    #[default]
    Auto,
}

impl LanguagePreference {
    /// Parse a preference string, defaulting to `Auto`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" => Self::Es,
            "en" | "english" | "inglés" => Self::En,
            _ => Self::Auto,
        }
    }

    /// The explicitly selected language, if any.
    pub fn explicit(&self) -> Option<Language> {
        match self {
            Self::Es => Some(Language::Es),
            Self::En => Some(Language::En),
            Self::Auto => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_locale() {
        assert_eq!(Language::from_locale("es-AR"), Language::Es);
        assert_eq!(Language::from_locale("ES"), Language::Es);
        assert_eq!(Language::from_locale("en-US"), Language::En);
        assert_eq!(Language::from_locale("fr-FR"), Language::En);
        assert_eq!(Language::from_locale(""), Language::En);
    }

    #[test]
    fn test_preference_from_str() {
        assert_eq!(LanguagePreference::from_str("es"), LanguagePreference::Es);
        assert_eq!(LanguagePreference::from_str("English"), LanguagePreference::En);
        assert_eq!(LanguagePreference::from_str("whatever"), LanguagePreference::Auto);
        assert_eq!(LanguagePreference::Auto.explicit(), None);
        assert_eq!(LanguagePreference::En.explicit(), Some(Language::En));
    }
}
