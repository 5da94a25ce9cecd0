//! Response language resolution.
//!
//! Priority, first match wins:
//! 1. explicit user preference
//! 2. lexical scoring of the turn text, when one language leads by the margin
//! 3. browser locale

use serde::{Deserialize, Serialize};
use vet_core::{Language, LanguagePreference};

/// Where a language decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageSource {
    Explicit,
    Detected,
    BrowserDefault,
}

/// The response language for one turn. Recomputed every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDecision {
    pub language: Language,
    pub source: LanguageSource,
}

/// Weighted lexical evidence for each language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageScore {
    pub spanish: u32,
    pub english: u32,
}

impl LanguageScore {
    /// The leading language, if it leads by at least `margin`.
    pub fn winner(&self, margin: u32) -> Option<Language> {
        if self.spanish >= self.english.saturating_add(margin) && self.spanish > self.english {
            Some(Language::Es)
        } else if self.english >= self.spanish.saturating_add(margin) && self.english > self.spanish {
            Some(Language::En)
        } else {
            None
        }
    }
}

const SPANISH_WORDS: &[&str] = &[
    "el", "la", "los", "las", "de", "del", "que", "y", "en", "un", "una", "es", "por", "con",
    "para", "tiene", "tengo", "mi", "su", "perro", "perra", "gato", "gata", "años", "meses",
    "ojo", "ojos", "piel", "desde", "hace", "muy", "pero", "como", "está", "esta", "le", "se",
    "lo", "al", "mascota", "pata", "días",
];

const ENGLISH_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "has", "have", "with", "of", "to", "its", "it", "this",
    "dog", "cat", "puppy", "years", "months", "eye", "eyes", "skin", "since", "ago", "on",
    "and", "for", "her", "his", "pet", "leg", "days", "what", "been",
];

const SPANISH_GREETINGS: &[&str] = &[
    "hola", "gracias", "yo", "usted", "buenas", "buenos", "saludos", "ella", "él", "nosotros",
];

const ENGLISH_GREETINGS: &[&str] = &[
    "hello", "hi", "hey", "thanks", "thank", "i", "you", "my", "he", "she", "we", "they",
];

const SPANISH_MARKS: &[char] = &['á', 'é', 'í', 'ó', 'ú', 'ñ', 'ü', '¿', '¡'];

/// Score a text for Spanish and English evidence.
///
/// Function words and domain vocabulary weigh 1, greetings and pronouns 2,
/// and each accented letter or inverted punctuation mark 3.
pub fn score_language(text: &str) -> LanguageScore {
    let lowered = text.to_lowercase();
    let mut score = LanguageScore::default();

    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if SPANISH_WORDS.contains(&token) {
            score.spanish += 1;
        }
        if ENGLISH_WORDS.contains(&token) {
            score.english += 1;
        }
        if SPANISH_GREETINGS.contains(&token) {
            score.spanish += 2;
        }
        if ENGLISH_GREETINGS.contains(&token) {
            score.english += 2;
        }
    }

    let marks = lowered.chars().filter(|c| SPANISH_MARKS.contains(c)).count() as u32;
    score.spanish += marks * 3;

    score
}

/// Decide the response language for a turn.
pub fn resolve(
    preference: LanguagePreference,
    text: &str,
    browser_locale: &str,
    margin: u32,
) -> LanguageDecision {
    if let Some(language) = preference.explicit() {
        return LanguageDecision {
            language,
            source: LanguageSource::Explicit,
        };
    }

    if !text.trim().is_empty() {
        if let Some(language) = score_language(text).winner(margin) {
            return LanguageDecision {
                language,
                source: LanguageSource::Detected,
            };
        }
    }

    LanguageDecision {
        language: Language::from_locale(browser_locale),
        source: LanguageSource::BrowserDefault,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_preference_wins() {
        let decision = resolve(
            LanguagePreference::En,
            "¡Hola! Mi perro tiene una lesión en la piel desde hace días",
            "es-ES",
            2,
        );
        assert_eq!(decision.language, Language::En);
        assert_eq!(decision.source, LanguageSource::Explicit);
    }

    #[test]
    fn test_detects_spanish() {
        let decision = resolve(
            LanguagePreference::Auto,
            "Hola, mi perro tiene una mancha en el ojo",
            "en-US",
            2,
        );
        assert_eq!(decision.language, Language::Es);
        assert_eq!(decision.source, LanguageSource::Detected);
    }

    #[test]
    fn test_detects_english() {
        let decision = resolve(
            LanguagePreference::Auto,
            "Hi, my dog has a red spot on the skin",
            "es-AR",
            2,
        );
        assert_eq!(decision.language, Language::En);
        assert_eq!(decision.source, LanguageSource::Detected);
    }

    #[test]
    fn test_ambiguous_text_falls_back_to_locale() {
        let decision = resolve(LanguagePreference::Auto, "9, Yorkshire", "es-MX", 2);
        assert_eq!(decision.language, Language::Es);
        assert_eq!(decision.source, LanguageSource::BrowserDefault);

        let decision = resolve(LanguagePreference::Auto, "", "fr-FR", 2);
        assert_eq!(decision.language, Language::En);
        assert_eq!(decision.source, LanguageSource::BrowserDefault);
    }

    #[test]
    fn test_margin_is_respected() {
        // "a" scores one point for English only.
        let score = score_language("a");
        assert_eq!(score, LanguageScore { spanish: 0, english: 1 });
        assert_eq!(score.winner(2), None);
        assert_eq!(score.winner(1), Some(Language::En));
    }

    #[test]
    fn test_diacritics_weigh_three() {
        let score = score_language("¿sí?");
        assert_eq!(score.spanish, 6);
        assert_eq!(score.english, 0);
    }

    #[test]
    fn test_deterministic() {
        let text = "my perro has años";
        assert_eq!(score_language(text), score_language(text));
    }
}
