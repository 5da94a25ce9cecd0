//! Lexical signal detectors.
//!
//! Pure pattern-matching utilities shared by the classifiers. All matching is
//! case-insensitive and boundary-aware: `hola` never matches inside another
//! token.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};

use crate::config::Thresholds;

/// A compiled list of phrases matched on word boundaries.
pub struct PhraseMatcher {
    phrases: Vec<&'static str>,
    set: RegexSet,
}

impl PhraseMatcher {
    /// Match phrases as whole words ("eye" matches "eye" but not "eyelid").
    pub fn whole_words(phrases: &[&'static str]) -> Self {
        Self::build(phrases, true)
    }

    /// Match phrases at the start of a word ("cataract" matches "cataracts",
    /// "ojo" does not match "rojo").
    pub fn word_prefixes(phrases: &[&'static str]) -> Self {
        Self::build(phrases, false)
    }

    fn build(phrases: &[&'static str], whole_word: bool) -> Self {
        let patterns: Vec<String> = phrases
            .iter()
            .map(|phrase| {
                let body = phrase
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                let tail = if whole_word { r"(?:[^\p{L}\p{N}]|$)" } else { "" };
                format!(r"(?i)(?:^|[^\p{{L}}\p{{N}}]){}{}", body, tail)
            })
            .collect();

        let set = RegexSet::new(&patterns).expect("phrase patterns are escaped literals");
        Self {
            phrases: phrases.to_vec(),
            set,
        }
    }

    /// Whether any phrase occurs in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.set.is_match(text)
    }

    /// The first phrase (in list order) occurring in `text`.
    pub fn first_match(&self, text: &str) -> Option<&'static str> {
        self.set
            .matches(text)
            .iter()
            .next()
            .map(|index| self.phrases[index])
    }

    /// Number of distinct phrases occurring in `text`.
    pub fn count_matches(&self, text: &str) -> usize {
        self.set.matches(text).iter().count()
    }
}

const MEDICAL_TERMS: &[&str] = &[
    // English
    "vomit", "vomiting", "diarrhea", "itch", "itchy", "itching", "rash", "lump", "bump",
    "wound", "limp", "limping", "cough", "coughing", "fever", "pain", "bleeding", "blood",
    "swelling", "swollen", "infection", "lesion", "wart", "tumor", "cataract", "discharge",
    "seizure", "lethargic", "not eating", "hair loss", "scratching", "redness", "pus",
    "murmur", "breathing", "sneezing", "weight loss", "eye", "eyes", "skin", "ear", "ears",
    // Spanish
    "vómito", "vomito", "vomita", "diarrea", "picazón", "picor", "comezón", "sarpullido",
    "bulto", "herida", "cojea", "cojera", "tos", "fiebre", "dolor", "sangrado", "sangre",
    "hinchazón", "hinchado", "infección", "lesión", "verruga", "tumor", "catarata",
    "secreción", "convulsión", "decaído", "no come", "caída de pelo", "se rasca",
    "enrojecimiento", "pus", "soplo", "respira", "estornuda", "ojo", "ojos", "piel", "oreja",
    "orejas",
];

const PHOTO_REQUEST_PHRASES: &[&str] = &[
    "send a photo", "send me a photo", "send a picture", "send me a picture",
    "upload a photo", "upload a picture", "share a photo", "share a picture",
    "attach a photo", "attach a picture", "photo of", "picture of", "a clear photo",
    "another photo", "envía una foto", "envíame una foto", "enviar una foto", "envia una foto",
    "sube una foto", "subir una foto", "comparte una foto", "adjunta una foto", "foto de",
    "imagen de", "otra foto", "una foto clara",
];

const GREETINGS: &[&str] = &[
    "hola", "hello", "hi", "hey", "buenas", "buenos días", "buenos dias", "buenas tardes",
    "buenas noches", "good morning", "good afternoon", "good evening", "saludos", "greetings",
];

/// Phrases an assistant uses when it needs more information.
const FOLLOW_UP_PHRASES: &[&str] = &[
    "to better understand", "to give you a better", "could you tell me", "can you tell me",
    "could you please tell me", "please provide", "please share", "i need to know",
    "i'd like to know", "i would like to know", "a few questions", "some questions",
    "more information", "more details", "answer the following", "para entender mejor",
    "para darte una mejor", "podrías decirme", "podrias decirme", "puedes decirme",
    "me podrías indicar", "me podrias indicar", "necesito saber", "me gustaría saber",
    "algunas preguntas", "unas preguntas", "más información", "mas información",
    "más detalles", "mas detalles", "responde las siguientes",
];

/// Phrases that ask for a specific fact about the pet.
const INFO_REQUEST_PHRASES: &[&str] = &[
    "how old", "what breed", "which breed", "how long", "since when", "when did",
    "age", "breed", "sex", "weight", "medication", "vaccinated", "diet", "symptoms",
    "qué edad", "que edad", "cuántos años", "cuantos años", "qué raza", "que raza",
    "cuánto tiempo", "cuanto tiempo", "desde cuándo", "desde cuando", "edad", "raza", "sexo",
    "peso", "medicamento", "medicación", "vacunado", "vacunada", "dieta", "síntomas",
];

/// Replies meaning "I have nothing to use as a size reference".
const NO_REFERENCE_PHRASES: &[&str] = &[
    "no reference", "no coin", "don't have a coin", "do not have a coin",
    "don't have a reference", "nothing to compare", "no tengo moneda", "no tengo una moneda",
    "sin referencia", "no tengo referencia", "no tengo nada para comparar", "no hay moneda",
];

fn matcher(cell: &'static OnceLock<PhraseMatcher>, phrases: &[&'static str]) -> &'static PhraseMatcher {
    cell.get_or_init(|| PhraseMatcher::whole_words(phrases))
}

fn medical_terms() -> &'static PhraseMatcher {
    static CELL: OnceLock<PhraseMatcher> = OnceLock::new();
    matcher(&CELL, MEDICAL_TERMS)
}

fn photo_requests() -> &'static PhraseMatcher {
    static CELL: OnceLock<PhraseMatcher> = OnceLock::new();
    matcher(&CELL, PHOTO_REQUEST_PHRASES)
}

fn follow_up_phrases() -> &'static PhraseMatcher {
    static CELL: OnceLock<PhraseMatcher> = OnceLock::new();
    matcher(&CELL, FOLLOW_UP_PHRASES)
}

fn info_requests() -> &'static PhraseMatcher {
    static CELL: OnceLock<PhraseMatcher> = OnceLock::new();
    matcher(&CELL, INFO_REQUEST_PHRASES)
}

fn no_reference_phrases() -> &'static PhraseMatcher {
    static CELL: OnceLock<PhraseMatcher> = OnceLock::new();
    matcher(&CELL, NO_REFERENCE_PHRASES)
}

fn list_marker() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:\d{1,2}[.)]|[-*•])\s+\S").expect("list marker pattern is valid")
    })
}

/// Whether the text mentions symptoms or body parts.
pub fn has_medical_vocabulary(text: &str) -> bool {
    medical_terms().is_match(text)
}

/// Whether an assistant message asks the user for a photo.
pub fn is_photo_request(text: &str) -> bool {
    photo_requests().is_match(text)
}

/// Whether the message opens with a greeting.
pub fn opens_with_greeting(text: &str) -> bool {
    let lowered = text
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    GREETINGS.iter().any(|greeting| {
        lowered.starts_with(greeting)
            && lowered[greeting.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Whether the message is only a greeting (at most four words, no symptoms).
pub fn is_greeting(text: &str) -> bool {
    let words = text.split_whitespace().count();
    words > 0 && words <= 4 && opens_with_greeting(text) && !has_medical_vocabulary(text)
}

/// Whether the text contains a numbered or bulleted list.
pub fn has_list(text: &str) -> bool {
    list_marker().is_match(text)
}

/// Whether the user says no size reference is available.
pub fn is_no_reference_reply(text: &str) -> bool {
    no_reference_phrases().is_match(text)
}

/// Whether an assistant message is asking the user follow-up questions.
///
/// True on explicit follow-up phrasing, or when the message contains a
/// question mark together with at least one weaker signal: a list, a length
/// above `thresholds.follow_up_min_chars`, or a request for a specific fact.
pub fn is_follow_up_request(text: &str, thresholds: &Thresholds) -> bool {
    if follow_up_phrases().is_match(text) {
        return true;
    }

    if !text.contains('?') {
        return false;
    }

    has_list(text)
        || text.chars().count() > thresholds.follow_up_min_chars
        || info_requests().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_matching() {
        let matcher = PhraseMatcher::whole_words(&["hola", "my dog has"]);
        assert!(matcher.is_match("Hola, ¿cómo estás?"));
        assert!(matcher.is_match("well... MY DOG   HAS a rash"));
        assert!(!matcher.is_match("caracholas"));
        assert!(!matcher.is_match("holanda"));
        assert_eq!(matcher.first_match("my dog has, hola"), Some("hola"));
        assert_eq!(matcher.count_matches("hola, my dog has"), 2);
    }

    #[test]
    fn test_word_prefix_matching() {
        let matcher = PhraseMatcher::word_prefixes(&["ojo", "cataract"]);
        assert!(matcher.is_match("tiene el ojo rojo"));
        assert!(!matcher.is_match("está rojo"));
        assert!(matcher.is_match("early cataracts"));
    }

    #[test]
    fn test_medical_vocabulary() {
        assert!(has_medical_vocabulary("she has a lump on her leg"));
        assert!(has_medical_vocabulary("tiene una herida en la pata"));
        assert!(!has_medical_vocabulary("9 years, male, Yorkshire"));
    }

    #[test]
    fn test_photo_request() {
        assert!(is_photo_request("Could you send a photo of the area?"));
        assert!(is_photo_request("Por favor envía una foto de la lesión"));
        assert!(!is_photo_request("The photograph looks fine"));
    }

    #[test]
    fn test_greetings() {
        assert!(is_greeting("Hola!"));
        assert!(is_greeting("good morning"));
        assert!(!is_greeting("hola, mi perro tiene una herida"));
        assert!(opens_with_greeting("hola, mi perro tiene una herida"));
        assert!(!opens_with_greeting("he said hi to the vet"));
        assert!(!is_greeting("history of vomiting"));
    }

    #[test]
    fn test_has_list() {
        assert!(has_list("Questions:\n1. How old is he?\n2. Breed?"));
        assert!(has_list("- age\n- breed"));
        assert!(!has_list("He is 9 years old."));
    }

    #[test]
    fn test_follow_up_phrase_alone_is_enough() {
        let thresholds = Thresholds::default();
        assert!(is_follow_up_request(
            "To better understand the situation, tell me about the diet.",
            &thresholds
        ));
    }

    #[test]
    fn test_question_needs_a_second_signal() {
        let thresholds = Thresholds::default();
        assert!(!is_follow_up_request("Is there anything else?", &thresholds));
        assert!(is_follow_up_request("How old is your dog?", &thresholds));
        assert!(is_follow_up_request(
            "A few things:\n1. Does it itch?\n2. Is it growing?",
            &thresholds
        ));
        assert!(!is_follow_up_request(
            "1. Keep the area clean\n2. Watch for changes",
            &thresholds
        ));
    }

    #[test]
    fn test_long_question_counts() {
        let thresholds = Thresholds {
            follow_up_min_chars: 20,
            ..Thresholds::default()
        };
        assert!(is_follow_up_request(
            "Is the redness spreading towards the belly?",
            &thresholds
        ));
    }

    #[test]
    fn test_no_reference_reply() {
        assert!(is_no_reference_reply("sorry, I don't have a coin"));
        assert!(is_no_reference_reply("No tengo moneda"));
        assert!(!is_no_reference_reply("here is the coin photo"));
    }
}
