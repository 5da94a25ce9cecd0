//! New-consultation vs continuation classifier.
//!
//! Indicator phrases come in two tiers. Explicit indicators ("new
//! consultation", "my other dog", a bare greeting) always start a new
//! consultation. Contextual indicators ("my dog has", a greeting followed by
//! symptoms) only count when the assistant was not waiting for answers to its
//! follow-up questions, so a factual reply is never mistaken for a new case.
//! Media sent in answer to a photo request only starts a new consultation on
//! an explicit indicator.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use vet_core::{Message, Topic};

use crate::config::Thresholds;
use crate::signals::{self, PhraseMatcher};

const EXPLICIT_INDICATORS: &[&str] = &[
    "new consultation", "new question", "another question", "another consultation",
    "different question", "unrelated question", "something else", "my other dog",
    "my other cat", "my other pet", "another dog", "another cat", "another pet",
    "different topic", "change of topic", "start over", "nueva consulta", "otra consulta",
    "otra pregunta", "nueva pregunta", "mi otro perro", "mi otra perra", "mi otro gato",
    "mi otra gata", "mi otra mascota", "otro perro", "otra mascota", "otro tema",
    "cambiando de tema", "empezar de nuevo",
];

const CONTEXTUAL_INDICATORS: &[&str] = &[
    "my dog has", "my cat has", "my puppy has", "my pet has", "my dog had", "i noticed",
    "i have a question", "i want to ask", "i'm worried", "i am worried", "mi perro tiene",
    "mi perra tiene", "mi gato tiene", "mi gata tiene", "mi cachorro tiene",
    "mi mascota tiene", "noté que", "note que", "tengo una pregunta", "quiero consultar",
    "me preocupa",
];

fn explicit_indicators() -> &'static PhraseMatcher {
    static CELL: OnceLock<PhraseMatcher> = OnceLock::new();
    CELL.get_or_init(|| PhraseMatcher::whole_words(EXPLICIT_INDICATORS))
}

fn contextual_indicators() -> &'static PhraseMatcher {
    static CELL: OnceLock<PhraseMatcher> = OnceLock::new();
    CELL.get_or_init(|| PhraseMatcher::whole_words(CONTEXTUAL_INDICATORS))
}

/// Derived from the last assistant message, recomputed every turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpContext {
    /// The last assistant message asked follow-up questions.
    pub is_follow_up: bool,
    /// The last assistant message asked for a photo.
    pub photo_requested: bool,
}

impl FollowUpContext {
    /// Inspect only the most recent assistant message.
    pub fn from_history(messages: &[Message], thresholds: &Thresholds) -> Self {
        let Some(last) = messages.iter().rev().find(|m| m.is_assistant()) else {
            return Self::default();
        };

        let text = last.content();
        Self {
            is_follow_up: signals::is_follow_up_request(text, thresholds),
            photo_requested: last.flow_prompt.is_some() || signals::is_photo_request(text),
        }
    }
}

/// The inputs the classifier looks at for one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnSignals<'a> {
    pub text: &'a str,
    pub has_media: bool,
    pub current_topic: Option<Topic>,
    /// A guided flow is waiting for input.
    pub flow_active: bool,
    /// History length including the just-appended user message.
    pub history_len: usize,
}

impl TurnSignals<'_> {
    /// Media attached while a photo was expected.
    fn answers_photo_request(&self, follow_up: &FollowUpContext) -> bool {
        self.has_media && (follow_up.photo_requested || self.flow_active)
    }
}

/// Why the classifier decided what it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "phrase", rename_all = "snake_case")]
pub enum ContinuityReason {
    ExplicitIndicator(String),
    ContextualIndicator(String),
    FreshMedia,
    RequestedPhoto,
    FollowUpAnswer,
    Continuation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuityDecision {
    pub new_consultation: bool,
    pub reason: ContinuityReason,
}

impl ContinuityDecision {
    fn new_consultation(reason: ContinuityReason) -> Self {
        Self {
            new_consultation: true,
            reason,
        }
    }

    fn continuation(reason: ContinuityReason) -> Self {
        Self {
            new_consultation: false,
            reason,
        }
    }
}

/// Classify a turn as a new consultation or a continuation.
pub fn classify(
    turn: &TurnSignals<'_>,
    follow_up: &FollowUpContext,
    thresholds: &Thresholds,
) -> ContinuityDecision {
    if let Some(phrase) = explicit_indicators().first_match(turn.text) {
        return ContinuityDecision::new_consultation(ContinuityReason::ExplicitIndicator(
            phrase.to_string(),
        ));
    }

    // "Hi, here it is" with the requested photo is not a new case.
    if turn.answers_photo_request(follow_up) {
        return ContinuityDecision::continuation(ContinuityReason::RequestedPhoto);
    }

    if signals::is_greeting(turn.text) {
        return ContinuityDecision::new_consultation(ContinuityReason::ExplicitIndicator(
            "greeting".to_string(),
        ));
    }

    if follow_up.is_follow_up {
        return ContinuityDecision::continuation(ContinuityReason::FollowUpAnswer);
    }

    if let Some(phrase) = contextual_indicators().first_match(turn.text) {
        return ContinuityDecision::new_consultation(ContinuityReason::ContextualIndicator(
            phrase.to_string(),
        ));
    }
    if signals::opens_with_greeting(turn.text) && signals::has_medical_vocabulary(turn.text) {
        return ContinuityDecision::new_consultation(ContinuityReason::ContextualIndicator(
            "greeting".to_string(),
        ));
    }

    if turn.has_media
        && turn.current_topic.is_none()
        && turn.history_len <= thresholds.fresh_media_history_limit
        && !follow_up.photo_requested
    {
        return ContinuityDecision::new_consultation(ContinuityReason::FreshMedia);
    }

    ContinuityDecision::continuation(ContinuityReason::Continuation)
}

/// Convenience wrapper over [`classify`].
pub fn is_new_consultation(
    turn: &TurnSignals<'_>,
    follow_up: &FollowUpContext,
    thresholds: &Thresholds,
) -> bool {
    classify(turn, follow_up, thresholds).new_consultation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(text: &str) -> TurnSignals<'_> {
        TurnSignals {
            text,
            has_media: false,
            current_topic: Some(Topic::Eye),
            flow_active: false,
            history_len: 6,
        }
    }

    const FOLLOW_UP: &str = "Thanks for the photo. To give a better assessment:\n\
        1. How old is your dog?\n\
        2. How long has the eye looked cloudy?\n\
        3. Is he squinting or rubbing it?";

    #[test]
    fn test_follow_up_context_uses_last_assistant_message() {
        let thresholds = Thresholds::default();
        let history = vec![
            Message::assistant(FOLLOW_UP),
            Message::user("9 years", None),
            Message::assistant("Thanks, that helps."),
            Message::user("ok", None),
        ];
        assert!(!FollowUpContext::from_history(&history, &thresholds).is_follow_up);
        assert!(FollowUpContext::from_history(&history[..2], &thresholds).is_follow_up);
        assert_eq!(FollowUpContext::from_history(&[], &thresholds), FollowUpContext::default());
    }

    #[test]
    fn test_factual_answer_to_follow_up_continues() {
        let thresholds = Thresholds::default();
        let history = vec![Message::assistant(FOLLOW_UP)];
        let follow_up = FollowUpContext::from_history(&history, &thresholds);

        let decision = classify(
            &turn("9 years, male, Yorkshire, about two weeks, yes he rubs it"),
            &follow_up,
            &thresholds,
        );
        assert!(!decision.new_consultation);
        assert_eq!(decision.reason, ContinuityReason::FollowUpAnswer);
    }

    #[test]
    fn test_contextual_indicator_suppressed_during_follow_up() {
        let thresholds = Thresholds::default();
        let follow_up = FollowUpContext {
            is_follow_up: true,
            photo_requested: false,
        };
        assert!(!is_new_consultation(
            &turn("my dog has had it for two weeks"),
            &follow_up,
            &thresholds
        ));
        assert!(is_new_consultation(
            &turn("my dog has a new lump"),
            &FollowUpContext::default(),
            &thresholds
        ));
    }

    #[test]
    fn test_explicit_indicator_always_counts() {
        let thresholds = Thresholds::default();
        let follow_up = FollowUpContext {
            is_follow_up: true,
            photo_requested: false,
        };
        let decision = classify(&turn("Otra consulta: mi otro perro cojea"), &follow_up, &thresholds);
        assert!(decision.new_consultation);
        assert_eq!(
            decision.reason,
            ContinuityReason::ExplicitIndicator("otra consulta".to_string())
        );

        assert!(is_new_consultation(&turn("Hola!"), &follow_up, &thresholds));
    }

    #[test]
    fn test_greeting_with_symptoms_is_contextual() {
        let thresholds = Thresholds::default();
        let decision = classify(
            &turn("hola, tiene una herida en la pata"),
            &FollowUpContext::default(),
            &thresholds,
        );
        assert!(decision.new_consultation);
        assert!(matches!(decision.reason, ContinuityReason::ContextualIndicator(_)));
    }

    #[test]
    fn test_fresh_media_starts_consultation() {
        let thresholds = Thresholds::default();
        let signals = TurnSignals {
            text: "",
            has_media: true,
            current_topic: None,
            flow_active: false,
            history_len: 1,
        };
        let decision = classify(&signals, &FollowUpContext::default(), &thresholds);
        assert_eq!(decision.reason, ContinuityReason::FreshMedia);

        let with_topic = TurnSignals {
            current_topic: Some(Topic::Skin),
            ..signals
        };
        assert!(!is_new_consultation(&with_topic, &FollowUpContext::default(), &thresholds));

        let long_history = TurnSignals {
            history_len: 3,
            ..signals
        };
        assert!(!is_new_consultation(&long_history, &FollowUpContext::default(), &thresholds));
    }

    #[test]
    fn test_requested_photo_is_not_fresh_media() {
        let thresholds = Thresholds::default();
        let history = vec![Message::assistant("Could you send a photo of the eye?")];
        let follow_up = FollowUpContext::from_history(&history, &thresholds);
        assert!(follow_up.photo_requested);

        let signals = TurnSignals {
            text: "",
            has_media: true,
            current_topic: None,
            flow_active: false,
            history_len: 2,
        };
        assert!(!is_new_consultation(&signals, &follow_up, &thresholds));
    }

    #[test]
    fn test_greeting_with_requested_photo_continues() {
        let thresholds = Thresholds::default();
        let awaiting_scale = TurnSignals {
            has_media: true,
            current_topic: Some(Topic::Skin),
            flow_active: true,
            ..turn("Hi, here it is")
        };
        let decision = classify(&awaiting_scale, &FollowUpContext::default(), &thresholds);
        assert!(!decision.new_consultation);
        assert_eq!(decision.reason, ContinuityReason::RequestedPhoto);

        let photo_requested = FollowUpContext {
            is_follow_up: false,
            photo_requested: true,
        };
        let with_symptoms = TurnSignals {
            has_media: true,
            ..turn("Hola, acá está la foto de la herida")
        };
        assert!(!is_new_consultation(&with_symptoms, &photo_requested, &thresholds));

        // Without media the greeting still counts.
        assert!(is_new_consultation(&turn("Hi there"), &photo_requested, &thresholds));

        // Explicit phrases still win over a requested photo.
        let explicit = TurnSignals {
            text: "otra consulta, mi otro perro",
            ..awaiting_scale
        };
        assert!(is_new_consultation(&explicit, &photo_requested, &thresholds));
    }

    #[test]
    fn test_indicator_needs_word_boundary() {
        let thresholds = Thresholds::default();
        // "otra consultas" is not the phrase "otra consulta"
        assert!(!is_new_consultation(
            &turn("revisé otras consultas previas"),
            &FollowUpContext::default(),
            &thresholds
        ));
        let media = TurnSignals {
            has_media: true,
            ..turn("")
        };
        assert!(!is_new_consultation(&media, &FollowUpContext::default(), &thresholds));
    }
}
