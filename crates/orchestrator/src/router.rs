//! Keyword routing to a specialized analysis.
//!
//! The router looks at the current turn plus recent history (analysis
//! reports excluded) and tests keyword sets in priority order:
//! skin, ocular, body condition, posture. Keywords match at a word start, so
//! "cataracts" matches `cataract` while "rojo" does not match `ojo`.

use serde::{Deserialize, Serialize};
use tracing::{info, trace};
use vet_core::{AnalysisKind, Message};

use crate::signals::PhraseMatcher;

const SKIN_KEYWORDS: &[&str] = &[
    "skin", "piel", "lesion", "lesión", "wart", "verruga", "lump", "bulto", "rash",
    "sarpullido", "mole", "lunar", "tumor", "scab", "costra", "itch", "picaz", "picor",
    "comez", "dermat", "hair loss", "caída de pelo", "caida de pelo", "alopecia", "bump",
    "grano", "pimple", "redness", "enrojec", "hot spot", "llaga", "wound", "herida", "ulcer",
    "úlcera", "quiste", "cyst",
];

const OCULAR_KEYWORDS: &[&str] = &[
    "eye", "ojo", "cataract", "catarata", "conjuntiv", "conjunctiv", "cloudy", "nublad",
    "opaco", "opaque", "pupil", "cornea", "córnea", "eyelid", "párpado", "parpado", "lagaña",
    "legaña", "tearing", "lagrimeo", "glaucoma", "retina", "squint", "blind", "ciego",
    "ceguera",
];

const BODY_KEYWORDS: &[&str] = &[
    "weight", "weigh", "peso", "obes", "overweight", "underweight", "sobrepeso", "gord",
    "delgad", "flac", "skinny", "ribs", "costillas", "body condition", "condición corporal",
    "condicion corporal", "belly", "barriga", "panza",
];

const DYSPLASIA_KEYWORDS: &[&str] = &[
    "dysplasia", "displasia", "hip", "cadera", "posture", "postura", "limping", "limps",
    "limped", "cojea", "cojera", "renguea", "gait", "joint", "articulac", "knee", "rodilla",
    "back leg", "hind leg", "pata trasera", "patas traseras", "stiff", "rigidez",
];

/// Generic descriptions of the pet (age, sex, breed) that accompany a photo.
const PET_DESCRIPTORS: &[&str] = &[
    "years", "year old", "months", "años", "meses", "male", "female", "macho", "hembra",
    "breed", "raza", "puppy", "cachorro", "dog", "perro", "perra", "cat", "gato", "gata",
    "yorkshire", "labrador", "poodle", "caniche", "bulldog", "chihuahua", "golden", "beagle",
    "schnauzer", "mestizo", "mixed",
];

/// Why the router chose a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "keyword", rename_all = "snake_case")]
pub enum RouteReason {
    Keyword(String),
    PetDescriptorDefault,
    NoMatch,
}

/// The router's verdict for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub kind: Option<AnalysisKind>,
    pub reason: RouteReason,
}

/// Keyword router for the specialized analyses.
///
/// Stateless; build once and share.
pub struct Router {
    skin: PhraseMatcher,
    ocular: PhraseMatcher,
    body: PhraseMatcher,
    dysplasia: PhraseMatcher,
    descriptors: PhraseMatcher,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            skin: PhraseMatcher::word_prefixes(SKIN_KEYWORDS),
            ocular: PhraseMatcher::word_prefixes(OCULAR_KEYWORDS),
            body: PhraseMatcher::word_prefixes(BODY_KEYWORDS),
            dysplasia: PhraseMatcher::word_prefixes(DYSPLASIA_KEYWORDS),
            descriptors: PhraseMatcher::whole_words(PET_DESCRIPTORS),
        }
    }

    fn keywords(&self, kind: AnalysisKind) -> &PhraseMatcher {
        match kind {
            AnalysisKind::Skin => &self.skin,
            AnalysisKind::Ocular => &self.ocular,
            AnalysisKind::Body => &self.body,
            AnalysisKind::Dysplasia => &self.dysplasia,
        }
    }

    /// Route a turn.
    ///
    /// `recent_history` should not contain the turn itself.
    pub fn route(&self, text: &str, has_media: bool, recent_history: &[Message]) -> RouteDecision {
        let context = Self::format_router_context(text, recent_history);

        trace!(
            text = %text,
            has_media,
            history_len = recent_history.len(),
            context = %context,
            "ROUTER_INPUT"
        );

        let decision = self.route_context(&context, has_media);

        info!(
            kind = decision.kind.map(|k| k.as_str()).unwrap_or("none"),
            reason = ?decision.reason,
            "ROUTE_DECISION"
        );

        decision
    }

    fn route_context(&self, context: &str, has_media: bool) -> RouteDecision {
        for kind in AnalysisKind::PRIORITY {
            if let Some(keyword) = self.keywords(kind).first_match(context) {
                return RouteDecision {
                    kind: Some(kind),
                    reason: RouteReason::Keyword(keyword.to_string()),
                };
            }
        }

        if has_media && self.descriptors.is_match(context) {
            return RouteDecision {
                kind: Some(AnalysisKind::Skin),
                reason: RouteReason::PetDescriptorDefault,
            };
        }

        RouteDecision {
            kind: None,
            reason: RouteReason::NoMatch,
        }
    }

    /// Build the lowercased keyword context: recent non-analysis messages
    /// followed by the current turn.
    pub fn format_router_context(text: &str, recent_history: &[Message]) -> String {
        let mut parts: Vec<&str> = recent_history
            .iter()
            .filter(|m| !m.is_analysis_result)
            .map(Message::content)
            .filter(|content| !content.is_empty())
            .collect();

        if !text.trim().is_empty() {
            parts.push(text);
        }

        parts.join("\n").to_lowercase()
    }
}
