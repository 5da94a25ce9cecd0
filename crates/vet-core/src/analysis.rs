//! Specialized analysis types and the analysis service contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::language::Language;
use crate::message::MediaRef;

/// Consultation category currently being discussed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Obesity,
    Eye,
    Dysplasia,
    Skin,
    Cardio,
    Other,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Obesity => "obesity",
            Self::Eye => "eye",
            Self::Dysplasia => "dysplasia",
            Self::Skin => "skin",
            Self::Cardio => "cardio",
            Self::Other => "other",
        }
    }

    /// The specialized analysis backing this topic, if any.
    pub fn analysis_kind(&self) -> Option<AnalysisKind> {
        match self {
            Self::Skin => Some(AnalysisKind::Skin),
            Self::Eye => Some(AnalysisKind::Ocular),
            Self::Obesity => Some(AnalysisKind::Body),
            Self::Dysplasia => Some(AnalysisKind::Dysplasia),
            Self::Cardio | Self::Other => None,
        }
    }
}

/// One of the four specialized image analyses.
///
/// `Dysplasia` is the posture/gait analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Skin,
    Ocular,
    Body,
    Dysplasia,
}

impl AnalysisKind {
    /// Router priority order, highest first.
    pub const PRIORITY: [AnalysisKind; 4] = [Self::Skin, Self::Ocular, Self::Body, Self::Dysplasia];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skin => "skin",
            Self::Ocular => "ocular",
            Self::Body => "body",
            Self::Dysplasia => "dysplasia",
        }
    }

    /// The topic a routed analysis selects.
    pub fn topic(&self) -> Topic {
        match self {
            Self::Skin => Topic::Skin,
            Self::Ocular => Topic::Eye,
            Self::Body => Topic::Obesity,
            Self::Dysplasia => Topic::Dysplasia,
        }
    }

    /// Localized report title.
    pub fn title(&self, language: Language) -> &'static str {
        match self {
            Self::Skin => language.pick("Análisis de piel", "Skin analysis"),
            Self::Ocular => language.pick("Análisis ocular", "Eye analysis"),
            Self::Body => language.pick("Condición corporal", "Body condition analysis"),
            Self::Dysplasia => language.pick("Análisis de postura", "Posture analysis"),
        }
    }
}

/// A request to the specialized image-analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    /// Images to analyse. The skin flow forwards the lesion photo first and
    /// the scale-reference photo second.
    pub images: Vec<MediaRef>,
    /// The user's text for the turn, possibly empty.
    pub text: String,
    pub language: Language,
    /// Free-text lesion size standing in for a scale photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<String>,
}

impl AnalysisRequest {
    pub fn new(kind: AnalysisKind, images: Vec<MediaRef>, text: impl Into<String>, language: Language) -> Self {
        Self {
            kind,
            images,
            text: text.into(),
            language,
            size_hint: None,
        }
    }

    pub fn with_size_hint(mut self, size_hint: impl Into<String>) -> Self {
        self.size_hint = Some(size_hint.into());
        self
    }
}

/// The specialized image-analysis service.
///
/// Returns the raw structured result (JSON text). Interpreting it is the
/// caller's job, so a malformed result never surfaces as an error here.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, BackendError>;

    /// Get a human-readable name for this service.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_kind_round_trip() {
        for kind in AnalysisKind::PRIORITY {
            assert_eq!(kind.topic().analysis_kind(), Some(kind));
        }
        assert_eq!(Topic::Cardio.analysis_kind(), None);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(AnalysisKind::PRIORITY[0], AnalysisKind::Skin);
        assert_eq!(AnalysisKind::PRIORITY[3], AnalysisKind::Dysplasia);
    }
}
