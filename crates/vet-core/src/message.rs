//! Transcript message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::Language;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Kind of attached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// Reference to a media item held by the capture layer.
///
/// The orchestrator never reads media bytes; it only forwards references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Opaque identifier understood by the collaborators (URL, blob key, path).
    pub id: String,
    /// Kind of media.
    pub kind: MediaKind,
    /// MIME type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MediaRef {
    /// Create an image reference.
    pub fn image(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MediaKind::Image,
            content_type: None,
        }
    }

    /// Create a video reference.
    pub fn video(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MediaKind::Video,
            content_type: None,
        }
    }

    /// Create an audio reference.
    pub fn audio(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: MediaKind::Audio,
            content_type: None,
        }
    }

    /// Attach a MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }
}

/// Lesion size categories offered when no scale reference is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    /// Smaller than 1 cm.
    Small,
    /// Between 1 and 3 cm.
    Medium,
    /// Larger than 3 cm.
    Large,
}

impl SizeCategory {
    pub const ALL: [SizeCategory; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Localized description forwarded to the analysis as the size hint.
    pub fn description(&self, language: Language) -> &'static str {
        match self {
            Self::Small => language.pick("pequeña (menos de 1 cm)", "small (under 1 cm)"),
            Self::Medium => language.pick("mediana (entre 1 y 3 cm)", "medium (1 to 3 cm)"),
            Self::Large => language.pick("grande (más de 3 cm)", "large (over 3 cm)"),
        }
    }
}

/// A UI action the user can trigger instead of typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuickAction {
    /// Select a consultation category from the sidebar.
    SelectTopic { topic: crate::analysis::Topic },
    /// "I don't have a size reference" escape during the skin flow.
    NoScaleReference,
    /// Quick-pick lesion size during the skin flow fallback.
    SizeCategory { size: SizeCategory },
}

/// Scripted prompt attached to an assistant message by the guided flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPrompt {
    /// Ask for the first photo of the lesion.
    RequestLesionPhoto,
    /// Ask for a second photo with a size reference next to the lesion.
    RequestScalePhoto,
    /// Ask for a size category or a free-text size description.
    RequestSizeDescription,
    /// Ask for a photo needed by a specialized analysis.
    RequestAnalysisPhoto,
}

impl FlowPrompt {
    /// Quick actions the UI should render alongside the prompt.
    pub fn actions(&self) -> Vec<QuickAction> {
        match self {
            Self::RequestScalePhoto => vec![QuickAction::NoScaleReference],
            Self::RequestSizeDescription => SizeCategory::ALL
                .iter()
                .map(|size| QuickAction::SizeCategory { size: *size })
                .collect(),
            Self::RequestLesionPhoto | Self::RequestAnalysisPhoto => Vec::new(),
        }
    }
}

/// A single transcript entry.
///
/// Messages are immutable once appended to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
    /// Set on assistant messages carrying a specialized analysis report.
    #[serde(default)]
    pub is_analysis_result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_prompt: Option<FlowPrompt>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text: Option<String>, media: Option<MediaRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            media,
            is_analysis_result: false,
            flow_prompt: None,
            created_at: Utc::now(),
        }
    }

    /// Create a user message. Empty text is stored as `None`.
    pub fn user(text: impl Into<String>, media: Option<MediaRef>) -> Self {
        let text = text.into();
        let text = if text.trim().is_empty() { None } else { Some(text) };
        Self::new(Role::User, text, media)
    }

    /// Create a plain assistant reply.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Some(text.into()), None)
    }

    /// Create an assistant message carrying an analysis report for `media`.
    pub fn analysis_result(text: impl Into<String>, media: Option<MediaRef>) -> Self {
        let mut message = Self::new(Role::Assistant, Some(text.into()), media);
        message.is_analysis_result = true;
        message
    }

    /// Create a scripted flow prompt.
    pub fn flow_prompt(text: impl Into<String>, prompt: FlowPrompt) -> Self {
        let mut message = Self::new(Role::Assistant, Some(text.into()), None);
        message.flow_prompt = Some(prompt);
        message
    }

    /// Text content, or an empty string.
    pub fn content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Whether this is an analysis result that carries the analysed image.
    pub fn is_image_analysis_result(&self) -> bool {
        self.is_assistant()
            && self.is_analysis_result
            && self.media.as_ref().map(MediaRef::is_image).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_empty_text_is_none() {
        let msg = Message::user("   ", Some(MediaRef::image("img-1")));
        assert!(msg.text.is_none());
        assert_eq!(msg.content(), "");
        assert!(msg.is_user());
    }

    #[test]
    fn test_analysis_result_with_image() {
        let msg = Message::analysis_result("report", Some(MediaRef::image("img-1")));
        assert!(msg.is_image_analysis_result());

        let msg = Message::analysis_result("report", None);
        assert!(!msg.is_image_analysis_result());

        let msg = Message::assistant("hello");
        assert!(!msg.is_image_analysis_result());
    }

    #[test]
    fn test_scale_prompt_offers_escape_action() {
        let actions = FlowPrompt::RequestScalePhoto.actions();
        assert_eq!(actions, vec![QuickAction::NoScaleReference]);
        assert_eq!(FlowPrompt::RequestSizeDescription.actions().len(), 3);
        assert!(FlowPrompt::RequestLesionPhoto.actions().is_empty());
    }

    #[test]
    fn test_quick_action_serde() {
        let json = r#"{"type": "size_category", "size": "medium"}"#;
        let action: QuickAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            QuickAction::SizeCategory {
                size: SizeCategory::Medium
            }
        );

        let json = r#"{"type": "select_topic", "topic": "skin"}"#;
        let action: QuickAction = serde_json::from_str(json).unwrap();
        assert!(matches!(action, QuickAction::SelectTopic { .. }));
    }

    #[test]
    fn test_size_category_descriptions() {
        assert!(SizeCategory::Small.description(Language::En).contains("1 cm"));
        assert!(SizeCategory::Large.description(Language::Es).contains("grande"));
    }
}
