//! The conversational AI backend contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analysis::Topic;
use crate::error::BackendError;
use crate::history::HistoryEntry;
use crate::language::Language;
use crate::message::MediaRef;

/// A delegated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    /// Text sent to the backend, including any orchestrator directives.
    pub text: String,
    /// Language the backend must answer in.
    pub language: Language,
    /// Condensed recent history. Empty for a new consultation.
    pub history: Vec<HistoryEntry>,
    /// The turn answers follow-up questions the assistant asked previously.
    #[serde(default)]
    pub follow_up_answer: bool,
    /// Consultation topic active for the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
}

impl BackendRequest {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
            history: Vec::new(),
            follow_up_answer: false,
            topic: None,
        }
    }
}

/// The conversational AI backend.
///
/// Replies are plain strings. A reply may be a function-call sentinel (see
/// [`crate::FunctionCall`]) instead of prose; the caller must check for it
/// before displaying anything.
///
/// This trait is object-safe and can be used with `Box<dyn AssistantBackend>`.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Send a text-only query.
    async fn send_text(&self, request: &BackendRequest) -> Result<String, BackendError>;

    /// Send a query with an attached image.
    async fn send_image(&self, request: &BackendRequest, image: &MediaRef) -> Result<String, BackendError>;

    /// Send a query with an attached video.
    async fn send_video(&self, request: &BackendRequest, video: &MediaRef) -> Result<String, BackendError>;

    /// Send a query with an attached audio recording.
    async fn send_audio(&self, request: &BackendRequest, audio: &MediaRef) -> Result<String, BackendError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;

    /// Check if the backend is ready to take queries.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
