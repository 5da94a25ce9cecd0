//! Core types and collaborator traits for the pet-health consultation engine.
//!
//! This crate provides the shared interface between the turn orchestrator
//! and the services it coordinates. It defines:
//!
//! - [`Message`] / [`MediaRef`] - Transcript entries and attached media
//! - [`AssistantBackend`] - The conversational AI backend
//! - [`AnalysisService`] - The specialized image-analysis service
//! - [`MessageStore`] - Best-effort persistence of transcript messages
//! - [`EventSink`] - Best-effort analytics events
//! - [`FunctionCall`] - The sentinel a backend returns to request an analysis
//!
//! # Example
//!
//! ```rust
//! use vet_core::{async_trait, AssistantBackend, BackendError, BackendRequest, MediaRef};
//!
//! struct CannedBackend;
//!
//! #[async_trait]
//! impl AssistantBackend for CannedBackend {
//!     async fn send_text(&self, _request: &BackendRequest) -> Result<String, BackendError> {
//!         Ok("How old is your dog?".to_string())
//!     }
//!
//!     async fn send_image(
//!         &self,
//!         _request: &BackendRequest,
//!         _image: &MediaRef,
//!     ) -> Result<String, BackendError> {
//!         Ok("Nice photo.".to_string())
//!     }
//!
//!     async fn send_video(
//!         &self,
//!         _request: &BackendRequest,
//!         _video: &MediaRef,
//!     ) -> Result<String, BackendError> {
//!         Err(BackendError::Unsupported("video".to_string()))
//!     }
//!
//!     async fn send_audio(
//!         &self,
//!         _request: &BackendRequest,
//!         _audio: &MediaRef,
//!     ) -> Result<String, BackendError> {
//!         Err(BackendError::Unsupported("audio".to_string()))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "CannedBackend"
//!     }
//! }
//! ```

mod analysis;
mod backend;
mod error;
mod events;
mod function_call;
mod history;
mod language;
mod message;
mod store;

pub use analysis::{AnalysisKind, AnalysisRequest, AnalysisService, Topic};
pub use backend::{AssistantBackend, BackendRequest};
pub use error::{BackendError, StoreError};
pub use events::{AnalyticsEvent, EventName, EventSink, NoOpEventSink};
pub use function_call::{extract_json, FunctionCall};
pub use history::HistoryEntry;
pub use language::{Language, LanguagePreference};
pub use message::{FlowPrompt, MediaKind, MediaRef, Message, QuickAction, Role, SizeCategory};
pub use store::{MessageStore, NoOpStore};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
