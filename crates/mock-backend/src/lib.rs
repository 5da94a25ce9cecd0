//! Mock collaborators for exercising the consultation orchestrator.
//!
//! This crate provides test doubles for every collaborator trait in
//! `vet-core`:
//! - `EchoBackend` - Echoes the request text back
//! - `ScriptedBackend` - Replays queued replies and records every call
//! - `DelayedBackend` - Wraps another backend with artificial delay
//! - `FailingBackend` - Always fails with a fixed error
//! - `FixedAnalysis` - Returns canned structured analysis results
//! - `RecordingStore` / `RecordingEventSink` - Capture persisted messages and events
//!
//! # Example
//!
//! ```rust
//! use mock_backend::{AssistantBackend, BackendRequest, Language, ScriptedBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_backend::BackendError> {
//!     let backend = ScriptedBackend::new().with_reply("How old is your dog?");
//!
//!     let request = BackendRequest::new("my dog is limping", Language::En);
//!     let reply = backend.send_text(&request).await?;
//!     assert_eq!(reply, "How old is your dog?");
//!     assert_eq!(backend.calls().await.len(), 1);
//!     Ok(())
//! }
//! ```

mod analysis;
mod delayed;
mod echo;
mod failing;
mod recording;
mod scripted;

// Re-export vet-core types for convenience
pub use vet_core::{
    async_trait, AnalysisKind, AnalysisRequest, AnalysisService, AssistantBackend, BackendError,
    BackendRequest, Language, MediaRef, Message,
};

// Export mock implementations
pub use analysis::FixedAnalysis;
pub use delayed::DelayedBackend;
pub use echo::EchoBackend;
pub use failing::{FailingBackend, FailureKind};
pub use recording::{RecordingEventSink, RecordingStore};
pub use scripted::{Channel, RecordedCall, ScriptedBackend};
