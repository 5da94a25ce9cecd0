//! Persistence collaborator contract.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::message::Message;

/// Durable storage for transcript messages.
///
/// Called fire-and-forget by the orchestrator; a failure is logged and never
/// blocks the conversation.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message appended to `conversation_id`.
    async fn save_message(&self, conversation_id: &str, message: &Message) -> Result<(), StoreError>;
}

/// A store that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpStore;

#[async_trait]
impl MessageStore for NoOpStore {
    async fn save_message(&self, _conversation_id: &str, _message: &Message) -> Result<(), StoreError> {
        Ok(())
    }
}
