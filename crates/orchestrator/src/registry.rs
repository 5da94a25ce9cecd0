//! Conversation registry.
//!
//! Keeps one [`Conversation`] per chat session behind its own async mutex, so
//! turns for the same conversation queue in arrival order while different
//! conversations run in parallel. The number of tracked conversations is
//! bounded; idle conversations are evicted least recently used first.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::conversation::Conversation;

/// Default maximum number of conversations before LRU eviction.
pub const DEFAULT_MAX_CONVERSATIONS: usize = 10_000;

/// A shared, lockable conversation.
pub type ConversationSlot = Arc<Mutex<Conversation>>;

#[derive(Debug)]
pub struct ConversationRegistry {
    /// Insertion order doubles as recency order.
    slots: RwLock<IndexMap<String, ConversationSlot>>,
    max_conversations: usize,
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONVERSATIONS)
    }
}

impl ConversationRegistry {
    pub fn new(max_conversations: usize) -> Self {
        Self {
            slots: RwLock::new(IndexMap::new()),
            max_conversations: max_conversations.max(1),
        }
    }

    /// Get the slot for `id`, creating the conversation if needed.
    ///
    /// This marks the conversation as recently used.
    pub async fn get_or_create(&self, id: &str, browser_locale: &str) -> ConversationSlot {
        let mut slots = self.slots.write().await;

        let slot = slots
            .shift_remove(id)
            .unwrap_or_else(|| Arc::new(Mutex::new(Conversation::new(id, browser_locale))));
        slots.insert(id.to_string(), slot.clone());

        Self::evict(&mut slots, self.max_conversations);
        slot
    }

    /// Register an existing conversation, replacing any with the same id.
    pub async fn insert(&self, conversation: Conversation) -> ConversationSlot {
        let mut slots = self.slots.write().await;
        let id = conversation.id().to_string();
        let slot = Arc::new(Mutex::new(conversation));
        slots.shift_remove(&id);
        slots.insert(id, slot.clone());

        Self::evict(&mut slots, self.max_conversations);
        slot
    }

    pub async fn get(&self, id: &str) -> Option<ConversationSlot> {
        self.slots.read().await.get(id).cloned()
    }

    /// A copy of the conversation, waiting for any in-flight turn to finish.
    pub async fn snapshot(&self, id: &str) -> Option<Conversation> {
        let slot = self.get(id).await?;
        let conversation = slot.lock().await;
        Some(conversation.clone())
    }

    /// Whether a turn is currently being processed for `id`.
    pub async fn is_busy(&self, id: &str) -> bool {
        match self.get(id).await {
            Some(slot) => slot.try_lock().is_err(),
            None => false,
        }
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.slots.write().await.shift_remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Evict the oldest idle conversations until within the limit.
    ///
    /// Slots that are locked or still referenced elsewhere are skipped.
    fn evict(slots: &mut IndexMap<String, ConversationSlot>, max: usize) {
        while slots.len() > max {
            let idle = slots
                .values()
                .position(|slot| Arc::strong_count(slot) == 1 && slot.try_lock().is_ok());
            match idle {
                Some(index) => {
                    if let Some((id, _)) = slots.shift_remove_index(index) {
                        debug!(conversation = %id, "Evicted idle conversation");
                    }
                }
                None => break,
            }
        }
    }
}
