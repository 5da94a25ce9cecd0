//! Fire-and-forget message persistence.
//!
//! Every inbound and outbound message is handed to a [`MessageStore`]
//! through an ordered background queue. Turns never wait on the store and
//! store failures are only logged.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use vet_core::{Message, MessageStore, StoreError};

enum Job {
    Save {
        conversation_id: String,
        message: Message,
    },
    Flush(oneshot::Sender<()>),
}

/// Ordered background writer in front of a [`MessageStore`].
///
/// The worker task is spawned on first use, so the queue can be built
/// outside a runtime.
pub struct PersistenceQueue {
    store: Arc<dyn MessageStore>,
    sender: OnceLock<mpsc::UnboundedSender<Job>>,
}

impl PersistenceQueue {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            sender: OnceLock::new(),
        }
    }

    fn sender(&self) -> &mpsc::UnboundedSender<Job> {
        self.sender.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(run_worker(self.store.clone(), rx));
            tx
        })
    }

    /// Queue a message for saving. Never blocks.
    ///
    /// Must be called inside a Tokio runtime; the first call spawns the
    /// writer task.
    pub fn enqueue(&self, conversation_id: &str, message: &Message) {
        let job = Job::Save {
            conversation_id: conversation_id.to_string(),
            message: message.clone(),
        };
        if self.sender().send(job).is_err() {
            warn!(
                conversation = %conversation_id,
                message_id = %message.id,
                "PERSIST_QUEUE_CLOSED"
            );
        }
    }

    /// Wait until everything queued so far has been handed to the store.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender().send(Job::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

async fn run_worker(store: Arc<dyn MessageStore>, mut rx: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = rx.recv().await {
        match job {
            Job::Save {
                conversation_id,
                message,
            } => {
                if let Err(e) = store.save_message(&conversation_id, &message).await {
                    warn!(
                        conversation = %conversation_id,
                        message_id = %message.id,
                        error = %e,
                        "PERSIST_FAILED"
                    );
                } else {
                    debug!(conversation = %conversation_id, message_id = %message.id, "Message persisted");
                }
            }
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// A logging store for debugging that logs every saved message.
#[derive(Debug, Clone, Default)]
pub struct LoggingStore;

#[async_trait]
impl MessageStore for LoggingStore {
    async fn save_message(&self, conversation_id: &str, message: &Message) -> Result<(), StoreError> {
        let role = if message.is_user() { "user" } else { "assistant" };
        info!("[{}] Saving {} message {}: {}", conversation_id, role, message.id, message.content());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingStore {
        saved: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageStore for CollectingStore {
        async fn save_message(&self, _conversation_id: &str, message: &Message) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("offline".to_string()));
            }
            self.saved.lock().unwrap().push(message.content().to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_messages_are_saved_in_order() {
        let store = Arc::new(CollectingStore::default());
        let queue = PersistenceQueue::new(store.clone());

        for i in 0..5 {
            queue.enqueue("c1", &Message::user(format!("m{}", i), None));
        }
        queue.flush().await;

        assert_eq!(*store.saved.lock().unwrap(), vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let store = Arc::new(CollectingStore {
            fail: true,
            ..Default::default()
        });
        let queue = PersistenceQueue::new(store.clone());
        queue.enqueue("c1", &Message::assistant("lost"));
        queue.flush().await;
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logging_store() {
        let store = LoggingStore;
        store.save_message("c1", &Message::assistant("hello")).await.unwrap();
    }
}
