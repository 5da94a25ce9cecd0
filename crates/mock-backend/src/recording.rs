//! Recording store and event sink.

use std::sync::Mutex;

use async_trait::async_trait;
use vet_core::{AnalyticsEvent, EventName, EventSink, Message, MessageStore, StoreError};

/// A message store that keeps everything in memory.
///
/// Can be switched to failing mode to check that persistence errors never
/// reach the conversation.
#[derive(Debug, Default)]
pub struct RecordingStore {
    saved: Mutex<Vec<(String, Message)>>,
    fail: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write.
    pub fn failing() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Messages saved so far as `(conversation_id, message)`.
    pub fn saved(&self) -> Vec<(String, Message)> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageStore for RecordingStore {
    async fn save_message(&self, conversation_id: &str, message: &Message) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        if let Ok(mut saved) = self.saved.lock() {
            saved.push((conversation_id.to_string(), message.clone()));
        }
        Ok(())
    }
}

/// An event sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events with the given name.
    pub fn named(&self, name: EventName) -> Vec<AnalyticsEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.name == name)
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: AnalyticsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_store() {
        let store = RecordingStore::new();
        store
            .save_message("conv-1", &Message::assistant("hi"))
            .await
            .unwrap();

        let saved = store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "conv-1");
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = RecordingStore::failing();
        let result = store.save_message("conv-1", &Message::assistant("hi")).await;
        assert!(result.is_err());
        assert!(store.saved().is_empty());
    }

    #[test]
    fn test_recording_sink_filters_by_name() {
        let sink = RecordingEventSink::new();
        sink.emit(AnalyticsEvent::new(EventName::MessageSent));
        sink.emit(AnalyticsEvent::new(EventName::AnalysisStarted));
        sink.emit(AnalyticsEvent::new(EventName::MessageSent));

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.named(EventName::MessageSent).len(), 2);
    }
}
