//! Analytics event contract.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names of the events the orchestrator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    MessageSent,
    AnalysisStarted,
    AnalysisCompleted,
    AnalysisError,
    LanguageChanged,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageSent => "message_sent",
            Self::AnalysisStarted => "analysis_started",
            Self::AnalysisCompleted => "analysis_completed",
            Self::AnalysisError => "analysis_error",
            Self::LanguageChanged => "language_changed",
        }
    }
}

/// A discrete named event with an ordered property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: EventName,
    pub properties: IndexMap<String, Value>,
    pub at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(name: EventName) -> Self {
        Self {
            name,
            properties: IndexMap::new(),
            at: Utc::now(),
        }
    }

    /// Add a property (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get a string property.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

/// Receiver of analytics events.
///
/// Implementations must not block: hand the event to a channel or buffer and
/// return. Delivery is best-effort.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: AnalyticsEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_properties_keep_order() {
        let event = AnalyticsEvent::new(EventName::AnalysisStarted)
            .with("kind", "skin")
            .with("images", 2)
            .with("language", "es");

        let keys: Vec<&str> = event.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["kind", "images", "language"]);
        assert_eq!(event.get_str("kind"), Some("skin"));
        assert_eq!(event.name.as_str(), "analysis_started");
    }

    #[test]
    fn test_event_serializes_snake_case_name() {
        let event = AnalyticsEvent::new(EventName::LanguageChanged);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"language_changed\""));
    }
}
