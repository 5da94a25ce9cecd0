//! Conversation state owned by the orchestrator.

use serde::{Deserialize, Serialize};
use vet_core::{Language, LanguagePreference, Message, Topic};

use crate::flow::SkinFlow;

/// One chat session: the ordered transcript plus cached consultation state.
///
/// Messages are append-only; append order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
    topic: Option<Topic>,
    flow: SkinFlow,
    language_preference: LanguagePreference,
    browser_locale: String,
    last_language: Option<Language>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, browser_locale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            topic: None,
            flow: SkinFlow::None,
            language_preference: LanguagePreference::Auto,
            browser_locale: browser_locale.into(),
            last_language: None,
        }
    }

    pub fn with_language_preference(mut self, preference: LanguagePreference) -> Self {
        self.language_preference = preference;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_assistant())
    }

    /// The last `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn topic(&self) -> Option<Topic> {
        self.topic
    }

    /// Set the active topic. A different topic resets the skin flow.
    pub fn set_topic(&mut self, topic: Topic) {
        if self.topic != Some(topic) {
            self.flow = SkinFlow::None;
        }
        self.topic = Some(topic);
    }

    /// Clear topic and flow at the start of a new consultation.
    pub fn reset_consultation(&mut self) {
        self.topic = None;
        self.flow = SkinFlow::None;
    }

    pub fn flow(&self) -> &SkinFlow {
        &self.flow
    }

    pub fn set_flow(&mut self, flow: SkinFlow) {
        self.flow = flow;
    }

    pub fn language_preference(&self) -> LanguagePreference {
        self.language_preference
    }

    pub fn set_language_preference(&mut self, preference: LanguagePreference) {
        self.language_preference = preference;
    }

    pub fn browser_locale(&self) -> &str {
        &self.browser_locale
    }

    pub fn last_language(&self) -> Option<Language> {
        self.last_language
    }

    /// Record the resolved language. Returns the previous one if it changed.
    pub fn record_language(&mut self, language: Language) -> Option<Language> {
        let previous = self.last_language.replace(language);
        previous.filter(|p| *p != language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vet_core::MediaRef;

    #[test]
    fn test_recent_window() {
        let mut conversation = Conversation::new("c1", "es-AR");
        assert!(conversation.recent(3).is_empty());

        for i in 0..5 {
            conversation.push(Message::user(format!("m{}", i), None));
        }
        let recent: Vec<&str> = conversation.recent(2).iter().map(Message::content).collect();
        assert_eq!(recent, vec!["m3", "m4"]);
        assert_eq!(conversation.recent(10).len(), 5);
    }

    #[test]
    fn test_topic_change_resets_flow() {
        let mut conversation = Conversation::new("c1", "en-US");
        conversation.set_topic(Topic::Skin);
        conversation.set_flow(SkinFlow::AwaitingScale {
            first_image: MediaRef::image("img-1"),
        });

        conversation.set_topic(Topic::Skin);
        assert!(conversation.flow().is_active());

        conversation.set_topic(Topic::Eye);
        assert_eq!(conversation.flow(), &SkinFlow::None);
        assert_eq!(conversation.topic(), Some(Topic::Eye));
    }

    #[test]
    fn test_reset_consultation() {
        let mut conversation = Conversation::new("c1", "en-US");
        conversation.set_topic(Topic::Skin);
        conversation.set_flow(SkinFlow::Initial);
        conversation.reset_consultation();
        assert_eq!(conversation.topic(), None);
        assert_eq!(conversation.flow(), &SkinFlow::None);
    }

    #[test]
    fn test_record_language_reports_changes() {
        let mut conversation = Conversation::new("c1", "en-US");
        assert_eq!(conversation.record_language(Language::En), None);
        assert_eq!(conversation.record_language(Language::En), None);
        assert_eq!(conversation.record_language(Language::Es), Some(Language::En));
        assert_eq!(conversation.last_language(), Some(Language::Es));
    }

    #[test]
    fn test_last_assistant() {
        let mut conversation = Conversation::new("c1", "en-US");
        conversation.push(Message::assistant("first"));
        conversation.push(Message::user("reply", None));
        assert_eq!(conversation.last_assistant().map(Message::content), Some("first"));
        assert!(conversation.last().map(Message::is_user).unwrap_or(false));
    }
}
