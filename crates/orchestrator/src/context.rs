//! Request context for delegated backend queries.

use vet_core::{BackendRequest, HistoryEntry, Language, Message, Topic};

/// Marker opening the follow-up directive.
pub const FOLLOW_UP_TAG: &str = "[FOLLOW-UP ANSWER]";

/// Marker opening the user's own text after a directive.
pub const USER_MESSAGE_TAG: &str = "[USER MESSAGE]";

/// Directive telling the backend the turn answers its own questions.
pub fn follow_up_directive(language: Language) -> &'static str {
    language.pick(
        "Este mensaje responde a las preguntas de seguimiento que hiciste antes. \
         No vuelvas a pedir información que ya fue proporcionada; continúa la evaluación \
         con estos datos.",
        "This message answers the follow-up questions you asked previously. \
         Do not ask again for information already provided; continue the assessment \
         with these details.",
    )
}

/// Context gathered for one delegated query.
///
/// Holds the condensed history (only for continuations), the follow-up flag
/// and the active topic, and turns the user's text into a [`BackendRequest`].
#[derive(Debug, Clone, Default)]
pub struct Context {
    history: Vec<HistoryEntry>,
    follow_up_answer: bool,
    topic: Option<Topic>,
}

impl Context {
    /// Create a new empty context (new consultation: no history).
    pub fn new() -> Self {
        Self::default()
    }

    /// Condense the last `window` messages, each cut to `max_chars`.
    ///
    /// `messages` should not contain the current turn.
    pub fn with_history(mut self, messages: &[Message], window: usize, max_chars: usize) -> Self {
        let start = messages.len().saturating_sub(window);
        self.history = messages[start..]
            .iter()
            .map(|m| HistoryEntry::from_message(m, max_chars))
            .filter(|entry| !entry.content.is_empty())
            .collect();
        self
    }

    pub fn with_follow_up(mut self, follow_up_answer: bool) -> Self {
        self.follow_up_answer = follow_up_answer;
        self
    }

    pub fn with_topic(mut self, topic: Option<Topic>) -> Self {
        self.topic = topic;
        self
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_follow_up(&self) -> bool {
        self.follow_up_answer
    }

    /// Build the backend request for `text`.
    ///
    /// Follow-up answers are prefixed with the directive so the backend does
    /// not re-ask for information the user just gave.
    pub fn build_request(&self, text: &str, language: Language) -> BackendRequest {
        let text = if self.follow_up_answer {
            format!(
                "{}\n{}\n\n{}\n{}",
                FOLLOW_UP_TAG,
                follow_up_directive(language),
                USER_MESSAGE_TAG,
                text.trim()
            )
        } else {
            text.trim().to_string()
        };

        BackendRequest {
            text,
            language,
            history: self.history.clone(),
            follow_up_answer: self.follow_up_answer,
            topic: self.topic,
        }
    }

    /// Format the context as a string for logging/debugging.
    pub fn format_summary(&self) -> String {
        format!(
            "history={} follow_up={} topic={}",
            self.history.len(),
            self.follow_up_answer,
            self.topic.map(|t| t.as_str()).unwrap_or("none")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vet_core::{MediaRef, Role};

    #[test]
    fn test_empty_context() {
        let context = Context::new();
        assert!(!context.has_history());
        let request = context.build_request("  hello ", Language::En);
        assert_eq!(request.text, "hello");
        assert!(request.history.is_empty());
        assert!(!request.follow_up_answer);
        assert_eq!(request.topic, None);
    }

    #[test]
    fn test_history_window() {
        let messages = vec![
            Message::user("one", None),
            Message::assistant("two"),
            Message::user("", Some(MediaRef::image("img-1"))),
            Message::assistant("four"),
        ];
        let context = Context::new().with_history(&messages, 3, 500);
        assert_eq!(context.history_len(), 3);

        let request = context.build_request("next", Language::En);
        assert_eq!(request.history[0].role, Role::Assistant);
        assert_eq!(request.history[0].content, "two");
        assert_eq!(request.history[1].content, "[image]");
    }

    #[test]
    fn test_follow_up_is_tagged() {
        let context = Context::new()
            .with_follow_up(true)
            .with_topic(Some(Topic::Eye));
        let request = context.build_request("9 years, Yorkshire", Language::En);

        assert!(request.follow_up_answer);
        assert_eq!(request.topic, Some(Topic::Eye));
        assert!(request.text.starts_with(FOLLOW_UP_TAG));
        assert!(request.text.contains("Do not ask again"));
        assert!(request.text.ends_with("[USER MESSAGE]\n9 years, Yorkshire"));
    }

    #[test]
    fn test_follow_up_directive_is_localized() {
        let request = Context::new()
            .with_follow_up(true)
            .build_request("9 años", Language::Es);
        assert!(request.text.contains("No vuelvas a pedir"));
    }

    #[test]
    fn test_format_summary() {
        let context = Context::new().with_topic(Some(Topic::Skin));
        assert_eq!(context.format_summary(), "history=0 follow_up=false topic=skin");
    }
}
