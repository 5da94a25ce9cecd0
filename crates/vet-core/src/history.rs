//! Condensed conversation history sent to the backend.

use serde::{Deserialize, Serialize};

use crate::message::{MediaKind, Message, Role};

/// A single condensed message in the delegated history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Role: "user" or "assistant"
    pub role: Role,
    /// Message content, media noted inline.
    pub content: String,
}

impl HistoryEntry {
    /// Create a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Condense a transcript message, truncating its text to `max_chars`.
    pub fn from_message(message: &Message, max_chars: usize) -> Self {
        let mut content = truncate_chars(message.content(), max_chars);

        if let Some(media) = &message.media {
            let marker = match media.kind {
                MediaKind::Image => "[image]",
                MediaKind::Video => "[video]",
                MediaKind::Audio => "[audio]",
            };
            if content.is_empty() {
                content = marker.to_string();
            } else {
                content = format!("{} {}", marker, content);
            }
        }

        Self {
            role: message.role,
            content,
        }
    }
}

/// Truncate to at most `max_chars` characters, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MediaRef;

    #[test]
    fn test_from_message_text_only() {
        let msg = Message::user("my dog is limping", None);
        let entry = HistoryEntry::from_message(&msg, 500);
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.content, "my dog is limping");
    }

    #[test]
    fn test_from_message_with_media() {
        let msg = Message::user("", Some(MediaRef::image("img-1")));
        let entry = HistoryEntry::from_message(&msg, 500);
        assert_eq!(entry.content, "[image]");

        let msg = Message::user("look", Some(MediaRef::audio("a-1")));
        let entry = HistoryEntry::from_message(&msg, 500);
        assert_eq!(entry.content, "[audio] look");
    }

    #[test]
    fn test_truncation() {
        let msg = Message::assistant("abcdefghij");
        let entry = HistoryEntry::from_message(&msg, 4);
        assert_eq!(entry.content, "abcd…");

        let entry = HistoryEntry::from_message(&msg, 0);
        assert_eq!(entry.content, "abcdefghij");
    }

    #[test]
    fn test_truncation_is_char_safe() {
        let msg = Message::assistant("años años");
        let entry = HistoryEntry::from_message(&msg, 2);
        assert_eq!(entry.content, "añ…");
    }
}
