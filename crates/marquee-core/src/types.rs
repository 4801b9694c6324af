use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MarqueeError, Result};

// =============================================================================
// Enums
// =============================================================================

/// Author role of a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions and authoritative notes for the model.
    System,
    /// End-user input.
    User,
    /// Assistant output, including agent results appended by the router.
    Assistant,
    /// Output of a tool invocation.
    Tool,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::Tool => write!(f, "tool"),
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = MarqueeError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "system" => Ok(ChatRole::System),
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            "tool" => Ok(ChatRole::Tool),
            other => Err(MarqueeError::InvalidRole(other.to_string())),
        }
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// A single message of the chat history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Ordered, append-only chat history for one turn.
///
/// Built from the client-supplied message list at the start of a request,
/// extended by the router, and discarded afterwards unless the caller
/// persists it with [`Conversation::to_json`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::system(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last `n` messages that are not system messages, oldest first.
    pub fn recent_non_system(&self, n: usize) -> Vec<ChatMessage> {
        let mut recent: Vec<ChatMessage> = self
            .messages
            .iter()
            .rev()
            .filter(|m| m.role != ChatRole::System)
            .take(n)
            .cloned()
            .collect();
        recent.reverse();
        recent
    }

    // -- Persistence --

    /// Flatten into `(role, content)` pairs.
    pub fn to_persisted(&self) -> Vec<PersistedMessage> {
        self.messages
            .iter()
            .map(|m| PersistedMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Rebuild from `(role, content)` pairs. Fails on an unknown role.
    pub fn from_persisted(records: Vec<PersistedMessage>) -> Result<Self> {
        let messages = records
            .into_iter()
            .map(|r| Ok(ChatMessage::new(r.role.parse()?, r.content)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { messages })
    }

    /// Serialize the flat persisted form as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_persisted())?)
    }

    /// Restore from the JSON persisted form.
    ///
    /// Corrupted or unparseable input yields an empty conversation.
    pub fn restore(json: &str) -> Self {
        let parsed = serde_json::from_str::<Vec<PersistedMessage>>(json)
            .map_err(MarqueeError::from)
            .and_then(Self::from_persisted);
        match parsed {
            Ok(conversation) => conversation,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted conversation");
                Self::default()
            }
        }
    }
}

/// Flat persisted form of a chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMessage {
    pub role: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Conversation {
        let mut c = Conversation::new();
        c.push_system("be helpful");
        c.push_user("who directed Interstellar?");
        c.push_assistant("Christopher Nolan.");
        c.push(ChatMessage::new(ChatRole::Tool, "{\"id\":1}"));
        c
    }

    #[test]
    fn test_role_display_and_parse() {
        for role in [
            ChatRole::System,
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::Tool,
        ] {
            let parsed: ChatRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("narrator".parse::<ChatRole>().is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_recent_non_system_skips_system_and_keeps_order() {
        let mut c = Conversation::new();
        c.push_system("instructions");
        for i in 0..8 {
            c.push_user(format!("q{}", i));
            c.push_system("note");
        }
        let recent = c.recent_non_system(6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].content, "q2");
        assert_eq!(recent[5].content, "q7");
        assert!(recent.iter().all(|m| m.role != ChatRole::System));
    }

    #[test]
    fn test_recent_non_system_shorter_than_window() {
        let c = sample();
        assert_eq!(c.recent_non_system(6).len(), 3);
        assert!(c.recent_non_system(0).is_empty());
    }

    #[test]
    fn test_persisted_round_trip() {
        let c = sample();
        let json = c.to_json().unwrap();
        let restored = Conversation::restore(&json);
        assert_eq!(restored, c);
        assert_eq!(restored.messages()[1].role, ChatRole::User);
    }

    #[test]
    fn test_persisted_form_is_flat_pairs() {
        let flat = sample().to_persisted();
        assert_eq!(flat[0].role, "system");
        assert_eq!(flat[2].content, "Christopher Nolan.");
    }

    #[test]
    fn test_restore_corrupted_is_empty() {
        assert!(Conversation::restore("{definitely not json").is_empty());
        assert!(Conversation::restore("").is_empty());
    }

    #[test]
    fn test_restore_unknown_role_is_empty() {
        let json = r#"[{"role":"user","content":"hi"},{"role":"narrator","content":"..."}]"#;
        assert!(Conversation::restore(json).is_empty());
    }

    #[test]
    fn test_last_message() {
        let mut c = Conversation::new();
        assert!(c.last().is_none());
        c.push_assistant("done");
        assert_eq!(c.last().map(|m| m.content.as_str()), Some("done"));
    }
}
