//! Transcript entries.
//!
//! A [`Message`] is immutable once built: fields are private and only
//! readable through accessors. The session hands out clones, never
//! references into its own transcript.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

// ── MessageId ────────────────────────────────────────────────────────────────

/// Per-session sequence number. The seed greeting is always `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub const FIRST: MessageId = MessageId(1);

    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> MessageId {
        MessageId(self.0 + 1)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Sender ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Message ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    text: String,
    /// Display-only; transcript order is insertion order, never this field.
    created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(id: MessageId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id,
            sender,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Two-digit hour and minute in local time, e.g. `"09:41"`.
    pub fn display_time(&self) -> String {
        self.created_at.with_timezone(&Local).format("%H:%M").to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.display_time(), self.sender, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let a = MessageId::FIRST;
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.get(), 2);
    }

    #[test]
    fn sender_serialises_lowercase() {
        let m = Message::new(MessageId::FIRST, Sender::Assistant, "hello");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["sender"], "assistant");
        assert_eq!(json["id"], 1);
        assert_eq!(json["text"], "hello");
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn display_time_is_hh_mm() {
        let m = Message::new(MessageId::FIRST, Sender::User, "hi");
        let t = m.display_time();
        assert_eq!(t.len(), 5);
        assert_eq!(&t[2..3], ":");
    }

    #[test]
    fn display_includes_sender_and_text() {
        let m = Message::new(MessageId::FIRST, Sender::User, "is it red?");
        let s = m.to_string();
        assert!(s.contains("user: is it red?"));
    }
}
