//! UI-agnostic conversation types
//!
//! This module contains the message log shared by every front end. Messages
//! are only ever appended by the session; callers get read-only access.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message, unique within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out fresh message ids for a session
#[derive(Debug, Default)]
pub(crate) struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub(crate) fn next_id(&mut self) -> MessageId {
        let id = MessageId(self.next);
        self.next += 1;
        id
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Structured weather details attached to a successful reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherInsights {
    pub temperature: String,
    pub rain: String,
    pub advice: String,
    pub clothing: String,
    pub caution: String,
}

/// A single turn in the weather conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Local>,
    pub insights: Option<WeatherInsights>,
}

impl ChatMessage {
    pub(crate) fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: ChatRole::User,
            text: text.into(),
            timestamp: Local::now(),
            insights: None,
        }
    }

    pub(crate) fn assistant(
        id: MessageId,
        text: impl Into<String>,
        insights: Option<WeatherInsights>,
    ) -> Self {
        Self {
            id,
            role: ChatRole::Assistant,
            text: text.into(),
            timestamp: Local::now(),
            insights,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

/// Append-only log of the conversation, in the order messages were added
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
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
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
