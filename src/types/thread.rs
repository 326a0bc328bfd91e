//! Conversation threads and their storage representation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::{Content, Message, Reactions, Role};
use super::usage::TokenUsage;
use crate::error::{ColloquyError, Result};

pub const DEFAULT_TITLE: &str = "Untitled Thread";

/// An ordered conversation.
///
/// The thread owns its messages and assigns their sequence numbers: the
/// single system message (if any) sits at index 0 with sequence 0, every
/// other message gets the next positive sequence in insertion order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Thread {
    id: String,
    title: String,
    messages: Vec<Message>,
    attributes: Map<String, Value>,
    source: Option<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

impl Thread {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            attributes: Map::new(),
            source: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Attach a source descriptor such as `{"name": "slack", "thread_id": "..."}`.
    pub fn with_source(mut self, source: Map<String, Value>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
        self.touch();
    }

    pub fn source(&self) -> Option<&Map<String, Value>> {
        self.source.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
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

    pub fn system_message(&self) -> Option<&Message> {
        self.messages.first().filter(|m| m.role() == Role::System)
    }

    pub fn get_message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    pub fn get_last_message_by_role(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role() == role)
    }

    /// Append a message, assigning its sequence number.
    ///
    /// A system message replaces any existing system message at position 0.
    pub fn add_message(&mut self, mut message: Message) {
        if message.role() == Role::System {
            message.set_sequence(0);
            match self.messages.first_mut() {
                Some(first) if first.role() == Role::System => *first = message,
                _ => self.messages.insert(0, message),
            }
        } else {
            message.set_sequence(self.next_sequence());
            self.messages.push(message);
        }
        self.touch();
    }

    /// Insert the system prompt, or update the existing system message.
    pub fn ensure_system_prompt(&mut self, prompt: &str) {
        match self.messages.first_mut() {
            Some(first) if first.role() == Role::System => {
                if first.text() != prompt {
                    first.set_content(Content::Text(prompt.to_string()));
                    self.touch();
                }
            }
            _ => self.add_message(Message::system(prompt)),
        }
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.touch();
    }

    /// React to a message. Returns `false` if the message is unknown or the
    /// reaction was already present.
    pub fn add_reaction(&mut self, message_id: &str, emoji: &str, user_id: &str) -> bool {
        let added = self
            .message_mut(message_id)
            .is_some_and(|m| m.add_reaction(emoji, user_id));
        if added {
            self.touch();
        }
        added
    }

    /// Returns `false` if the message or the reaction does not exist.
    pub fn remove_reaction(&mut self, message_id: &str, emoji: &str, user_id: &str) -> bool {
        let removed = self
            .message_mut(message_id)
            .is_some_and(|m| m.remove_reaction(emoji, user_id));
        if removed {
            self.touch();
        }
        removed
    }

    pub fn get_reactions(&self, message_id: &str) -> Option<&Reactions> {
        self.get_message(message_id).map(Message::reactions)
    }

    /// Token usage summed over every message.
    pub fn total_usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for message in &self.messages {
            total.merge(&message.metrics().usage);
        }
        total
    }

    /// Storage representation. The system message is not persisted; it is
    /// regenerated from the agent configuration on the next turn.
    pub fn to_record(&self) -> ThreadRecord {
        ThreadRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            messages: self
                .messages
                .iter()
                .filter(|m| m.role() != Role::System)
                .cloned()
                .collect(),
            attributes: self.attributes.clone(),
            source: self.source.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Rebuild a thread from storage, ordering messages by sequence.
    pub fn from_record(record: ThreadRecord) -> Result<Self> {
        let mut messages: Vec<Message> = record
            .messages
            .into_iter()
            .filter(|m| m.role() != Role::System)
            .collect();
        messages.sort_by_key(|m| m.sequence());

        let mut seen = HashSet::new();
        for message in &messages {
            match message.sequence() {
                Some(seq) if seq > 0 && seen.insert(seq) => {}
                other => {
                    return Err(ColloquyError::validation(format!(
                        "thread '{}' has message '{}' with invalid sequence {other:?}",
                        record.id,
                        message.id()
                    )))
                }
            }
        }

        Ok(Self {
            id: record.id,
            title: record.title,
            messages,
            attributes: record.attributes,
            source: record.source,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    pub(crate) fn messages_mut(&mut self) -> &mut [Message] {
        &mut self.messages
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id() == id)
    }

    fn next_sequence(&self) -> u64 {
        self.messages
            .iter()
            .filter(|m| m.role() != Role::System)
            .filter_map(Message::sequence)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Persisted form of a [`Thread`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadRecord {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub source: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}
