//! Messages, roles, content parts, tool calls, and reactions.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::attachment::Attachment;
use super::usage::MessageMetrics;
use crate::error::{ColloquyError, Result};

/// Conversation role.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Parse a role name, rejecting anything outside the four known roles.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).map_err(|_| ColloquyError::validation(format!("invalid role '{s}'")))
    }
}

/// Message content: plain text or a list of multimodal parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Parts(parts) => parts.is_empty(),
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ContentPart>> for Content {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

/// A single part of multimodal content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// Raw JSON text exactly as the model produced it.
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Emoji reactions: emoji to the set of user ids that reacted with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Reactions(BTreeMap<String, BTreeSet<String>>);

impl Reactions {
    pub fn users(&self, emoji: &str) -> Option<&BTreeSet<String>> {
        self.0.get(emoji)
    }

    pub fn count(&self, emoji: &str) -> usize {
        self.0.get(emoji).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    fn add(&mut self, emoji: &str, user_id: &str) -> bool {
        self.0
            .entry(emoji.to_string())
            .or_default()
            .insert(user_id.to_string())
    }

    fn remove(&mut self, emoji: &str, user_id: &str) -> bool {
        let Some(users) = self.0.get_mut(emoji) else {
            return false;
        };
        let removed = users.remove(user_id);
        if users.is_empty() {
            self.0.remove(emoji);
        }
        removed
    }
}

/// A single message in a thread.
///
/// Construction goes through [`Message::builder`] or the role shortcuts; a
/// tool message without a `tool_call_id` cannot be built or deserialized.
/// The sequence number is assigned when the message is added to a
/// [`Thread`](super::Thread).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    id: String,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<u64>,
    content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    attributes: Map<String, Value>,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Reactions::is_empty")]
    reactions: Reactions,
    #[serde(skip_serializing_if = "MessageMetrics::is_empty")]
    metrics: MessageMetrics,
}

#[bon::bon]
impl Message {
    /// Build a message, validating role-specific requirements.
    #[builder]
    pub fn new(
        role: Role,
        #[builder(into, default)] content: Content,
        #[builder(into)] name: Option<String>,
        #[builder(into)] tool_call_id: Option<String>,
        #[builder(default)] tool_calls: Vec<ToolCall>,
        #[builder(default)] attributes: Map<String, Value>,
        source: Option<Map<String, Value>>,
        #[builder(default)] attachments: Vec<Attachment>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        validate(role, tool_call_id.as_deref(), &tool_calls)?;
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        let id = content_hash(role, &content, &timestamp, name.as_deref(), source.as_ref());
        Ok(Self {
            id,
            role,
            sequence: None,
            content,
            name,
            tool_call_id,
            tool_calls,
            attributes,
            timestamp,
            source,
            attachments,
            reactions: Reactions::default(),
            metrics: MessageMetrics::default(),
        })
    }
}

impl Message {
    fn plain(role: Role, content: Content) -> Self {
        let timestamp = Utc::now();
        Self {
            id: content_hash(role, &content, &timestamp, None, None),
            role,
            sequence: None,
            content,
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
            attributes: Map::new(),
            timestamp,
            source: None,
            attachments: Vec::new(),
            reactions: Reactions::default(),
            metrics: MessageMetrics::default(),
        }
    }

    pub fn system(content: impl Into<Content>) -> Self {
        Self::plain(Role::System, content.into())
    }

    pub fn user(content: impl Into<Content>) -> Self {
        Self::plain(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::plain(Role::Assistant, content.into())
    }

    /// Tool result correlated with the call that produced it.
    ///
    /// Fails when `tool_call_id` is empty.
    pub fn tool(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<Content>,
    ) -> Result<Self> {
        Self::builder()
            .role(Role::Tool)
            .tool_call_id(tool_call_id)
            .name(name)
            .content(content)
            .build()
    }

    /// Assistant message requesting tool calls.
    pub fn assistant_with_tool_calls(content: impl Into<Content>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_id.as_deref()
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> Option<&Map<String, Value>> {
        self.source.as_ref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn reactions(&self) -> &Reactions {
        &self.reactions
    }

    pub fn metrics(&self) -> &MessageMetrics {
        &self.metrics
    }

    /// Add `user_id`'s reaction. Returns `false` if it was already present.
    pub fn add_reaction(&mut self, emoji: &str, user_id: &str) -> bool {
        self.reactions.add(emoji, user_id)
    }

    /// Remove `user_id`'s reaction. Returns `false` if there was none.
    pub fn remove_reaction(&mut self, emoji: &str, user_id: &str) -> bool {
        self.reactions.remove(emoji, user_id)
    }

    /// Replace the completion metrics for this message.
    pub fn record_metrics(&mut self, metrics: MessageMetrics) {
        self.metrics = metrics;
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = Some(sequence);
    }

    pub(crate) fn set_content(&mut self, content: Content) {
        self.content = content;
    }

    pub(crate) fn attachments_mut(&mut self) -> &mut [Attachment] {
        &mut self.attachments
    }
}

fn validate(role: Role, tool_call_id: Option<&str>, tool_calls: &[ToolCall]) -> Result<()> {
    if role == Role::Tool && tool_call_id.map_or(true, str::is_empty) {
        return Err(ColloquyError::validation(
            "tool messages must carry a tool_call_id",
        ));
    }
    if !tool_calls.is_empty() && role != Role::Assistant {
        return Err(ColloquyError::validation(format!(
            "only assistant messages may carry tool calls, got role '{role}'"
        )));
    }
    Ok(())
}

fn content_hash(
    role: Role,
    content: &Content,
    timestamp: &DateTime<Utc>,
    name: Option<&str>,
    source: Option<&Map<String, Value>>,
) -> String {
    let mut fields = Map::new();
    fields.insert("role".into(), Value::String(role.to_string()));
    fields.insert(
        "content".into(),
        serde_json::to_value(content).unwrap_or(Value::Null),
    );
    fields.insert("timestamp".into(), Value::String(timestamp.to_rfc3339()));
    if role == Role::Tool {
        if let Some(name) = name {
            fields.insert("name".into(), Value::String(name.to_string()));
        }
    }
    if let Some(source) = source {
        fields.insert("source".into(), Value::Object(source.clone()));
    }

    let digest = Sha256::digest(Value::Object(fields).to_string().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<String>,
    role: Role,
    #[serde(default)]
    sequence: Option<u64>,
    #[serde(default)]
    content: Content,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tool_call_id: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
    #[serde(default)]
    attributes: Map<String, Value>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    source: Option<Map<String, Value>>,
    #[serde(default)]
    attachments: Vec<Attachment>,
    #[serde(default)]
    reactions: Reactions,
    #[serde(default)]
    metrics: MessageMetrics,
}

impl TryFrom<RawMessage> for Message {
    type Error = ColloquyError;

    fn try_from(raw: RawMessage) -> Result<Self> {
        validate(raw.role, raw.tool_call_id.as_deref(), &raw.tool_calls)?;
        let id = match raw.id {
            Some(id) => id,
            None => content_hash(
                raw.role,
                &raw.content,
                &raw.timestamp,
                raw.name.as_deref(),
                raw.source.as_ref(),
            ),
        };
        Ok(Self {
            id,
            role: raw.role,
            sequence: raw.sequence,
            content: raw.content,
            name: raw.name,
            tool_call_id: raw.tool_call_id,
            tool_calls: raw.tool_calls,
            attributes: raw.attributes,
            timestamp: raw.timestamp,
            source: raw.source,
            attachments: raw.attachments,
            reactions: raw.reactions,
            metrics: raw.metrics,
        })
    }
}
