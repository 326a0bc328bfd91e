//! Token usage and per-message completion metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token usage reported by a completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Merge another usage into this one (accumulate).
    pub fn merge(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }

    pub fn is_empty(&self) -> bool {
        self.total_tokens == 0 && self.prompt_tokens == 0 && self.completion_tokens == 0
    }
}

/// Wall-clock timing of a completion call.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Timing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

impl Timing {
    pub fn between(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        let latency_ms = (ended_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            started_at: Some(started_at),
            ended_at: Some(ended_at),
            latency_ms,
        }
    }
}

/// Metrics attached to a message produced by a completion.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MessageMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub usage: TokenUsage,
}

impl MessageMetrics {
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.timing == Timing::default() && self.usage.is_empty()
    }
}
