//! Turn events and the callback sink they are delivered through.

use std::sync::Arc;

use serde::Serialize;

use crate::types::{Message, Thread};

/// Result of one turn: the updated thread plus the assistant and tool
/// messages created during it (caller input is not echoed back).
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub thread: Thread,
    pub new_messages: Vec<Message>,
}

/// Events emitted while a turn runs.
///
/// A streamed turn always ends with exactly one `Complete` or `Error`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Partial assistant text as it arrives from the provider.
    ContentChunk { text: String },
    AssistantMessage { message: Message },
    ToolMessage { message: Message },
    Complete { outcome: TurnOutcome },
    Error { message: String },
}

/// Callback receiving turn events.
pub type AgentEventSink = Arc<dyn Fn(AgentEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct EventEmitter {
    sink: Option<AgentEventSink>,
}

impl EventEmitter {
    pub(crate) fn new(sink: AgentEventSink) -> Self {
        Self { sink: Some(sink) }
    }

    pub(crate) fn emit(&self, event: AgentEvent) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }
}
