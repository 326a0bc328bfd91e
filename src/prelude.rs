//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentBuilder, ThreadInput};
pub use crate::agent_loop::{AgentEvent, AgentEventSink, TurnOutcome};
pub use crate::config::{AgentConfig, ColloquyConfig};
pub use crate::error::{ColloquyError, Result};
pub use crate::files::{FileStore, StoredFile};
pub use crate::provider::{create_provider, CompletionProvider};
pub use crate::registry::{Component, ComponentKind, ComponentRegistry};
pub use crate::store::{MemoryThreadStore, ThreadStore};
pub use crate::tools::{
    FnTool, Tool, ToolArguments, ToolExecutionContext, ToolModule, ToolParameters, ToolRegistry,
    ToolSpec,
};
pub use crate::types::{Attachment, Content, Message, Role, Thread, ToolCall};
