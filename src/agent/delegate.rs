//! Tool that hands a task to another agent.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::agent::Agent;
use crate::error::Result;
use crate::tools::{Tool, ToolArguments, ToolExecutionContext, ToolParameters};
use crate::types::{Message, Role, Thread};

/// Exposes a child [`Agent`] to the model as `delegate_to_{name}`.
///
/// Each call runs the child on a fresh thread whose only message is the
/// task, prefixed by any context entries. The tool result is the child's
/// non-empty assistant replies joined by blank lines.
pub struct DelegateTool {
    name: String,
    agent_name: String,
    description: String,
    parameters: ToolParameters,
    agent: Agent,
}

impl DelegateTool {
    pub fn new(name: impl Into<String>, agent: Agent) -> Self {
        let agent_name = name.into();
        let parameters = ToolParameters::object()
            .string("task", "The task for the agent to carry out", true)
            .property(
                "context",
                json!({
                    "type": "object",
                    "description": "Extra facts the agent needs, as key/value pairs"
                }),
                false,
            )
            .build();
        Self {
            name: format!("delegate_to_{agent_name}"),
            description: format!(
                "Delegate a task to the {agent_name} agent. Purpose: {}",
                agent.config().purpose
            ),
            agent_name,
            parameters,
            agent,
        }
    }
}

/// The task as the child's user message, with context lines in front.
fn task_message(task: &str, context: Option<&Value>) -> String {
    let entries = match context {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return task.to_string(),
    };
    let mut text = String::from("Context information:\n");
    for (key, value) in entries {
        match value {
            Value::String(s) => text.push_str(&format!("- {key}: {s}\n")),
            other => text.push_str(&format!("- {key}: {other}\n")),
        }
    }
    text.push('\n');
    text.push_str(task);
    text
}

#[async_trait]
impl Tool for DelegateTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, _ctx: &ToolExecutionContext) -> Result<Value> {
        let task = args.get_str("task")?;
        info!(agent = %self.agent_name, "delegating task");

        let mut thread = Thread::new();
        thread.add_message(Message::user(task_message(task, args.raw().get("context"))));
        let outcome = self.agent.go(thread).await?;

        let replies: Vec<String> = outcome
            .new_messages
            .iter()
            .filter(|m| m.role() == Role::Assistant)
            .map(Message::text)
            .filter(|text| !text.is_empty())
            .collect();
        Ok(Value::String(replies.join("\n\n")))
    }
}
