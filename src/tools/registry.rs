//! Name-indexed tool table used by the agent loop.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::module::ToolModule;
use super::spec::ToolSpec;
use super::tool::{Tool, ToolExecutionContext};
use super::types::{ToolAttributes, ToolDefinition};
use super::validation::validate_arguments;
use crate::error::{ColloquyError, Result};
use crate::provider::format::tool_result_to_string;
use crate::registry::ComponentRegistry;
use crate::types::{Message, ToolCall};

static TOOL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").expect("tool name validation regex must compile")
});

#[derive(Clone)]
struct RegisteredTool {
    definition: ToolDefinition,
    attributes: ToolAttributes,
    tool: Arc<dyn Tool>,
}

/// Tools available to an agent, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if !TOOL_NAME_RE.is_match(&name) {
            return Err(ColloquyError::Configuration(format!(
                "invalid tool name '{name}': use 1-64 letters, digits, '_' or '-'"
            )));
        }

        let entry = RegisteredTool {
            definition: tool.definition(),
            attributes: tool.attributes(),
            tool,
        };
        match self.index.get(&name) {
            Some(&slot) => {
                debug!(tool = %name, "replacing registered tool");
                self.entries[slot] = entry;
            }
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(entry);
            }
        }
        Ok(())
    }

    pub fn register_module(&mut self, module: &ToolModule) -> Result<()> {
        for tool in module.tools() {
            self.register(Arc::clone(tool))?;
        }
        Ok(())
    }

    /// Register only the named tools of `module`.
    pub fn register_selected(&mut self, module: &ToolModule, names: &[String]) -> Result<()> {
        for name in names {
            let tool = module.get(name).ok_or_else(|| {
                ColloquyError::Configuration(format!(
                    "tool '{name}' not found in module '{}'",
                    module.name()
                ))
            })?;
            self.register(Arc::clone(tool))?;
        }
        Ok(())
    }

    /// Resolve a [`ToolSpec`] against modules registered in `components`.
    pub fn register_spec(&mut self, spec: &ToolSpec, components: &ComponentRegistry) -> Result<()> {
        let lookup = |name: &str| {
            components.tool_module(name).ok_or_else(|| {
                ColloquyError::Configuration(format!("tool module '{name}' is not registered"))
            })
        };
        match spec {
            ToolSpec::Module(name) => self.register_module(&*lookup(name)?),
            ToolSpec::Selected { module, tools } => self.register_selected(&*lookup(module)?, tools),
            ToolSpec::Custom(tool) => self.register(Arc::clone(tool)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.entry(name).map(|e| &e.tool)
    }

    pub fn attributes(&self, name: &str) -> Option<&ToolAttributes> {
        self.entry(name).map(|e| &e.attributes)
    }

    pub fn is_interrupt(&self, name: &str) -> bool {
        self.attributes(name).is_some_and(ToolAttributes::is_interrupt)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.definition.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up, validate, and run a tool.
    pub async fn invoke(
        &self,
        name: &str,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<Value> {
        let entry = self
            .entry(name)
            .ok_or_else(|| ColloquyError::ToolNotFound(name.to_string()))?;
        validate_arguments(args.raw(), &entry.definition.parameters)?;
        entry.tool.execute(args, ctx).await
    }

    /// Run a model-issued call and turn the outcome into a tool message.
    ///
    /// Failures (unknown tool, bad arguments, tool errors) are reported in
    /// the message content instead of being returned. The only error is a
    /// call without an id, which cannot be answered.
    pub async fn execute(&self, call: &ToolCall, thread_id: Option<&str>) -> Result<Message> {
        if call.id.is_empty() {
            return Err(ColloquyError::validation(format!(
                "tool call to '{}' has no id",
                call.name()
            )));
        }
        let ctx = ToolExecutionContext {
            thread_id: thread_id.map(str::to_string),
            tool_call_id: call.id.clone(),
        };
        let result = match ToolArguments::parse(&call.function.arguments) {
            Ok(args) => self.invoke(call.name(), &args, &ctx).await,
            Err(e) => Err(e),
        };

        let content = match result {
            Ok(value) => tool_result_to_string(&value),
            Err(e) => {
                warn!(tool = %call.name(), error = %e, "tool execution failed");
                format!("Error executing tool: {e}")
            }
        };
        Message::tool(&call.id, call.name(), content)
    }

    fn entry(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
