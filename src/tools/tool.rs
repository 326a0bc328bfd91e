//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::arguments::ToolArguments;
use super::types::{ToolAttributes, ToolDefinition, ToolParameters};
use crate::error::Result;

/// Context handed to a tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Thread the call belongs to, when the turn has one.
    pub thread_id: Option<String>,
    /// Id of the tool call being answered.
    pub tool_call_id: String,
}

/// A named, schema-described callable the model may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &ToolParameters;

    /// Loop-control attributes. Ordinary tools keep the default.
    fn attributes(&self) -> ToolAttributes {
        ToolAttributes::default()
    }

    /// Run the tool. A returned string is used verbatim as the tool
    /// message content; any other value is rendered as JSON text.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<Value>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().schema.clone(),
        }
    }
}

type ToolHandler = dyn Fn(ToolArguments, ToolExecutionContext) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>>
    + Send
    + Sync;

/// Tool backed by an async closure.
#[derive(Clone)]
pub struct FnTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    attributes: ToolAttributes,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            attributes: ToolAttributes::default(),
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }

    pub fn with_attributes(mut self, attributes: ToolAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Mark this tool as an interrupt tool.
    pub fn interrupt(self) -> Self {
        self.with_attributes(ToolAttributes::interrupt())
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    fn attributes(&self) -> ToolAttributes {
        self.attributes.clone()
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolExecutionContext) -> Result<Value> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("kind", &self.attributes.kind)
            .finish()
    }
}
