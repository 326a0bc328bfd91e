//! Completion provider boundary.

pub mod format;
pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::config::ColloquyConfig;
use crate::error::{ColloquyError, Result};
use crate::tools::ToolDefinition;
use crate::types::{TokenUsage, ToolCall};

/// A single chat-completion call.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub model: String,
    /// Messages already in wire format, see [`format::format_thread`].
    pub messages: Vec<Value>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
}

/// Result of a completion: either content, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
    /// Model name reported by the provider, if any.
    pub model: Option<String>,
}

/// Fragment of a streamed tool call, keyed by its position in the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One streamed chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionDelta {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub usage: Option<TokenUsage>,
}

impl CompletionDelta {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// Assembles streamed deltas into a [`CompletionResponse`].
#[derive(Debug, Default)]
pub struct CompletionAccumulator {
    content: String,
    calls: BTreeMap<usize, ToolCallDelta>,
    usage: TokenUsage,
}

impl CompletionAccumulator {
    pub fn push(&mut self, delta: &CompletionDelta) {
        if let Some(text) = &delta.content {
            self.content.push_str(text);
        }
        for fragment in &delta.tool_calls {
            let slot = self.calls.entry(fragment.index).or_insert_with(|| ToolCallDelta {
                index: fragment.index,
                ..Default::default()
            });
            if fragment.id.is_some() {
                slot.id.clone_from(&fragment.id);
            }
            if let Some(name) = &fragment.name {
                slot.name.get_or_insert_with(String::new).push_str(name);
            }
            if let Some(args) = &fragment.arguments {
                slot.arguments.get_or_insert_with(String::new).push_str(args);
            }
        }
        if let Some(usage) = delta.usage {
            self.usage = usage;
        }
    }

    pub fn finish(self) -> CompletionResponse {
        let tool_calls = self
            .calls
            .into_values()
            .map(|call| {
                ToolCall::function(
                    call.id
                        .filter(|id| !id.is_empty())
                        .unwrap_or_else(|| format!("call_{}", call.index)),
                    call.name.unwrap_or_default(),
                    call.arguments.unwrap_or_default(),
                )
            })
            .collect();
        CompletionResponse {
            content: (!self.content.is_empty()).then_some(self.content),
            tool_calls,
            usage: self.usage,
            model: None,
        }
    }
}

/// An LLM chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Stream a completion. The default performs a blocking completion and
    /// yields it as a single delta.
    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<CompletionDelta>>> {
        let response = self.complete(request).await?;
        let delta = CompletionDelta {
            content: response.content,
            tool_calls: response
                .tool_calls
                .into_iter()
                .enumerate()
                .map(|(index, call)| ToolCallDelta {
                    index,
                    id: Some(call.id),
                    name: Some(call.function.name),
                    arguments: Some(call.function.arguments),
                })
                .collect(),
            usage: Some(response.usage),
        };
        Ok(Box::pin(futures::stream::iter([Ok(delta)])))
    }
}

/// Build a provider by name using credentials from `config`.
///
/// Known names: `openai` and `openai-compatible` (requires a base URL).
pub fn create_provider(name: &str, config: &ColloquyConfig) -> Result<Arc<dyn CompletionProvider>> {
    match name {
        #[cfg(feature = "openai")]
        "openai" => {
            let api_key = config.get_api_key("openai").ok_or_else(|| {
                ColloquyError::Authentication("OPENAI_API_KEY is not set".into())
            })?;
            Ok(Arc::new(openai::OpenAiProvider::new(
                api_key,
                config.get_base_url("openai"),
            )))
        }
        #[cfg(feature = "openai")]
        "openai-compatible" => {
            let base_url = config.get_base_url("openai-compatible").ok_or_else(|| {
                ColloquyError::Configuration("OPENAI_COMPAT_BASE_URL is not set".into())
            })?;
            let api_key = config.get_api_key("openai-compatible").unwrap_or_default();
            Ok(Arc::new(
                openai::OpenAiProvider::new(api_key, Some(base_url))
                    .with_name("openai-compatible"),
            ))
        }
        other => Err(ColloquyError::Configuration(format!(
            "unknown provider '{other}'"
        ))),
    }
}
