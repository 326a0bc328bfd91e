//! OpenAI (and OpenAI-compatible) Chat Completions provider.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::{ColloquyError, Result};
use crate::types::{TokenUsage, ToolCall};

use super::http::{bearer_headers, parse_sse_data, shared_client, status_to_error, LineBuffer};
use super::{CompletionDelta, CompletionProvider, CompletionRequest, CompletionResponse, ToolCallDelta};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    name: String,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            name: "openai".to_string(),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Override the name reported by [`CompletionProvider::provider_name`].
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn build_request_body(&self, request: &CompletionRequest, stream: bool) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
            "stream": stream,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(temp) = request.temperature {
                obj.insert("temperature".into(), json!(temp));
            }
            if !request.tools.is_empty() {
                let tools: Vec<Value> = request.tools.iter().map(|t| t.to_chat_completion()).collect();
                obj.insert("tools".into(), Value::Array(tools));
            }
            if stream {
                obj.insert("stream_options".into(), json!({ "include_usage": true }));
            }
        }
        body
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = shared_client()?
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        debug!(provider = %self.name, model = %request.model, "chat completion");
        let resp = self.post(&self.build_request_body(request, false)).await?;

        let data: ChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ColloquyError::Provider {
                provider: self.name.clone(),
                message: "response contained no choices".into(),
            })?;

        Ok(CompletionResponse {
            content: choice.message.content.filter(|c| !c.is_empty()),
            tool_calls: choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| ToolCall::function(tc.id, tc.function.name, tc.function.arguments))
                .collect(),
            usage: data.usage.map(WireUsage::into_usage).unwrap_or_default(),
            model: data.model,
        })
    }

    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<BoxStream<'static, Result<CompletionDelta>>> {
        debug!(provider = %self.name, model = %request.model, "streaming chat completion");
        let resp = self.post(&self.build_request_body(request, true)).await?;
        let byte_stream = resp.bytes_stream();

        let provider = self.name.clone();
        let stream = async_stream::stream! {
            let mut lines = LineBuffer::default();
            futures::pin_mut!(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ColloquyError::Network(e));
                        break;
                    }
                };
                for line in lines.push(&chunk) {
                    if let Some(item) = decode_stream_line(&provider, &line) {
                        let failed = item.is_err();
                        yield item;
                        if failed {
                            return;
                        }
                    }
                }
            }
            if let Some(line) = lines.finish() {
                if let Some(item) = decode_stream_line(&provider, &line) {
                    yield item;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// One SSE line as a delta, an in-band provider error, or nothing.
fn decode_stream_line(provider: &str, line: &str) -> Option<Result<CompletionDelta>> {
    let data = parse_sse_data(line.trim())?;
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => Some(chunk.into_delta(provider)),
        Err(e) => {
            trace!(error = %e, "skipping unparseable stream chunk");
            None
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl WireUsage {
    fn into_usage(self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens,
        }
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<StreamToolCall>,
}

#[derive(Deserialize)]
struct StreamToolCall {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunction>,
}

#[derive(Deserialize)]
struct StreamFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

impl StreamChunk {
    fn into_delta(self, provider: &str) -> Result<CompletionDelta> {
        if let Some(error) = self.error {
            let message = match error.kind {
                Some(kind) => format!("{} ({kind})", error.message),
                None => error.message,
            };
            return Err(ColloquyError::Provider {
                provider: provider.to_string(),
                message,
            });
        }
        let delta = self
            .choices
            .into_iter()
            .next()
            .map(|c| c.delta)
            .unwrap_or_default();
        Ok(CompletionDelta {
            content: delta.content.filter(|c| !c.is_empty()),
            tool_calls: delta
                .tool_calls
                .into_iter()
                .map(|tc| {
                    let (name, arguments) = tc
                        .function
                        .map(|f| (f.name, f.arguments))
                        .unwrap_or_default();
                    ToolCallDelta {
                        index: tc.index,
                        id: tc.id,
                        name,
                        arguments,
                    }
                })
                .collect(),
            usage: self.usage.map(WireUsage::into_usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolDefinition, ToolParameters};

    #[test]
    fn request_body_includes_tools_and_temperature() {
        let provider = OpenAiProvider::new("sk", None);
        let request = CompletionRequest {
            model: "gpt-4o".into(),
            messages: vec![json!({ "role": "user", "content": "hi" })],
            tools: vec![ToolDefinition {
                name: "lookup".into(),
                description: "Look something up".into(),
                parameters: ToolParameters::empty().schema,
            }],
            temperature: Some(0.5),
        };

        let body = provider.build_request_body(&request, false);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], false);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["tools"][0]["function"]["name"], "lookup");
        assert!(body.get("stream_options").is_none());
    }

    #[test]
    fn tools_are_omitted_when_none_registered() {
        let provider = OpenAiProvider::new("sk", Some("http://localhost:1234/v1/".into()));
        let body = provider.build_request_body(&CompletionRequest::default(), true);

        assert!(body.get("tools").is_none());
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(provider.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn stream_chunk_maps_tool_call_fragments() {
        let chunk: StreamChunk = serde_json::from_value(json!({
            "choices": [{
                "delta": {
                    "tool_calls": [{
                        "index": 0,
                        "id": "call_1",
                        "function": { "name": "lookup", "arguments": "{\"q\"" }
                    }]
                }
            }]
        }))
        .unwrap();

        let delta = chunk.into_delta("openai").unwrap();

        assert_eq!(delta.content, None);
        assert_eq!(delta.tool_calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(delta.tool_calls[0].arguments.as_deref(), Some("{\"q\""));
    }

    #[test]
    fn usage_only_chunk_has_no_choices() {
        let chunk: StreamChunk = serde_json::from_value(json!({
            "choices": [],
            "usage": { "prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7 }
        }))
        .unwrap();

        let delta = chunk.into_delta("openai").unwrap();
        assert_eq!(delta.usage, Some(TokenUsage::new(5, 2)));
        assert!(delta.tool_calls.is_empty());
    }

    #[test]
    fn error_chunk_becomes_provider_error() {
        let chunk: StreamChunk = serde_json::from_value(json!({
            "error": { "message": "Model is overloaded", "type": "server_error" }
        }))
        .unwrap();

        let err = chunk.into_delta("openai").unwrap_err();
        assert!(
            matches!(&err, ColloquyError::Provider { provider, message }
                if provider == "openai" && message == "Model is overloaded (server_error)"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn done_and_comment_lines_yield_nothing() {
        assert!(decode_stream_line("openai", "data: [DONE]").is_none());
        assert!(decode_stream_line("openai", ": keep-alive").is_none());
        assert!(decode_stream_line("openai", "").is_none());
    }
}
