//! Shared test helpers: a scripted completion provider and an in-memory file store.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use colloquy::error::{ColloquyError, Result};
use colloquy::files::{FileStore, StoredFile};
use colloquy::provider::{CompletionProvider, CompletionRequest, CompletionResponse};
use colloquy::types::{TokenUsage, ToolCall};

enum Scripted {
    Response(CompletionResponse),
    Error(ColloquyError),
}

/// A provider that replays queued responses and records every request.
#[derive(Default)]
pub struct MockProvider {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
    /// When set, an empty queue yields this tool call forever.
    repeat_tool_call: Mutex<Option<ToolCall>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a text response.
    pub fn queue_text(&self, text: &str) {
        self.push(Scripted::Response(CompletionResponse {
            content: Some(text.to_string()),
            usage: TokenUsage::new(10, 20),
            model: Some("mock-model".into()),
            ..Default::default()
        }));
    }

    /// Queue a response carrying a single tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: Value) {
        self.queue_tool_calls(vec![ToolCall::function(id, name, args.to_string())]);
    }

    pub fn queue_tool_calls(&self, calls: Vec<ToolCall>) {
        self.push(Scripted::Response(CompletionResponse {
            tool_calls: calls,
            usage: TokenUsage::new(10, 5),
            model: Some("mock-model".into()),
            ..Default::default()
        }));
    }

    pub fn queue_error(&self, error: ColloquyError) {
        self.push(Scripted::Error(error));
    }

    pub fn always_call(&self, id: &str, name: &str) {
        *self.repeat_tool_call.lock().unwrap() = Some(ToolCall::function(id, name, "{}"));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, scripted: Scripted) {
        self.queue.lock().unwrap().push_back(scripted);
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Error(error)) => Err(error),
            None => match self.repeat_tool_call.lock().unwrap().clone() {
                Some(call) => Ok(CompletionResponse {
                    tool_calls: vec![call],
                    ..Default::default()
                }),
                None => Ok(CompletionResponse {
                    content: Some("Mock response".into()),
                    ..Default::default()
                }),
            },
        }
    }
}

/// File store that keeps bytes in a map keyed by file id.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicUsize,
}

impl MemoryFileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn save(
        &self,
        content: &[u8],
        filename: &str,
        _mime_type: Option<&str>,
    ) -> Result<StoredFile> {
        let file_id = format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.files
            .lock()
            .unwrap()
            .insert(file_id.clone(), content.to_vec());
        Ok(StoredFile {
            storage_path: format!("mem/{file_id}/{filename}"),
            file_id,
            storage_backend: "memory".into(),
        })
    }

    async fn get(&self, file: &StoredFile) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&file.file_id)
            .cloned()
            .ok_or_else(|| ColloquyError::FileStore(format!("no file {}", file.file_id)))
    }

    fn url(&self, file: &StoredFile) -> String {
        format!("https://files.test/{}", file.storage_path)
    }
}
