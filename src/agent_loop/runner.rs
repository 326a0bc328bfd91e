//! The turn loop: completion, tool dispatch, iteration limit.

use std::future::Future;

use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{AgentEvent, EventEmitter};
use crate::agent::{render_system_prompt, Agent};
use crate::error::{ColloquyError, Result};
use crate::provider::format::format_thread;
use crate::provider::{CompletionAccumulator, CompletionRequest, CompletionResponse};
use crate::types::{Message, MessageMetrics, Role, Thread, Timing};

/// Content of the assistant message appended when a turn runs out of tool rounds.
pub const MAX_ITERATIONS_MESSAGE: &str =
    "Maximum tool iteration count reached. Stopping further tool calls.";

/// Content of the tool message answering calls left unrun after an interrupt tool.
pub const INTERRUPTED_CALL_MESSAGE: &str = "Skipped: the turn was interrupted before this call ran.";

#[derive(Clone, Default)]
pub(crate) struct TurnOptions {
    pub(crate) emitter: EventEmitter,
    pub(crate) cancel: Option<CancellationToken>,
    /// Request streamed completions and emit content chunks.
    pub(crate) streaming: bool,
}

impl Agent {
    pub(crate) async fn drive(
        &self,
        thread: &mut Thread,
        options: &TurnOptions,
    ) -> Result<Vec<Message>> {
        let thread_id = thread.id().to_string();
        let cancel = options.cancel.as_ref();

        thread.ensure_system_prompt(&render_system_prompt(
            &self.config,
            Utc::now().date_naive(),
        ));
        cancellable(cancel, self.store_pending_attachments(thread)).await?;

        let mut new_messages = Vec::new();
        let mut iteration = 0;
        loop {
            if iteration >= self.config.max_tool_iterations {
                warn!(
                    thread_id = %thread_id,
                    max = self.config.max_tool_iterations,
                    "tool iteration limit reached"
                );
                let message = Message::assistant(MAX_ITERATIONS_MESSAGE);
                append(thread, message, &mut new_messages, options);
                self.save(thread).await?;
                break;
            }

            debug!(thread_id = %thread_id, iteration, "requesting completion");
            let started = Utc::now();
            let response = cancellable(cancel, self.complete(thread, options)).await?;
            let timing = Timing::between(started, Utc::now());
            debug!(
                thread_id = %thread_id,
                latency_ms = timing.latency_ms,
                tool_calls = response.tool_calls.len(),
                "completion received"
            );

            let tool_calls = response.tool_calls;
            let mut assistant = Message::assistant_with_tool_calls(
                response.content.unwrap_or_default(),
                tool_calls.clone(),
            );
            assistant.record_metrics(MessageMetrics {
                model: response
                    .model
                    .or_else(|| Some(self.config.model_name.clone())),
                timing,
                usage: response.usage,
            });
            append(thread, assistant, &mut new_messages, options);

            if tool_calls.is_empty() {
                self.save(thread).await?;
                break;
            }

            let mut interrupted = false;
            for call in &tool_calls {
                if interrupted {
                    // Every call needs an answer or the next completion is rejected.
                    let skipped = Message::tool(&call.id, call.name(), INTERRUPTED_CALL_MESSAGE)?;
                    append(thread, skipped, &mut new_messages, options);
                    continue;
                }
                debug!(thread_id = %thread_id, tool = %call.name(), call_id = %call.id, "dispatching tool call");
                let message =
                    cancellable(cancel, self.tools.execute(call, Some(&thread_id))).await?;
                append(thread, message, &mut new_messages, options);

                if self.tools.is_interrupt(call.name()) {
                    info!(thread_id = %thread_id, tool = %call.name(), "interrupt tool ran, ending turn");
                    interrupted = true;
                }
            }
            self.save(thread).await?;
            if interrupted {
                break;
            }
            iteration += 1;
        }

        info!(thread_id = %thread_id, new_messages = new_messages.len(), "turn complete");
        Ok(new_messages)
    }

    async fn complete(&self, thread: &Thread, options: &TurnOptions) -> Result<CompletionResponse> {
        let request = CompletionRequest {
            model: self.config.model_name.clone(),
            messages: format_thread(thread, self.file_store.as_deref()),
            tools: self.tools.definitions(),
            temperature: Some(self.config.temperature),
        };
        if !options.streaming {
            return self.provider.complete(&request).await;
        }

        let mut stream = self.provider.stream(&request).await?;
        let mut accumulator = CompletionAccumulator::default();
        while let Some(delta) = stream.next().await {
            let delta = delta?;
            if let Some(text) = &delta.content {
                options.emitter.emit(AgentEvent::ContentChunk { text: text.clone() });
            }
            accumulator.push(&delta);
        }
        Ok(accumulator.finish())
    }

    /// Push pending attachments of the most recent user message into the file store.
    async fn store_pending_attachments(&self, thread: &mut Thread) -> Result<()> {
        let Some(store) = self.file_store.as_deref() else {
            return Ok(());
        };
        let Some(index) = thread.messages().iter().rposition(|m| m.role() == Role::User) else {
            return Ok(());
        };
        for attachment in thread.messages_mut()[index].attachments_mut() {
            attachment.ensure_stored(store).await;
        }
        Ok(())
    }

    async fn save(&self, thread: &Thread) -> Result<()> {
        if let Some(store) = &self.thread_store {
            store.save(thread).await?;
        }
        Ok(())
    }
}

fn append(
    thread: &mut Thread,
    message: Message,
    new_messages: &mut Vec<Message>,
    options: &TurnOptions,
) {
    thread.add_message(message);
    let Some(added) = thread.messages().last() else {
        return;
    };
    new_messages.push(added.clone());
    let message = added.clone();
    options.emitter.emit(match message.role() {
        Role::Tool => AgentEvent::ToolMessage { message },
        _ => AgentEvent::AssistantMessage { message },
    });
}

async fn cancellable<T>(
    cancel: Option<&CancellationToken>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(ColloquyError::Cancelled),
            result = fut => result,
        },
        None => fut.await,
    }
}
