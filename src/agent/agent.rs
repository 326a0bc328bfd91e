//! Agent construction and the public turn API.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::agent_loop::events::{AgentEvent, AgentEventSink, EventEmitter, TurnOutcome};
use crate::agent_loop::runner::TurnOptions;
use crate::config::AgentConfig;
use crate::error::{ColloquyError, Result};
use crate::files::FileStore;
use crate::provider::CompletionProvider;
use crate::registry::ComponentRegistry;
use crate::store::ThreadStore;
use crate::tools::{Tool, ToolRegistry, ToolSpec};
use crate::types::{Message, Thread};

use super::delegate::DelegateTool;

/// The thread a turn runs on: passed by value, or looked up in the
/// agent's thread store.
#[derive(Debug, Clone)]
pub enum ThreadInput {
    Thread(Thread),
    Id(String),
}

impl From<Thread> for ThreadInput {
    fn from(thread: Thread) -> Self {
        Self::Thread(thread)
    }
}

impl From<&str> for ThreadInput {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for ThreadInput {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// A configured agent. Cheap to clone; clones share provider, tools, and stores.
#[derive(Clone)]
pub struct Agent {
    pub(crate) config: Arc<AgentConfig>,
    pub(crate) provider: Arc<dyn CompletionProvider>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) thread_store: Option<Arc<dyn ThreadStore>>,
    pub(crate) file_store: Option<Arc<dyn FileStore>>,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn thread_store(&self) -> Option<&Arc<dyn ThreadStore>> {
        self.thread_store.as_ref()
    }

    /// Run one turn and return the updated thread with the new messages.
    ///
    /// On error the thread is dropped; use [`run_turn`](Self::run_turn) to
    /// keep partial progress in memory. With a thread store configured, the
    /// last completed step has already been saved.
    pub async fn go(&self, input: impl Into<ThreadInput>) -> Result<TurnOutcome> {
        let mut thread = self.resolve_thread(input.into()).await?;
        let new_messages = self.run_turn(&mut thread).await?;
        Ok(TurnOutcome {
            thread,
            new_messages,
        })
    }

    /// Run one turn in place. Messages appended before a failure stay in `thread`.
    pub async fn run_turn(&self, thread: &mut Thread) -> Result<Vec<Message>> {
        self.drive(thread, &TurnOptions::default()).await
    }

    /// Like [`run_turn`](Self::run_turn), aborting the pending completion or
    /// tool call when `cancel` fires.
    pub async fn run_turn_with_cancel(
        &self,
        thread: &mut Thread,
        cancel: CancellationToken,
    ) -> Result<Vec<Message>> {
        let options = TurnOptions {
            cancel: Some(cancel),
            ..Default::default()
        };
        self.drive(thread, &options).await
    }

    /// Run one turn with streamed completions, reporting progress to `sink`.
    ///
    /// The sink sees content chunks and message events; the outcome or error
    /// is returned rather than emitted.
    pub async fn run_turn_with_events(
        &self,
        thread: &mut Thread,
        sink: AgentEventSink,
    ) -> Result<Vec<Message>> {
        let options = TurnOptions {
            emitter: EventEmitter::new(sink),
            streaming: true,
            ..Default::default()
        };
        self.drive(thread, &options).await
    }

    /// Streaming variant of [`go`](Self::go).
    ///
    /// Yields content chunks and message events as the turn progresses, then
    /// exactly one `Complete` or `Error`. Dropping the stream abandons the turn.
    pub fn go_stream(&self, input: impl Into<ThreadInput>) -> BoxStream<'static, AgentEvent> {
        let agent = self.clone();
        let input = input.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let driver = async move {
            let sink_tx = tx.clone();
            let options = TurnOptions {
                emitter: EventEmitter::new(Arc::new(move |event| {
                    let _ = sink_tx.send(event);
                })),
                streaming: true,
                ..Default::default()
            };
            let last = match agent.resolve_thread(input).await {
                Ok(mut thread) => match agent.drive(&mut thread, &options).await {
                    Ok(new_messages) => AgentEvent::Complete {
                        outcome: TurnOutcome {
                            thread,
                            new_messages,
                        },
                    },
                    Err(e) => AgentEvent::Error {
                        message: e.to_string(),
                    },
                },
                Err(e) => AgentEvent::Error {
                    message: e.to_string(),
                },
            };
            let _ = tx.send(last);
        };

        // Events flow through the channel; the driver stream only polls the turn.
        let driver = futures::stream::once(driver).filter_map(|()| async { None::<AgentEvent> });
        futures::stream::select(UnboundedReceiverStream::new(rx), driver).boxed()
    }

    async fn resolve_thread(&self, input: ThreadInput) -> Result<Thread> {
        match input {
            ThreadInput::Thread(thread) => Ok(thread),
            ThreadInput::Id(id) => {
                let store = self.thread_store.as_ref().ok_or_else(|| {
                    ColloquyError::Configuration(
                        "a thread store is required to run a thread by id".into(),
                    )
                })?;
                store
                    .get(&id)
                    .await?
                    .ok_or(ColloquyError::ThreadNotFound(id))
            }
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.config.name)
            .field("model", &self.config.model_name)
            .field("provider", &self.provider.provider_name())
            .field("tools", &self.tools.names())
            .field("thread_store", &self.thread_store.is_some())
            .field("file_store", &self.file_store.is_some())
            .finish()
    }
}

enum StoreRef<T: ?Sized> {
    Direct(Arc<T>),
    Named(String),
}

/// Builder for [`Agent`]. Tool specs and named stores are resolved against
/// the [`ComponentRegistry`] once, in [`build`](Self::build).
#[derive(Default)]
pub struct AgentBuilder {
    config: AgentConfig,
    provider: Option<Arc<dyn CompletionProvider>>,
    tool_specs: Vec<ToolSpec>,
    components: ComponentRegistry,
    thread_store: Option<StoreRef<dyn ThreadStore>>,
    file_store: Option<StoreRef<dyn FileStore>>,
}

impl AgentBuilder {
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn components(mut self, components: ComponentRegistry) -> Self {
        self.components = components;
        self
    }

    pub fn tool_spec(mut self, spec: ToolSpec) -> Self {
        self.tool_specs.push(spec);
        self
    }

    /// Parse and add a `module` or `module:tool_a,tool_b` spec.
    pub fn tool_spec_str(self, spec: &str) -> Result<Self> {
        Ok(self.tool_spec(spec.parse()?))
    }

    pub fn tool(self, tool: impl Tool + 'static) -> Self {
        self.tool_spec(ToolSpec::custom(tool))
    }

    /// Let the model hand tasks to `agent` through a `delegate_to_{name}` tool.
    pub fn agent(self, name: impl Into<String>, agent: Agent) -> Self {
        self.tool(DelegateTool::new(name, agent))
    }

    pub fn thread_store(mut self, store: Arc<dyn ThreadStore>) -> Self {
        self.thread_store = Some(StoreRef::Direct(store));
        self
    }

    /// Use the thread store registered under `name` in the components.
    pub fn thread_store_named(mut self, name: impl Into<String>) -> Self {
        self.thread_store = Some(StoreRef::Named(name.into()));
        self
    }

    pub fn file_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.file_store = Some(StoreRef::Direct(store));
        self
    }

    pub fn file_store_named(mut self, name: impl Into<String>) -> Self {
        self.file_store = Some(StoreRef::Named(name.into()));
        self
    }

    pub fn build(self) -> Result<Agent> {
        self.config.validate()?;
        let provider = self.provider.ok_or_else(|| {
            ColloquyError::Configuration("an agent needs a completion provider".into())
        })?;

        let mut tools = ToolRegistry::new();
        for spec in &self.tool_specs {
            tools.register_spec(spec, &self.components)?;
        }

        let thread_store = match self.thread_store {
            Some(StoreRef::Direct(store)) => Some(store),
            Some(StoreRef::Named(name)) => Some(self.components.thread_store(&name).ok_or_else(
                || ColloquyError::Configuration(format!("thread store '{name}' is not registered")),
            )?),
            None => None,
        };
        let file_store = match self.file_store {
            Some(StoreRef::Direct(store)) => Some(store),
            Some(StoreRef::Named(name)) => Some(self.components.file_store(&name).ok_or_else(
                || ColloquyError::Configuration(format!("file store '{name}' is not registered")),
            )?),
            None => None,
        };

        Ok(Agent {
            config: Arc::new(self.config),
            provider,
            tools: Arc::new(tools),
            thread_store,
            file_store,
        })
    }
}
