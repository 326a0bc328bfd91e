//! Colloquy: conversational agents over OpenAI-compatible chat models.
//!
//! Threads hold ordered messages, a [`ToolRegistry`](tools::ToolRegistry)
//! exposes callable tools, and an [`Agent`](agent::Agent) runs turns that
//! alternate model completions with tool execution until the model answers
//! without calling tools.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use colloquy::prelude::*;
//!
//! # async fn example() -> colloquy::error::Result<()> {
//! let config = ColloquyConfig::from_env();
//! let agent = Agent::builder()
//!     .provider(create_provider("openai", &config)?)
//!     .thread_store(Arc::new(MemoryThreadStore::new()))
//!     .build()?;
//!
//! let mut thread = Thread::new();
//! thread.add_message(Message::user("Hello!"));
//! let outcome = agent.go(thread).await?;
//! if let Some(reply) = outcome.new_messages.last() {
//!     println!("{}", reply.text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failed turns
//!
//! [`Agent::go`](agent::Agent::go) takes the thread by value and returns
//! only the error when a turn fails. To keep the messages appended before
//! the failure, run the turn in place with
//! [`Agent::run_turn`](agent::Agent::run_turn):
//!
//! ```no_run
//! # use colloquy::prelude::*;
//! # async fn example(agent: Agent, mut thread: Thread) {
//! match agent.run_turn(&mut thread).await {
//!     Ok(new_messages) => println!("{} new messages", new_messages.len()),
//!     Err(e) if e.is_retryable() => println!("retry later; {} messages kept", thread.len()),
//!     Err(e) => eprintln!("turn failed: {e}"),
//! }
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod files;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod store;
pub mod tools;
pub mod types;
