//! Agent turn loop and its event stream.

pub mod events;
pub(crate) mod runner;

pub use events::{AgentEvent, AgentEventSink, TurnOutcome};
pub use runner::{INTERRUPTED_CALL_MESSAGE, MAX_ITERATIONS_MESSAGE};
