//! Agent configuration surface.

mod agent;
mod delegate;
pub mod prompt;

pub use agent::{Agent, AgentBuilder, ThreadInput};
pub use delegate::DelegateTool;
pub use prompt::render_system_prompt;
