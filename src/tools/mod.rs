//! Tool system for function calling.

pub mod arguments;
pub mod module;
pub mod registry;
pub mod spec;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use module::ToolModule;
pub use registry::ToolRegistry;
pub use spec::ToolSpec;
pub use tool::{FnTool, Tool, ToolExecutionContext};
pub use types::{ToolAttributes, ToolDefinition, ToolKind, ToolParameters};
