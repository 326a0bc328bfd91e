//! Declarative tool selection resolved once at agent construction.

use std::str::FromStr;
use std::sync::Arc;

use super::tool::Tool;
use crate::error::{ColloquyError, Result};

/// Which tools an agent should expose.
#[derive(Clone)]
pub enum ToolSpec {
    /// Every tool of a registered module.
    Module(String),
    /// A subset of a module, written `module:tool_a,tool_b`.
    Selected { module: String, tools: Vec<String> },
    /// An ad-hoc tool object.
    Custom(Arc<dyn Tool>),
}

impl ToolSpec {
    pub fn module(name: impl Into<String>) -> Self {
        Self::Module(name.into())
    }

    pub fn custom(tool: impl Tool + 'static) -> Self {
        Self::Custom(Arc::new(tool))
    }
}

impl FromStr for ToolSpec {
    type Err = ColloquyError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some((module, selection)) = s.split_once(':') else {
            if s.is_empty() {
                return Err(ColloquyError::Configuration("empty tool spec".into()));
            }
            return Ok(Self::Module(s.to_string()));
        };

        let module = module.trim();
        let tools: Vec<String> = selection
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if module.is_empty() || tools.is_empty() {
            return Err(ColloquyError::Configuration(format!(
                "tool spec '{s}' must look like 'module:tool_a,tool_b'"
            )));
        }
        Ok(Self::Selected {
            module: module.to_string(),
            tools,
        })
    }
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module(name) => f.debug_tuple("Module").field(name).finish(),
            Self::Selected { module, tools } => f
                .debug_struct("Selected")
                .field("module", module)
                .field("tools", tools)
                .finish(),
            Self::Custom(tool) => f.debug_tuple("Custom").field(&tool.name()).finish(),
        }
    }
}
