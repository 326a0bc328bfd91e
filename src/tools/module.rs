//! Named groups of tools that can be registered together.

use std::sync::Arc;

use super::tool::Tool;

/// A named collection of tools, e.g. `"notion"` or `"web"`.
#[derive(Clone)]
pub struct ToolModule {
    name: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    pub fn with_tool(self, tool: impl Tool + 'static) -> Self {
        self.with_shared_tool(Arc::new(tool))
    }

    pub fn with_shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn get(&self, tool_name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == tool_name)
    }
}

impl std::fmt::Debug for ToolModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("ToolModule")
            .field("name", &self.name)
            .field("tools", &names)
            .finish()
    }
}
