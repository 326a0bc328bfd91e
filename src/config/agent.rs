use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};

/// Agent settings, loadable from TOML.
///
/// ```toml
/// model_name = "gpt-4o-mini"
/// name = "Scout"
/// purpose = "Answer support questions."
/// max_tool_iterations = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Builder)]
#[serde(default)]
pub struct AgentConfig {
    #[builder(into, default = "gpt-4o".to_string())]
    pub model_name: String,
    #[builder(default = 0.7)]
    pub temperature: f32,
    #[builder(into, default = "Colloquy".to_string())]
    pub name: String,
    #[builder(into, default = "To be a helpful assistant.".to_string())]
    pub purpose: String,
    #[builder(into, default)]
    pub notes: String,
    /// Tool dispatch rounds allowed per turn before the loop stops.
    #[builder(default = 10)]
    pub max_tool_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AgentConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ColloquyError::Configuration(format!("invalid agent config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// `<config dir>/colloquy/agent.toml` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "colloquy")
            .map(|dirs| dirs.config_dir().join("agent.toml"))
    }

    /// Load from [`default_path`](Self::default_path), falling back to defaults
    /// when no file exists.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ColloquyError::Configuration(format!("cannot encode agent config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(ColloquyError::Configuration("model_name must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ColloquyError::Configuration(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}
