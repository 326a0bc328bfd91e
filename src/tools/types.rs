//! Tool schemas, definitions, and attributes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON Schema describing a tool's parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ToolParameters {
    pub schema: Value,
}

impl ToolParameters {
    pub fn from_schema(schema: Value) -> Self {
        Self { schema }
    }

    /// Object schema with no properties.
    pub fn empty() -> Self {
        Self::object().build()
    }

    pub fn object() -> ParameterBuilder {
        ParameterBuilder::default()
    }
}

/// Builder for object-typed parameter schemas.
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    /// Add a property with an arbitrary schema.
    pub fn property(mut self, name: impl Into<String>, schema: Value, required: bool) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    pub fn string(self, name: impl Into<String>, description: &str, required: bool) -> Self {
        self.typed(name, "string", description, required)
    }

    pub fn number(self, name: impl Into<String>, description: &str, required: bool) -> Self {
        self.typed(name, "number", description, required)
    }

    pub fn integer(self, name: impl Into<String>, description: &str, required: bool) -> Self {
        self.typed(name, "integer", description, required)
    }

    pub fn boolean(self, name: impl Into<String>, description: &str, required: bool) -> Self {
        self.typed(name, "boolean", description, required)
    }

    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: &str,
        values: &[&str],
        required: bool,
    ) -> Self {
        self.property(
            name,
            json!({ "type": "string", "description": description, "enum": values }),
            required,
        )
    }

    pub fn build(self) -> ToolParameters {
        ToolParameters {
            schema: json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }

    fn typed(self, name: impl Into<String>, kind: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": kind, "description": description }),
            required,
        )
    }
}

/// Function definition advertised to the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// Chat-completions wire shape: `{"type": "function", "function": {...}}`.
    pub fn to_chat_completion(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// How the agent loop treats a tool after it runs.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Standard,
    /// Running this tool hands control back to the caller.
    Interrupt,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolAttributes {
    #[serde(rename = "type", default)]
    pub kind: ToolKind,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolAttributes {
    pub fn interrupt() -> Self {
        Self {
            kind: ToolKind::Interrupt,
            extra: Map::new(),
        }
    }

    pub fn is_interrupt(&self) -> bool {
        self.kind == ToolKind::Interrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_collects_properties_and_required() {
        let params = ToolParameters::object()
            .string("query", "Search text", true)
            .integer("limit", "Max results", false)
            .string_enum("order", "Sort order", &["asc", "desc"], false)
            .build();

        assert_eq!(
            params.schema,
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search text" },
                    "limit": { "type": "integer", "description": "Max results" },
                    "order": { "type": "string", "description": "Sort order", "enum": ["asc", "desc"] },
                },
                "required": ["query"],
            })
        );
    }

    #[test]
    fn definition_uses_function_wire_shape() {
        let def = ToolDefinition {
            name: "notify".into(),
            description: "Send a note".into(),
            parameters: ToolParameters::empty().schema,
        };
        let wire = def.to_chat_completion();

        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "notify");
        assert_eq!(wire["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn attributes_deserialize_from_type_key() {
        let attrs: ToolAttributes =
            serde_json::from_value(json!({ "type": "interrupt", "reason": "approval" })).unwrap();

        assert!(attrs.is_interrupt());
        assert_eq!(attrs.extra["reason"], "approval");
        assert!(!ToolAttributes::default().is_interrupt());
    }
}
