//! Tests for the tool system.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use colloquy::error::ColloquyError;
use colloquy::registry::{Component, ComponentRegistry};
use colloquy::tools::*;
use colloquy::types::{Role, ToolCall};

fn echo_tool(name: &str) -> FnTool {
    FnTool::new(
        name,
        "Echo the text argument",
        ToolParameters::object().string("text", "Text to echo", true).build(),
        |args, _ctx| async move { Ok::<_, ColloquyError>(json!(args.get_str("text")?)) },
    )
}

fn text_module() -> ToolModule {
    ToolModule::new("text")
        .with_tool(echo_tool("echo"))
        .with_tool(echo_tool("shout"))
}

#[test]
fn parameter_builder_constructs_schema() {
    let params = ToolParameters::object()
        .string("query", "Search query", true)
        .number("limit", "Max results", false)
        .boolean("verbose", "Enable verbose output", false)
        .build();

    let schema = &params.schema;
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["query"]["type"], "string");
    assert_eq!(schema["properties"]["limit"]["type"], "number");
    assert_eq!(schema["required"], json!(["query"]));
}

#[test]
fn definition_renders_chat_completion_shape() {
    let definition = echo_tool("echo").definition();

    let wire = definition.to_chat_completion();

    assert_eq!(wire["type"], "function");
    assert_eq!(wire["function"]["name"], "echo");
    assert_eq!(wire["function"]["parameters"]["properties"]["text"]["type"], "string");
}

#[test]
fn tool_arguments_accessors() {
    let args = ToolArguments::new(json!({"name": "Alice", "age": 30, "active": true}));
    assert_eq!(args.get_str("name").unwrap(), "Alice");
    assert_eq!(args.get_i64("age").unwrap(), 30);
    assert!(args.get_bool("active").unwrap());
    assert!(args.get_str("missing").is_err());
    assert_eq!(args.get_str_opt("missing"), None);
}

#[test]
fn registry_rejects_invalid_names() {
    let mut registry = ToolRegistry::new();

    let err = registry.register(Arc::new(echo_tool("has space"))).unwrap_err();

    assert!(matches!(err, ColloquyError::Configuration(_)));
    assert!(registry.is_empty());
}

#[test]
fn registering_same_name_replaces_in_place() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(echo_tool("a"))).unwrap();
    registry.register(Arc::new(echo_tool("b"))).unwrap();
    registry.register(Arc::new(echo_tool("a"))).unwrap();

    assert_eq!(registry.names(), vec!["a", "b"]);
    assert_eq!(registry.definitions().len(), 2);
}

#[test]
fn spec_resolves_selected_tools_from_components() {
    let components = ComponentRegistry::new();
    components.register("text", Component::ToolModule(Arc::new(text_module())));

    let mut registry = ToolRegistry::new();
    let spec: ToolSpec = "text:shout".parse().unwrap();
    registry.register_spec(&spec, &components).unwrap();

    assert_eq!(registry.names(), vec!["shout"]);

    let missing: ToolSpec = "text:whisper".parse().unwrap();
    let err = registry.register_spec(&missing, &components).unwrap_err();
    assert!(matches!(err, ColloquyError::Configuration(_)));
}

#[tokio::test]
async fn execute_turns_results_and_failures_into_tool_messages() {
    let mut registry = ToolRegistry::new();
    registry.register_module(&text_module()).unwrap();

    let ok = registry
        .execute(&ToolCall::function("c1", "echo", r#"{"text":"hi"}"#), Some("t1"))
        .await
        .unwrap();
    assert_eq!(ok.role(), Role::Tool);
    assert_eq!(ok.tool_call_id(), Some("c1"));
    assert_eq!(ok.text(), "hi");

    let missing_arg = registry
        .execute(&ToolCall::function("c2", "echo", "{}"), None)
        .await
        .unwrap();
    assert!(missing_arg.text().starts_with("Error executing tool:"));

    let bad_json = registry
        .execute(&ToolCall::function("c3", "echo", "{not json"), None)
        .await
        .unwrap();
    assert!(bad_json.text().starts_with("Error executing tool:"));
}

#[tokio::test]
async fn tool_sees_thread_and_call_ids() {
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(FnTool::new(
            "whoami",
            "Report the execution context",
            ToolParameters::empty(),
            |_args, ctx| async move {
                Ok::<_, ColloquyError>(json!({
                    "thread": ctx.thread_id,
                    "call": ctx.tool_call_id,
                }))
            },
        )))
        .unwrap();

    let message = registry
        .execute(&ToolCall::function("call_7", "whoami", ""), Some("thread-3"))
        .await
        .unwrap();

    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&message.text()).unwrap(),
        json!({"thread": "thread-3", "call": "call_7"})
    );
}
