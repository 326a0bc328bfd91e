//! Convert threads into chat-completions message payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};

use crate::files::FileStore;
use crate::types::{Attachment, AttachmentData, AttachmentStatus, Content, ContentPart, Message, Role, Thread};

/// Render a tool result as message content: strings verbatim, everything else as JSON.
pub(crate) fn tool_result_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// All messages of `thread`, in order, in provider wire format.
pub fn format_thread(thread: &Thread, file_store: Option<&dyn FileStore>) -> Vec<Value> {
    thread
        .messages()
        .iter()
        .map(|m| format_message(m, file_store))
        .collect()
}

pub fn format_message(message: &Message, file_store: Option<&dyn FileStore>) -> Value {
    let mut out = Map::new();
    out.insert("role".into(), Value::String(message.role().to_string()));
    out.insert("content".into(), render_content(message, file_store));

    if let Some(name) = message.name() {
        out.insert("name".into(), Value::String(name.to_string()));
    }
    match message.role() {
        Role::Assistant if !message.tool_calls().is_empty() => {
            out.insert("tool_calls".into(), json!(message.tool_calls()));
        }
        Role::Tool => {
            if let Some(id) = message.tool_call_id() {
                out.insert("tool_call_id".into(), Value::String(id.to_string()));
            }
        }
        _ => {}
    }
    Value::Object(out)
}

fn render_content(message: &Message, file_store: Option<&dyn FileStore>) -> Value {
    if message.attachments().is_empty() {
        return json!(message.content());
    }

    let mut parts = match message.content() {
        Content::Text(text) => vec![ContentPart::text(text.clone())],
        Content::Parts(parts) => parts.clone(),
    };
    for attachment in message.attachments() {
        if matches!(attachment.status(), AttachmentStatus::Failed { .. }) && !attachment.is_image() {
            parts.push(ContentPart::text(describe_file(attachment, None)));
            continue;
        }
        if attachment.is_image() {
            if let Some(url) = image_url(attachment, file_store) {
                parts.push(ContentPart::image_url(url));
                continue;
            }
        }
        let url = attachment
            .stored_file()
            .zip(file_store)
            .map(|(file, store)| store.url(file));
        parts.push(ContentPart::text(describe_file(attachment, url.as_deref())));
    }

    if parts.iter().all(|p| matches!(p, ContentPart::Text { .. })) {
        return Value::String(Content::Parts(parts).text());
    }
    json!(parts)
}

fn image_url(attachment: &Attachment, file_store: Option<&dyn FileStore>) -> Option<String> {
    match attachment.data() {
        AttachmentData::Stored(file) => file_store.map(|store| store.url(file)),
        AttachmentData::Inline { bytes } => Some(format!(
            "data:{};base64,{}",
            attachment.mime_type().unwrap_or("application/octet-stream"),
            STANDARD.encode(bytes)
        )),
    }
}

fn describe_file(attachment: &Attachment, url: Option<&str>) -> String {
    let mut text = format!("\n--- File: {} ---", attachment.filename());
    if let Some(url) = url {
        text.push_str(&format!("\nURL: {url}"));
    }
    if let Some(processed) = attachment.processed_content() {
        for (key, label) in [("overview", "Overview: "), ("text", "Content:\n"), ("error", "Error: ")] {
            if let Some(value) = processed.get(key) {
                text.push('\n');
                text.push_str(label);
                text.push_str(&tool_result_to_string(value));
            }
        }
    }
    if let AttachmentStatus::Failed { error } = attachment.status() {
        text.push_str(&format!("\nError: {error}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::StoredFile;
    use crate::types::ToolCall;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_messages_keep_their_text() {
        let msg = Message::user("Hello!");
        assert_eq!(
            format_message(&msg, None),
            json!({ "role": "user", "content": "Hello!" })
        );
    }

    #[test]
    fn assistant_tool_calls_and_tool_replies_are_correlated() {
        let call = ToolCall::function("call_7", "lookup", "{}");
        let assistant = Message::assistant_with_tool_calls("", vec![call]);
        let reply = Message::tool("call_7", "lookup", "found").unwrap();

        let a = format_message(&assistant, None);
        let r = format_message(&reply, None);

        assert_eq!(a["tool_calls"][0]["id"], "call_7");
        assert_eq!(a["tool_calls"][0]["function"]["name"], "lookup");
        assert_eq!(r["tool_call_id"], "call_7");
        assert_eq!(r["name"], "lookup");
        assert_eq!(r["role"], "tool");
    }

    #[test]
    fn inline_image_becomes_data_url_part() {
        let msg = Message::user("what is this?")
            .with_attachment(Attachment::from_bytes("cat.png", vec![0x89, 0x50]));

        let content = &format_message(&msg, None)["content"];

        assert_eq!(content[0], json!({ "type": "text", "text": "what is this?" }));
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,iVA=");
    }

    #[test]
    fn document_attachment_appends_processed_text() {
        let doc = Attachment::stored(
            "notes.txt",
            StoredFile {
                file_id: "f1".into(),
                storage_path: "a/notes.txt".into(),
                storage_backend: "test".into(),
            },
        )
        .with_processed_content(json!({ "overview": "Meeting notes", "text": "Ship Friday" }));
        let msg = Message::user("summarize").with_attachment(doc);

        let content = format_message(&msg, None)["content"].clone();

        assert_eq!(
            content,
            json!("summarize\n--- File: notes.txt ---\nOverview: Meeting notes\nContent:\nShip Friday")
        );
    }

    #[test]
    fn tool_results_render_as_strings() {
        assert_eq!(tool_result_to_string(&json!("plain")), "plain");
        assert_eq!(tool_result_to_string(&json!({ "a": 1 })), r#"{"a":1}"#);
        assert_eq!(tool_result_to_string(&json!(null)), "null");
    }
}
