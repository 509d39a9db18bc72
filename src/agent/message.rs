//! Native messages as produced by the agent runtime's streaming JSON output

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// One message from the agent run, before translation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NativeMessage {
    /// Runtime status; `subtype == "init"` marks the start of a run
    System {
        subtype: String,
        #[serde(default)]
        session_id: Option<String>,
    },

    Assistant { message: NativeContent },

    User { message: NativeContent },

    /// End-of-run marker carrying the run's own resumable session id
    Result {
        session_id: String,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        num_turns: Option<u32>,
    },

    /// Message types this crate does not translate
    #[serde(other)]
    Unknown,
}

impl NativeMessage {
    pub fn init(session_id: impl Into<String>) -> Self {
        NativeMessage::System {
            subtype: "init".to_string(),
            session_id: Some(session_id.into()),
        }
    }

    pub fn assistant(content: Vec<ContentItem>) -> Self {
        NativeMessage::Assistant {
            message: NativeContent { content },
        }
    }

    pub fn user(content: Vec<ContentItem>) -> Self {
        NativeMessage::User {
            message: NativeContent { content },
        }
    }

    pub fn result(session_id: impl Into<String>) -> Self {
        NativeMessage::Result {
            session_id: session_id.into(),
            subtype: Some("success".to_string()),
            is_error: false,
            num_turns: None,
        }
    }
}

/// Content payload of an assistant or user message
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NativeContent {
    #[serde(deserialize_with = "content_items")]
    pub content: Vec<ContentItem>,
}

/// A single content item
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default, deserialize_with = "nullable_content")]
        content: ToolResultContent,
        #[serde(default)]
        is_error: Option<bool>,
    },
    /// Thinking blocks and anything newer
    #[serde(other)]
    Other,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    pub fn tool_use(id: Option<&str>, name: impl Into<String>, input: Value) -> Self {
        ContentItem::ToolUse {
            id: id.map(str::to_string),
            name: name.into(),
            input,
        }
    }

    /// Tool result carrying a single text item
    pub fn tool_result(text: impl Into<String>) -> Self {
        ContentItem::ToolResult {
            tool_use_id: None,
            content: ToolResultContent::Items(vec![serde_json::json!({
                "type": "text",
                "text": text.into(),
            })]),
            is_error: None,
        }
    }
}

/// Tool result payload: either a bare string or a list of content items
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Items(Vec<Value>),
}

impl Default for ToolResultContent {
    fn default() -> Self {
        ToolResultContent::Items(Vec::new())
    }
}

impl ToolResultContent {
    /// Text of the first item, if it has any.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            ToolResultContent::Text(text) => Some(text),
            ToolResultContent::Items(items) => items.first()?.get("text")?.as_str(),
        }
    }
}

/// A tool result may carry `"content": null`; read it as empty.
fn nullable_content<'de, D>(deserializer: D) -> std::result::Result<ToolResultContent, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ToolResultContent>::deserialize(deserializer)?.unwrap_or_default())
}

/// User messages echo the prompt as a plain string; treat it as one text item.
///
/// List items are read one by one. An item that does not fit its declared
/// shape becomes [`ContentItem::Other`] so its siblings are still translated.
fn content_items<'de, D>(deserializer: D) -> std::result::Result<Vec<ContentItem>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Items(Vec<Value>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => vec![ContentItem::Text { text }],
        Raw::Items(items) => items.into_iter().map(content_item).collect(),
    })
}

fn content_item(value: Value) -> ContentItem {
    match ContentItem::deserialize(&value) {
        Ok(item) => item,
        Err(e) => {
            warn!("Ignoring malformed content item ({}): {}", e, value);
            ContentItem::Other
        }
    }
}
