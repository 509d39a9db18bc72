//! Normalized events - the externally visible output of a conversation

use serde::Serialize;
use serde_json::Value;

/// One translated event, yielded to the caller as it happens
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizedEvent {
    /// The agent asked for a tool to run
    ToolInvoked {
        name: String,
        input: Value,
        invocation_id: String,
    },

    /// Literal assistant text
    TextChunk { text: String },

    /// A tool result established a (new) Code Interpreter session; the caller
    /// should persist it for the next request.
    SessionUpdated { new_session_id: String },

    /// The run finished; `run_session_id` resumes it later.
    RunCompleted { run_session_id: String },
}

impl NormalizedEvent {
    pub fn text(text: impl Into<String>) -> Self {
        NormalizedEvent::TextChunk { text: text.into() }
    }

    pub fn session_updated(id: impl Into<String>) -> Self {
        NormalizedEvent::SessionUpdated {
            new_session_id: id.into(),
        }
    }

    pub fn run_completed(id: impl Into<String>) -> Self {
        NormalizedEvent::RunCompleted {
            run_session_id: id.into(),
        }
    }
}
