//! Translation of native run messages into normalized events.
//!
//! The translator owns the conversation's sandbox session state and its text
//! transcript. It is created once per conversation and survives a retry, so a
//! session established in a failed attempt is still known to the next one.

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::event::NormalizedEvent;
use super::message::{ContentItem, NativeMessage, ToolResultContent};

/// Field carrying the Code Interpreter session id in tool results
pub const SESSION_ID_FIELD: &str = "code_int_session_id";

/// Code Interpreter session tracked across a conversation.
///
/// The empty string means no session has been established yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxSession {
    id: String,
}

impl SandboxSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_established(&self) -> bool {
        !self.id.is_empty()
    }

    /// Adopt a non-empty session id reported by a tool.
    fn replace(&mut self, id: &str) {
        debug_assert!(!id.is_empty());
        self.id = id.to_string();
    }
}

/// Events produced by one native message
#[derive(Debug, Default, PartialEq)]
pub struct Translation {
    pub events: Vec<NormalizedEvent>,
    /// The message was the run-completion marker
    pub completed: bool,
}

/// Per-conversation translation state
#[derive(Debug, Default)]
pub struct Translator {
    session: SandboxSession,
    transcript: Vec<String>,
}

impl Translator {
    pub fn new(session: SandboxSession) -> Self {
        Self {
            session,
            transcript: Vec::new(),
        }
    }

    pub fn session(&self) -> &SandboxSession {
        &self.session
    }

    /// All text chunks seen so far, in order
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Translate one native message. Events keep the order of the message's
    /// content items.
    pub fn translate(&mut self, message: NativeMessage) -> Translation {
        let mut translation = Translation::default();

        match message {
            NativeMessage::System { subtype, session_id } => {
                if subtype == "init" {
                    info!("Agent run init: {}", session_id.as_deref().unwrap_or("<none>"));
                } else {
                    debug!("System message: {}", subtype);
                }
            }
            NativeMessage::Assistant { message } => {
                for item in message.content {
                    match item {
                        ContentItem::ToolUse { id, name, input } => {
                            info!("TOOL USE: {}", name);
                            translation.events.push(NormalizedEvent::ToolInvoked {
                                invocation_id: invocation_id(id.as_deref(), &name),
                                name,
                                input,
                            });
                        }
                        ContentItem::Text { text } => {
                            info!("Agent response: {}", text);
                            self.transcript.push(text.clone());
                            translation.events.push(NormalizedEvent::TextChunk { text });
                        }
                        ContentItem::ToolResult { .. } | ContentItem::Other => {}
                    }
                }
            }
            NativeMessage::User { message } => {
                for item in message.content {
                    if let ContentItem::ToolResult { content, .. } = item {
                        if let Some(id) = session_id_from(&content) {
                            info!("Code Interpreter session: {}", id);
                            self.session.replace(&id);
                            translation.events.push(NormalizedEvent::SessionUpdated {
                                new_session_id: id,
                            });
                        }
                    }
                }
            }
            NativeMessage::Result { session_id, is_error, subtype, .. } => {
                if is_error {
                    warn!(
                        "Run finished with error ({}), session_id={}",
                        subtype.as_deref().unwrap_or("unknown"),
                        session_id
                    );
                } else {
                    info!("Run result received, session_id={}", session_id);
                }
                translation.events.push(NormalizedEvent::RunCompleted {
                    run_session_id: session_id,
                });
                translation.completed = true;
            }
            NativeMessage::Unknown => debug!("Skipping untranslated message"),
        }

        translation
    }
}

/// `tool-<id>` when the runtime supplied an id, else a stable id from the name
pub fn invocation_id(id: Option<&str>, name: &str) -> String {
    match id.filter(|id| !id.is_empty()) {
        Some(id) => format!("tool-{}", id),
        None => {
            let digest = Sha256::digest(name.as_bytes());
            let hex = format!("{:x}", digest);
            format!("tool-{}", &hex[..16])
        }
    }
}

/// Session id from a tool result whose first text item is a JSON object with
/// a non-empty session field. Anything else yields `None`.
fn session_id_from(content: &ToolResultContent) -> Option<String> {
    let text = content.first_text()?;
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let id = value.as_object()?.get(SESSION_ID_FIELD)?.as_str()?;
    (!id.is_empty()).then(|| id.to_string())
}
