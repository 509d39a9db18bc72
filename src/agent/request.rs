//! Caller-facing request for one conversation turn

use serde::{Deserialize, Serialize};

/// What the caller hands in: the task, plus whatever it persisted from the
/// previous turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub prompt: String,

    /// Run session id from the previous `RunCompleted` event
    #[serde(default, alias = "claude_session_id", skip_serializing_if = "Option::is_none")]
    pub run_resume_token: Option<String>,

    /// Code Interpreter session from the previous `SessionUpdated` event
    #[serde(default, alias = "code_int_session_id", skip_serializing_if = "Option::is_none")]
    pub sandbox_session_id: Option<String>,

    /// Outer runtime session, used only for log correlation
    #[serde(default, alias = "runtimeSessionId", skip_serializing_if = "Option::is_none")]
    pub runtime_session_id: Option<String>,
}

impl AgentRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_resume_token(mut self, token: impl Into<String>) -> Self {
        self.run_resume_token = Some(token.into());
        self
    }

    pub fn with_sandbox_session(mut self, id: impl Into<String>) -> Self {
        self.sandbox_session_id = Some(id.into());
        self
    }

    /// Resume token, with the empty string treated as absent
    pub fn resume_token(&self) -> Option<&str> {
        self.run_resume_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_runtime_payload_keys() {
        let request: AgentRequest = serde_json::from_str(
            r#"{
                "prompt": "plot it",
                "runtimeSessionId": "rt-1",
                "code_int_session_id": "sess-42",
                "claude_session_id": "t1"
            }"#,
        )
        .unwrap();

        assert_eq!(request.prompt, "plot it");
        assert_eq!(request.resume_token(), Some("t1"));
        assert_eq!(request.sandbox_session_id.as_deref(), Some("sess-42"));
        assert_eq!(request.runtime_session_id.as_deref(), Some("rt-1"));
    }

    #[test]
    fn test_empty_resume_token_is_absent() {
        let request = AgentRequest::new("hi").with_resume_token("");
        assert_eq!(request.resume_token(), None);
    }
}
