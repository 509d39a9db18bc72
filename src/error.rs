//! Error types for codeint-agent

use thiserror::Error;

/// Result type alias for codeint-agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or driving an agent run
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The agent process exited abnormally. When the run was resuming a
    /// previous session this is the one failure the driver recovers from.
    #[error("Agent process failed (exit code {exit_code:?}): {stderr}")]
    Process {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Run error: {0}")]
    Run(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether this is a process-level failure of the agent run.
    pub fn is_process_failure(&self) -> bool {
        matches!(self, Error::Process { .. })
    }
}
