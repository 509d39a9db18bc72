//! Agent module: core conversation logic.
//!
//! This module contains:
//! - Native message types (what the agent run emits)
//! - Normalized events (what the caller sees)
//! - Sub-agent catalog and run configuration
//! - Translator and conversation driver
//!
//! # Running a conversation
//!
//! ```ignore
//! let builder = RunConfigBuilder::new(&config, gateway.as_ref());
//! let driver = ConversationDriver::new(ProcessRunService::new(&config.cli_path), builder);
//! let mut events = driver.run_conversation(AgentRequest::new("plot a sine wave"));
//! while let Some(event) = events.next().await { /* ... */ }
//! ```

mod driver;
mod event;
mod message;
mod request;
mod run_config;
pub mod subagents;
mod translator;

// Re-exports for convenience
pub use driver::{ConversationDriver, EventStream};
pub use event::NormalizedEvent;
pub use message::{ContentItem, NativeContent, NativeMessage, ToolResultContent};
pub use request::AgentRequest;
pub use run_config::{RunConfig, RunConfigBuilder};
pub use subagents::{subagent_definitions, SubagentSpec};
pub use translator::{invocation_id, SandboxSession, Translation, Translator, SESSION_ID_FIELD};
