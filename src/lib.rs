//! codeint-agent - streaming agent runs over a Code Interpreter sandbox
//!
//! This library configures one agent run with sandbox, gateway and
//! sub-agent capabilities, translates its native message stream into
//! normalized events, and recovers once from a failed session resume.

pub mod agent;
pub mod auth;
pub mod config;
pub mod error;
pub mod runtime;
pub mod templates;
pub mod tools;
pub mod ui;

pub use error::{Error, Result};
