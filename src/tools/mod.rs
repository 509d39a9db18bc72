//! Tools module - capabilities a run may use
//!
//! The agent never executes tools itself. This module only names them:
//! which capability identifiers are granted to a run, and how the MCP
//! servers behind them are reached.

mod mcp;
mod registry;

pub use mcp::{mcp_servers, GatewayConnection, McpServerConfig, GATEWAY_SERVER, SANDBOX_SERVER};
pub use registry::{enabled_capabilities, Availability};

use serde::{Serialize, Serializer};
use std::fmt;

/// Code Interpreter operations exposed by the sandbox MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SandboxOp {
    ExecuteCode,
    ExecuteCommand,
    WriteFiles,
    ReadFiles,
}

impl SandboxOp {
    /// All sandbox operations, in the order they are granted.
    pub const ALL: [SandboxOp; 4] = [
        SandboxOp::ExecuteCode,
        SandboxOp::ExecuteCommand,
        SandboxOp::WriteFiles,
        SandboxOp::ReadFiles,
    ];

    /// Tool name on the sandbox server
    pub fn tool_name(&self) -> &'static str {
        match self {
            SandboxOp::ExecuteCode => "execute_code",
            SandboxOp::ExecuteCommand => "execute_command",
            SandboxOp::WriteFiles => "write_files",
            SandboxOp::ReadFiles => "read_files",
        }
    }
}

/// Read-only tools built into the agent runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinTool {
    Read,
    Grep,
    Glob,
}

/// A named permission granting access to a tool or tool family
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// One Code Interpreter operation (`mcp__codeint__<op>`)
    Sandbox(SandboxOp),
    /// Every tool behind the gateway (`mcp__gateway__*`)
    GatewayWildcard,
    /// Spawning sub-agents (`Task`)
    Delegation,
    Builtin(BuiltinTool),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Sandbox(op) => write!(f, "mcp__{}__{}", SANDBOX_SERVER, op.tool_name()),
            Capability::GatewayWildcard => write!(f, "mcp__{}__*", GATEWAY_SERVER),
            Capability::Delegation => f.write_str("Task"),
            Capability::Builtin(BuiltinTool::Read) => f.write_str("Read"),
            Capability::Builtin(BuiltinTool::Grep) => f.write_str("Grep"),
            Capability::Builtin(BuiltinTool::Glob) => f.write_str("Glob"),
        }
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
