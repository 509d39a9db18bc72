//! Sub-agent catalog
//!
//! Sub-agents are spawned by the runtime when the main agent uses the `Task`
//! capability. Each one gets a restricted capability set; delegation itself is
//! never forwarded, so a sub-agent cannot spawn further sub-agents.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::templates;
use crate::tools::{BuiltinTool, Capability, SandboxOp};

/// Name of the analysis sub-agent
pub const CODE_ANALYST: &str = "code-analyst";

/// Definition of one sub-agent, in the shape the runtime expects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubagentSpec {
    #[serde(skip)]
    pub name: String,
    pub description: String,
    #[serde(rename = "prompt")]
    pub instructions: String,
    #[serde(rename = "tools")]
    pub capabilities: Vec<Capability>,
    #[serde(rename = "model")]
    pub model_id: String,
}

/// Build the sub-agent catalog from the capabilities granted to the main run.
pub fn subagent_definitions(
    capabilities: &[Capability],
    model_id: &str,
) -> BTreeMap<String, SubagentSpec> {
    let mut catalog = BTreeMap::new();
    let analyst = code_analyst(capabilities, model_id);
    catalog.insert(analyst.name.clone(), analyst);
    catalog
}

fn code_analyst(granted: &[Capability], model_id: &str) -> SubagentSpec {
    let wanted = [
        Capability::Sandbox(SandboxOp::ExecuteCode),
        Capability::Sandbox(SandboxOp::ExecuteCommand),
        Capability::GatewayWildcard,
    ];
    let mut capabilities: Vec<Capability> = wanted
        .into_iter()
        .filter(|cap| granted.contains(cap))
        .collect();
    capabilities.extend(
        [BuiltinTool::Read, BuiltinTool::Grep, BuiltinTool::Glob]
            .into_iter()
            .map(Capability::Builtin),
    );

    SubagentSpec {
        name: CODE_ANALYST.to_string(),
        description: "Analyzes code output, debugs errors, and explains results. \
            Can execute code via Code Interpreter. Use when you have code execution \
            output or errors that need detailed analysis. Pass the output/error text \
            directly in the task prompt."
            .to_string(),
        instructions: templates::CODE_ANALYST.to_string(),
        capabilities,
        model_id: model_id.to_string(),
    }
}
