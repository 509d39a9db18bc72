//! Run configuration - everything one agent run is started with

use std::collections::BTreeMap;

use crate::config::Config;
use crate::templates;
use crate::tools::{
    enabled_capabilities, mcp_servers, Availability, Capability, GatewayConnection,
    McpServerConfig,
};

use super::subagents::{subagent_definitions, SubagentSpec};

/// Immutable configuration for one run attempt.
///
/// A retry builds a new `RunConfig` rather than editing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    capabilities: Vec<Capability>,
    subagents: BTreeMap<String, SubagentSpec>,
    resume_token: Option<String>,
    system_instructions: String,
    model_id: String,
    mcp_servers: BTreeMap<String, McpServerConfig>,
}

impl RunConfig {
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn subagents(&self) -> &BTreeMap<String, SubagentSpec> {
        &self.subagents
    }

    pub fn resume_token(&self) -> Option<&str> {
        self.resume_token.as_deref()
    }

    pub fn system_instructions(&self) -> &str {
        &self.system_instructions
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn mcp_servers(&self) -> &BTreeMap<String, McpServerConfig> {
        &self.mcp_servers
    }
}

/// Captures the conversation-wide settings once and stamps out one
/// [`RunConfig`] per attempt.
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    capabilities: Vec<Capability>,
    subagents: BTreeMap<String, SubagentSpec>,
    system_instructions: String,
    model_id: String,
    mcp_servers: BTreeMap<String, McpServerConfig>,
}

impl RunConfigBuilder {
    /// Resolve capabilities, sub-agents and MCP servers from configuration and
    /// the gateway connection (if one could be established).
    pub fn new(config: &Config, gateway: Option<&GatewayConnection>) -> Self {
        let availability = Availability {
            gateway: gateway.is_some(),
        };
        let capabilities = enabled_capabilities(&availability);
        let subagents = subagent_definitions(&capabilities, &config.subagent_model);

        Self {
            subagents,
            capabilities,
            system_instructions: templates::SYSTEM.to_string(),
            model_id: config.model.clone(),
            mcp_servers: mcp_servers(&config.sandbox, gateway),
        }
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Build the configuration for one attempt. An empty token means a fresh run.
    pub fn build(&self, resume_token: Option<&str>) -> RunConfig {
        RunConfig {
            capabilities: self.capabilities.clone(),
            subagents: self.subagents.clone(),
            resume_token: resume_token.filter(|t| !t.is_empty()).map(str::to_string),
            system_instructions: self.system_instructions.clone(),
            model_id: self.model_id.clone(),
            mcp_servers: self.mcp_servers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> GatewayConnection {
        GatewayConnection {
            url: "https://gw.example.com/mcp".to_string(),
            access_token: "tok".to_string(),
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = RunConfigBuilder::new(&Config::default(), Some(&gateway()));
        assert_eq!(builder.build(Some("t1")), builder.build(Some("t1")));
        assert_eq!(builder.build(None), builder.build(None));
    }

    #[test]
    fn test_configs_differ_only_in_resume_token() {
        let builder = RunConfigBuilder::new(&Config::default(), None);
        let resumed = builder.build(Some("t1"));
        let fresh = builder.build(None);

        assert_eq!(resumed.resume_token(), Some("t1"));
        assert_eq!(fresh.resume_token(), None);
        assert_eq!(resumed.capabilities(), fresh.capabilities());
        assert_eq!(resumed.subagents(), fresh.subagents());
        assert_eq!(resumed.system_instructions(), fresh.system_instructions());
        assert_eq!(resumed.model_id(), fresh.model_id());
        assert_eq!(resumed.mcp_servers(), fresh.mcp_servers());
    }

    #[test]
    fn test_empty_token_means_fresh() {
        let builder = RunConfigBuilder::new(&Config::default(), None);
        assert_eq!(builder.build(Some("")), builder.build(None));
    }

    #[test]
    fn test_embeds_config_and_gateway() {
        let mut config = Config::default();
        config.model = "model-x".to_string();

        let run = RunConfigBuilder::new(&config, Some(&gateway())).build(None);
        assert_eq!(run.model_id(), "model-x");
        assert!(run.capabilities().contains(&Capability::GatewayWildcard));
        assert!(run.mcp_servers().contains_key("gateway"));
        assert!(run.system_instructions().contains("CRITICAL RULES"));
        assert!(run.subagents().contains_key("code-analyst"));
    }
}
