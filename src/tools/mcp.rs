//! MCP server wiring for the sandbox and the gateway

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::SandboxServerConfig;

/// Server name of the Code Interpreter sandbox
pub const SANDBOX_SERVER: &str = "codeint";

/// Server name of the remote tool gateway
pub const GATEWAY_SERVER: &str = "gateway";

/// A gateway that was resolved to a URL plus a usable bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConnection {
    pub url: String,
    pub access_token: String,
}

impl fmt::Debug for GatewayConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConnection")
            .field("url", &self.url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// How the agent runtime reaches one MCP server
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpServerConfig {
    Stdio {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
    Http {
        url: String,
        headers: BTreeMap<String, String>,
    },
}

impl fmt::Debug for McpServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McpServerConfig::Stdio { command, args, .. } => f
                .debug_struct("Stdio")
                .field("command", command)
                .field("args", args)
                .finish_non_exhaustive(),
            McpServerConfig::Http { url, headers } => f
                .debug_struct("Http")
                .field("url", url)
                .field("headers", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

fn sorted(env: &HashMap<String, String>) -> BTreeMap<String, String> {
    env.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Build the MCP server map for a run: always the sandbox, the gateway only
/// when it was resolved.
pub fn mcp_servers(
    sandbox: &SandboxServerConfig,
    gateway: Option<&GatewayConnection>,
) -> BTreeMap<String, McpServerConfig> {
    let mut servers = BTreeMap::new();
    servers.insert(
        SANDBOX_SERVER.to_string(),
        McpServerConfig::Stdio {
            command: sandbox.command.clone(),
            args: sandbox.args.clone(),
            env: sorted(&sandbox.env),
        },
    );

    if let Some(gateway) = gateway {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", gateway.access_token),
        );
        servers.insert(
            GATEWAY_SERVER.to_string(),
            McpServerConfig::Http {
                url: gateway.url.clone(),
                headers,
            },
        );
        tracing::info!("Gateway MCP server configured: {}", gateway.url);
    }

    servers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> GatewayConnection {
        GatewayConnection {
            url: "https://gw.example.com/mcp".to_string(),
            access_token: "secret-token".to_string(),
        }
    }

    #[test]
    fn test_sandbox_only() {
        let servers = mcp_servers(&SandboxServerConfig::default(), None);
        assert_eq!(servers.len(), 1);
        assert!(servers.contains_key(SANDBOX_SERVER));
    }

    #[test]
    fn test_gateway_uses_bearer_header() {
        let servers = mcp_servers(&SandboxServerConfig::default(), Some(&gateway()));
        let value = serde_json::to_value(&servers[GATEWAY_SERVER]).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "http",
                "url": "https://gw.example.com/mcp",
                "headers": {"Authorization": "Bearer secret-token"}
            })
        );
    }

    #[test]
    fn test_debug_never_prints_token() {
        let servers = mcp_servers(&SandboxServerConfig::default(), Some(&gateway()));
        let debug = format!("{:?} {:?}", servers, gateway());
        assert!(!debug.contains("secret-token"));
    }
}
