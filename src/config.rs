//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;
use crate::Result;
use crate::error::Error;

/// Environment variable overriding the main agent model
pub const ENV_MODEL: &str = "CODEINT_AGENT_MODEL";
/// Environment variable overriding the agent CLI path
pub const ENV_CLI_PATH: &str = "CODEINT_AGENT_CLI_PATH";
/// Environment variable providing the gateway URL
pub const ENV_GATEWAY_URL: &str = "GATEWAY_URL";
/// Environment variable providing a pre-issued gateway access token
pub const ENV_GATEWAY_TOKEN: &str = "GATEWAY_ACCESS_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model used by the main agent
    #[serde(default = "default_model")]
    pub model: String,

    /// Model alias used by delegated sub-agents
    #[serde(default = "default_subagent_model")]
    pub subagent_model: String,

    /// Path to the agent CLI binary
    #[serde(default = "default_cli_path")]
    pub cli_path: PathBuf,

    /// Code Interpreter MCP server launch settings
    #[serde(default)]
    pub sandbox: SandboxServerConfig,

    /// Remote tool gateway (optional)
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,
}

/// How to launch the Code Interpreter MCP server (stdio transport)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxServerConfig {
    #[serde(default = "default_sandbox_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for SandboxServerConfig {
    fn default() -> Self {
        Self {
            command: default_sandbox_command(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

/// Gateway connection settings.
///
/// Either a static `access_token` or the client-credentials fields
/// (`token_endpoint`, `client_id`, `client_secret`) must be present for the
/// gateway to be usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_model() -> String {
    "us.anthropic.claude-opus-4-6-v1".to_string()
}

fn default_subagent_model() -> String {
    "sonnet".to_string()
}

fn default_cli_path() -> PathBuf {
    PathBuf::from("/usr/bin/claude")
}

fn default_sandbox_command() -> String {
    "codeint-mcp".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            subagent_model: default_subagent_model(),
            cli_path: default_cli_path(),
            sandbox: SandboxServerConfig::default(),
            gateway: None,
        }
    }
}

impl Config {
    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.is_empty()) {
            self.model = model;
        }
        if let Some(path) = lookup(ENV_CLI_PATH).filter(|v| !v.is_empty()) {
            self.cli_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_GATEWAY_URL).filter(|v| !v.is_empty()) {
            self.gateway.get_or_insert_with(GatewayConfig::default).url = url;
        }
        if let Some(token) = lookup(ENV_GATEWAY_TOKEN).filter(|v| !v.is_empty()) {
            if let Some(gateway) = self.gateway.as_mut() {
                gateway.access_token = Some(token);
            }
        }
    }

    /// Check the settings that would otherwise fail late, mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        if self.sandbox.command.trim().is_empty() {
            return Err(Error::Config("sandbox.command must not be empty".to_string()));
        }
        // An empty url leaves the gateway unconfigured.
        if let Some(gateway) = self.gateway.as_ref().filter(|g| !g.url.is_empty()) {
            let url = Url::parse(&gateway.url)
                .map_err(|e| Error::Config(format!("Invalid gateway url {:?}: {}", gateway.url, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "Gateway url must be http(s), got {}",
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codeint-agent")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default location, then apply environment overrides.
///
/// A missing file is not an error: defaults plus environment are enough to run.
pub fn load() -> Result<Config> {
    let path = config_path();
    let mut config = if path.exists() {
        load_from(&path)?
    } else {
        tracing::debug!("No config at {:?}, using defaults", path);
        Config::default()
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file, without environment overrides
pub fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {:?}: {}", path, e)))?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Write a default configuration unless one already exists. Returns the path.
pub fn init() -> Result<PathBuf> {
    let path = config_path();
    if path.exists() {
        return Err(Error::Config(format!("Config already exists at {:?}", path)));
    }
    save_to(&Config::default(), &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "us.anthropic.claude-opus-4-6-v1");
        assert_eq!(config.subagent_model, "sonnet");
        assert_eq!(config.cli_path, PathBuf::from("/usr/bin/claude"));
        assert!(config.gateway.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "m-1"}"#).unwrap();
        assert_eq!(config.model, "m-1");
        assert_eq!(config.sandbox.command, "codeint-mcp");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.gateway = Some(GatewayConfig {
            url: "https://gw.example.com/mcp".to_string(),
            access_token: Some("tok".to_string()),
            ..Default::default()
        });

        save_to(&config, &path).unwrap();
        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_from(&tmp.path().join("absent.json"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env_of(&[
            (ENV_MODEL, "other-model"),
            (ENV_GATEWAY_URL, "https://gw.example.com"),
            (ENV_GATEWAY_TOKEN, "secret"),
        ]));

        assert_eq!(config.model, "other-model");
        let gateway = config.gateway.unwrap();
        assert_eq!(gateway.url, "https://gw.example.com");
        assert_eq!(gateway.access_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_token_without_url_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(env_of(&[(ENV_GATEWAY_TOKEN, "secret")]));
        assert!(config.gateway.is_none());
    }

    #[test]
    fn test_invalid_gateway_url() {
        let mut config = Config::default();
        config.gateway = Some(GatewayConfig {
            url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.gateway = Some(GatewayConfig {
            url: "ftp://gw.example.com".to_string(),
            ..Default::default()
        });
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_gateway_url_is_unconfigured() {
        let config: Config = serde_json::from_str(r#"{"gateway": {"url": ""}}"#).unwrap();
        assert!(config.validate().is_ok());
    }
}
