//! Client configuration.
//!
//! The config file is JSON owned by the user. Values resolve in priority
//! order: CLI flag, environment variable, config file, built-in default.
use crate::client::{SuccessPolicy, UpgradeLinks};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const ENV_API_URL: &str = "FLOWCTL_API_URL";
pub const ENV_ENVIRONMENT: &str = "FLOWCTL_ENV";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3003/api/v1";
const DEFAULT_ENVIRONMENT: &str = "dev";
const DEFAULT_UPGRADE_URL: &str = "https://nango.dev/chat";
const DEFAULT_LIMITS_DOCS_URL: &str = "https://docs.nango.dev/reference/limits";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClientConfig {
    pub schema_version: u32,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Environment name sent as the `env` query parameter.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_upgrade_url")]
    pub upgrade_url: String,
    #[serde(default = "default_limits_docs_url")]
    pub limits_docs_url: String,
    #[serde(default)]
    pub disable_success: SuccessPolicy,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_upgrade_url() -> String {
    DEFAULT_UPGRADE_URL.to_string()
}

fn default_limits_docs_url() -> String {
    DEFAULT_LIMITS_DOCS_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            api_base_url: default_api_base_url(),
            environment: default_environment(),
            upgrade_url: default_upgrade_url(),
            limits_docs_url: default_limits_docs_url(),
            disable_success: SuccessPolicy::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn upgrade_links(&self) -> UpgradeLinks {
        UpgradeLinks {
            upgrade_url: self.upgrade_url.clone(),
            docs_url: self.limits_docs_url.clone(),
        }
    }
}

/// Per-user config location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flowctl").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<ClientConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ClientConfig =
        serde_json::from_slice(&bytes).context("parse flowctl config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the explicit config, or the per-user one when present, or defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<ClientConfig> {
    if let Some(path) = path {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_config(&path),
        _ => Ok(ClientConfig::default()),
    }
}

pub fn write_config(path: &Path, config: &ClientConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize flowctl config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &ClientConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported flowctl config schema_version {}",
            config.schema_version
        ));
    }
    validate_url(&config.api_base_url, "api_base_url")?;
    validate_url(&config.upgrade_url, "upgrade_url")?;
    validate_url(&config.limits_docs_url, "limits_docs_url")?;
    if config.environment.trim().is_empty() {
        return Err(anyhow!("environment must be non-empty"));
    }
    if config.timeout_secs == 0 {
        return Err(anyhow!("timeout_secs must be greater than zero"));
    }
    Ok(())
}

fn validate_url(value: &str, field: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(());
    }
    Err(anyhow!("{field} must be an http(s) URL (got {value:?})"))
}

/// Apply environment variables, then explicit flags, over a loaded config.
pub fn apply_overrides(
    config: &mut ClientConfig,
    api_url: Option<&str>,
    environment: Option<&str>,
) -> Result<()> {
    let env_api_url = std::env::var(ENV_API_URL).ok();
    let env_environment = std::env::var(ENV_ENVIRONMENT).ok();
    resolve_overrides(
        config,
        api_url.or(env_api_url.as_deref()),
        environment.or(env_environment.as_deref()),
    )
}

fn resolve_overrides(
    config: &mut ClientConfig,
    api_url: Option<&str>,
    environment: Option<&str>,
) -> Result<()> {
    if let Some(url) = api_url.map(str::trim).filter(|url| !url.is_empty()) {
        config.api_base_url = url.to_string();
    }
    if let Some(env) = environment.map(str::trim).filter(|env| !env.is_empty()) {
        config.environment = env.to_string();
    }
    validate_config(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
