use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.getpostman.com";
pub const DEFAULT_COLLECTION_NAME: &str = "MOSTLY AI";
pub const DEFAULT_CONFIG_FILENAME: &str = "postman-publisher.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PublisherConfig {
    #[serde(default)]
    pub postman: PostmanSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PostmanSection {
    pub api_key: Option<String>,
    pub spec_path: Option<PathBuf>,
    pub workspace: Option<String>,
    pub collection_name: Option<String>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Values given on the command line. They win over env and config file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub spec_path: Option<PathBuf>,
    pub workspace_name: Option<String>,
    pub collection_name: Option<String>,
    pub base_url: Option<String>,
}

/// Fully resolved settings, read once at startup and passed to each step.
///
/// Empty credentials or names are kept as-is; they surface as remote
/// authorization or not-found failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherSettings {
    pub api_key: String,
    pub spec_path: PathBuf,
    pub workspace_name: String,
    pub collection_name: String,
    pub base_url: String,
    pub timeout_ms: Option<u64>,
}

impl PublisherSettings {
    /// Resolve settings: flag > env > config file > default.
    pub fn resolve(config: &PublisherConfig, overrides: &SettingsOverrides) -> Self {
        Self::resolve_with_env(config, overrides, |key| env::var(key).ok())
    }

    fn resolve_with_env<F>(
        config: &PublisherConfig,
        overrides: &SettingsOverrides,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let section = &config.postman;

        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| env_value("POSTMAN_API_KEY"))
            .or_else(|| section.api_key.clone())
            .unwrap_or_default();
        let spec_path = overrides
            .spec_path
            .clone()
            .or_else(|| env_value("OPENAPI_SPEC_PATH").map(PathBuf::from))
            .or_else(|| section.spec_path.clone())
            .unwrap_or_default();
        let workspace_name = overrides
            .workspace_name
            .clone()
            .or_else(|| env_value("WORKSPACE_NAME"))
            .or_else(|| section.workspace.clone())
            .unwrap_or_default();
        let collection_name = overrides
            .collection_name
            .clone()
            .or_else(|| env_value("POSTMAN_COLLECTION_NAME"))
            .or_else(|| section.collection_name.clone())
            .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string());
        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| env_value("POSTMAN_BASE_URL"))
            .or_else(|| section.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_ms = env_value("POSTMAN_HTTP_TIMEOUT_MS")
            .and_then(|value| match value.parse::<u64>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    warn!("Ignoring non-numeric POSTMAN_HTTP_TIMEOUT_MS '{value}'");
                    None
                }
            })
            .or(section.timeout_ms);

        Self {
            api_key,
            spec_path,
            workspace_name,
            collection_name,
            base_url,
            timeout_ms,
        }
    }
}

/// Load and parse a PublisherConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<PublisherConfig> {
    if !config_path.exists() {
        return Ok(PublisherConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: PublisherConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}
