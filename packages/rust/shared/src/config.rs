//! Application configuration for SiteKit.
//!
//! User config lives at `~/.sitekit/sitekit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteKitError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitekit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitekit";

/// Default preference database file name inside the config directory.
const DB_FILE_NAME: &str = "preferences.db";

// ---------------------------------------------------------------------------
// Config structs (matching sitekit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// CMS endpoint settings.
    #[serde(default)]
    pub cms: CmsConfig,

    /// Theme application settings.
    #[serde(default)]
    pub theme: ThemeConfig,

    /// Form block settings.
    #[serde(default)]
    pub forms: FormsConfig,

    /// Preference store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[cms]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Base URL of the CMS REST surface.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Canonical tenant domain used when no host context is available.
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the env var holding the CMS token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            base_domain: default_base_domain(),
            timeout_secs: default_timeout_secs(),
            token_env: default_token_env(),
        }
    }
}

fn default_base_url() -> String {
    "https://aianumpuli.uans.us".into()
}
fn default_base_domain() -> String {
    "uans.us".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_token_env() -> String {
    "SITEKIT_CMS_TOKEN".into()
}

/// `[theme]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Prefix for emitted style variables (`--<prefix>-primary`).
    #[serde(default = "default_variable_prefix")]
    pub variable_prefix: String,

    /// Ambient system color-scheme preference, used when no choice is stored.
    #[serde(default)]
    pub system_prefers_dark: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            variable_prefix: default_variable_prefix(),
            system_prefers_dark: false,
        }
    }
}

fn default_variable_prefix() -> String {
    "uan".into()
}

/// `[forms]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Simulated submission latency in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub simulated_latency_ms: u64,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: default_latency_ms(),
        }
    }
}

fn default_latency_ms() -> u64 {
    1000
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Preference database path. Defaults to `~/.sitekit/preferences.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AppConfig {
    /// Resolve the preference database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(config_dir()?.join(DB_FILE_NAME)),
        }
    }

    /// Check that values which cannot be defaulted are usable.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.cms.base_url).map_err(|e| {
            SiteKitError::config(format!("invalid cms.base_url '{}': {e}", self.cms.base_url))
        })?;
        if self.cms.base_domain.trim().is_empty() {
            return Err(SiteKitError::config("cms.base_domain must not be empty"));
        }
        if self.theme.variable_prefix.is_empty()
            || !self
                .theme
                .variable_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SiteKitError::config(format!(
                "theme.variable_prefix '{}' must be a non-empty CSS identifier",
                self.theme.variable_prefix
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitekit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SiteKitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitekit/sitekit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteKitError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| SiteKitError::config(format!("failed to parse {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SiteKitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SiteKitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteKitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the CMS token from the configured env var, if set and non-empty.
pub fn resolve_token(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.cms.token_env) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => None,
    }
}
