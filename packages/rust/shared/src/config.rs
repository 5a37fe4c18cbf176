//! Application configuration for researchbrief.
//!
//! User config lives at `~/.researchbrief/researchbrief.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BriefError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "researchbrief.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".researchbrief";

// ---------------------------------------------------------------------------
// Config structs (matching researchbrief.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Groq provider settings.
    #[serde(default)]
    pub groq: GroqConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path to the brief database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// How many briefs the history listing returns.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_db_path() -> String {
    "~/.researchbrief/briefs.db".into()
}
fn default_history_limit() -> u32 {
    5
}

/// `[groq]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat-completions base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model to use for brief generation.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.researchbrief/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BriefError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.researchbrief/researchbrief.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| BriefError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BriefError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BriefError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BriefError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BriefError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve a `~`- or `~/`-prefixed path against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return dirs::home_dir()
            .ok_or_else(|| BriefError::config("could not determine home directory"));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| BriefError::config("could not determine home directory"))?;
        Ok(home.join(rest))
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Read the provider API key from the configured env var.
/// Errors with a credential-fix message when missing or empty.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.groq.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BriefError::config(format!(
            "Groq API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://console.groq.com/keys"
        ))),
    }
}
