use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Top-level bot configuration.
///
/// Loaded from `~/.ibadahbot/config.json5`, then overridden by the
/// environment (`TELEGRAM_TOKEN`, `ADMIN_USER_ID`, `ANTHROPIC_API_KEY`,
/// `IBADAH_DB_PATH`). A `.env` file is honored via dotenvy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbadahConfig {
    /// Telegram bot token.
    #[serde(default)]
    pub telegram_token: String,
    /// Telegram user id of the admin who approves registrations.
    #[serde(default)]
    pub admin_user_id: i64,
    /// Anthropic API key. Without it, AI features degrade to fallbacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
    /// SQLite database path. Defaults to `<config dir>/ibadah.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl Default for IbadahConfig {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            admin_user_id: 0,
            anthropic_api_key: None,
            db_path: None,
        }
    }
}

impl IbadahConfig {
    /// Resolve the database path, falling back to the config directory.
    pub fn resolve_db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => Ok(ensure_config_dir()?.join("ibadah.db")),
        }
    }

    /// Validate the settings the bot cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.is_empty() {
            return Err(ConfigError::Missing("telegram_token / TELEGRAM_TOKEN"));
        }
        if self.admin_user_id == 0 {
            return Err(ConfigError::Missing("admin_user_id / ADMIN_USER_ID"));
        }
        Ok(())
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_TOKEN") {
            if !token.is_empty() {
                self.telegram_token = token;
            }
        }
        if let Ok(id) = std::env::var("ADMIN_USER_ID") {
            if let Ok(id) = id.parse() {
                self.admin_user_id = id;
            }
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            if !key.is_empty() {
                self.anthropic_api_key = Some(key);
            }
        }
        if let Ok(path) = std::env::var("IBADAH_DB_PATH") {
            if !path.is_empty() {
                self.db_path = Some(PathBuf::from(path));
            }
        }
    }
}

/// Resolve the config directory (~/.ibadahbot/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".ibadahbot"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.ibadahbot/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path with env overrides applied.
pub fn load_config() -> Result<IbadahConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = config_file_path()?;
    let mut config = load_config_from(&path)?;
    config.apply_env();
    Ok(config)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<IbadahConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(IbadahConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: IbadahConfig = json5::from_str(&content)?;
    Ok(config)
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_invalid() {
        let config = IbadahConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json5_parse() {
        let json5_str = r#"{
            telegram_token: "123:ABC",
            admin_user_id: 777,
            anthropic_api_key: "sk-test",
        }"#;
        let config: IbadahConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.telegram_token, "123:ABC");
        assert_eq!(config.admin_user_id, 777);
        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-test"));
        assert!(config.db_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_default() {
        let config: IbadahConfig = json5::from_str("{}").unwrap();
        assert!(config.telegram_token.is_empty());
        assert_eq!(config.admin_user_id, 0);
    }
}
