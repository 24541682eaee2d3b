//! Application configuration.

use pricebell_alerts::AccessPolicy;
use pricebell_core::{PairTable, PairTableError, TrackedPair};
use pricebell_feeds::{OrderBookConfig, OrderBookSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
    #[error("Invalid pair table: {0}")]
    Pairs(#[from] PairTableError),
    #[error("Broadcast interval must be greater than zero")]
    ZeroInterval,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Broadcast cadence.
    pub broadcast: BroadcastSettings,
    /// Price source settings.
    pub source: SourceSettings,
    /// Telegram settings.
    pub telegram: TelegramSettings,
    /// Tracked pairs, in display order.
    pub pairs: Vec<TrackedPair>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            broadcast: BroadcastSettings::default(),
            source: SourceSettings::default(),
            telegram: TelegramSettings::default(),
            pairs: PairTable::default().iter().cloned().collect(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file, or defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        PairTable::new(self.pairs.clone())?;
        Ok(())
    }

    pub fn pair_table(&self) -> Result<PairTable, ConfigError> {
        Ok(PairTable::new(self.pairs.clone())?)
    }
}

/// Broadcast settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastSettings {
    /// Seconds between digests.
    pub interval_secs: u64,
    /// Seconds after startup before the first digest.
    pub initial_delay_secs: u64,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30 * 60,
            initial_delay_secs: 5,
        }
    }
}

impl BroadcastSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

/// Order-book source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// API root URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: OrderBookSource::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl From<&SourceSettings> for OrderBookConfig {
    fn from(settings: &SourceSettings) -> Self {
        OrderBookConfig {
            base_url: settings.base_url.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Telegram settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Send timeout in seconds.
    pub send_timeout_secs: u64,
    /// Accept commands from group chats.
    pub allow_groups: bool,
    /// Accept commands from channels.
    pub allow_channels: bool,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            send_timeout_secs: 15,
            allow_groups: true,
            allow_channels: false,
        }
    }
}

impl TelegramSettings {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            allow_groups: self.allow_groups,
            allow_channels: self.allow_channels,
        }
    }
}

/// Validate a raw token value.
pub fn token_from(value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ConfigError::MissingToken),
    }
}

/// Read the bot token from the environment.
pub fn bot_token() -> Result<String, ConfigError> {
    token_from(std::env::var(TOKEN_ENV).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.broadcast.interval(), Duration::from_secs(1800));
        assert_eq!(config.pairs.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{"broadcast": {"interval_secs": 600}, "telegram": {"allow_groups": false}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.broadcast.interval_secs, 600);
        assert_eq!(config.broadcast.initial_delay_secs, 5);
        assert!(!config.telegram.access_policy().allow_groups);
        assert_eq!(config.source.base_url, OrderBookSource::DEFAULT_BASE_URL);
        assert_eq!(config.pairs.len(), 2);
    }

    #[test]
    fn test_custom_pairs() {
        let json = r#"{"pairs": [
            {"id": "ETHIRT",
             "base": {"locale": "en-US", "currency": "ETH"},
             "quote": {"locale": "fa-IR", "currency": "IRR"}}
        ]}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let table = config.pair_table().unwrap();
        assert!(table.contains("ETHIRT"));
        assert!(!table.contains("USDTIRT"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.broadcast.interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));
    }

    #[test]
    fn test_validate_rejects_empty_pairs() {
        let mut config = AppConfig::default();
        config.pairs.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Pairs(PairTableError::Empty))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Some("/nonexistent/pricebell.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_without_path() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.telegram.send_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_token_from() {
        assert_eq!(token_from(Some(" abc ".into())).unwrap(), "abc");
        assert!(matches!(token_from(Some("  ".into())), Err(ConfigError::MissingToken)));
        assert!(matches!(token_from(None), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_source_settings_to_config() {
        let settings = SourceSettings::default();
        let config: OrderBookConfig = (&settings).into();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.base_url, settings.base_url);
    }
}
