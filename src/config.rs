//! Configuration types for the lunch bot.

use crate::error::{BotError, Result};
use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest UTC offset accepted, in minutes (±18h).
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot API credentials and polling settings.
    pub telegram: TelegramConfig,
    /// Daily voting window.
    pub window: WindowConfig,
    /// HTTP liveness endpoint.
    pub liveness: LivenessConfig,
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub bot_token: String,
    /// API root, without trailing slash.
    pub api_base_url: String,
    /// Long-poll wait passed to `getUpdates`.
    pub poll_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: "https://api.telegram.org".to_owned(),
            poll_timeout_secs: 25,
        }
    }
}

/// Daily voting window, expressed in local time at a fixed UTC offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Group chat that receives the daily poll.
    pub target_chat_id: i64,
    /// Hour the poll opens (0-23, local).
    pub open_hour: u32,
    /// Minute the poll opens (0-59).
    pub open_minute: u32,
    /// Hour the poll closes (0-23, local).
    pub close_hour: u32,
    /// Minute the poll closes (0-59).
    pub close_minute: u32,
    /// Local offset from UTC in minutes (UTC+5 is 300).
    pub utc_offset_minutes: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            target_chat_id: 0,
            open_hour: 8,
            open_minute: 30,
            close_hour: 10,
            close_minute: 30,
            utc_offset_minutes: 300,
        }
    }
}

impl WindowConfig {
    /// Local time the poll opens.
    pub fn open_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.open_hour, self.open_minute, 0)
    }

    /// Local time the poll closes.
    pub fn close_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.close_hour, self.close_minute, 0)
    }

    /// The fixed reference offset.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    fn validate(&self) -> Result<()> {
        if self.open_time().is_none() {
            return Err(BotError::Config(format!(
                "invalid open time {}:{}",
                self.open_hour, self.open_minute
            )));
        }
        if self.close_time().is_none() {
            return Err(BotError::Config(format!(
                "invalid close time {}:{}",
                self.close_hour, self.close_minute
            )));
        }
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.utc_offset_minutes) {
            return Err(BotError::Config(format!(
                "utc_offset_minutes {} out of range",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

/// Liveness endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Whether to serve the endpoint at all.
    pub enabled: bool,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_owned(),
            port: 3000,
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| BotError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BotError::Config(e.to_string()))
    }

    /// Returns the default config file path: `~/.config/lunchbot/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("lunchbot").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("lunchbot")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/lunchbot-config/config.toml")
        }
    }

    /// Apply `LUNCHBOT_TOKEN`, `LUNCHBOT_CHAT_ID` and `PORT` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(token) = lookup("LUNCHBOT_TOKEN") {
            self.telegram.bot_token = token.trim().to_owned();
        }
        if let Some(chat) = lookup("LUNCHBOT_CHAT_ID") {
            self.window.target_chat_id = chat
                .trim()
                .parse()
                .map_err(|e| BotError::Config(format!("LUNCHBOT_CHAT_ID: {e}")))?;
        }
        if let Some(port) = lookup("PORT") {
            self.liveness.port = port
                .trim()
                .parse()
                .map_err(|e| BotError::Config(format!("PORT: {e}")))?;
        }
        Ok(())
    }

    /// Check the values a running bot depends on.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(BotError::Config("telegram.bot_token is empty".to_owned()));
        }
        self.window.validate()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn valid_config() -> BotConfig {
        let mut config = BotConfig::default();
        config.telegram.bot_token = "123:abc".to_owned();
        config
    }

    #[test]
    fn default_window_is_half_eight_to_half_ten() {
        let window = WindowConfig::default();
        assert_eq!(window.open_time(), NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(window.close_time(), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(window.offset(), FixedOffset::east_opt(5 * 3600));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = valid_config();
        config.window.target_chat_id = -1003197836887;
        config.window.open_hour = 9;
        config.liveness.port = 8080;

        config.save_to_file(&path).unwrap();
        let loaded = BotConfig::from_file(&path).unwrap();

        assert_eq!(loaded.telegram.bot_token, "123:abc");
        assert_eq!(loaded.window.target_chat_id, -1003197836887);
        assert_eq!(loaded.window.open_hour, 9);
        assert_eq!(loaded.liveness.port, 8080);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: BotConfig = toml::from_str(
            r#"
            [window]
            open_hour = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.window.open_hour, 7);
        assert_eq!(config.window.open_minute, 30);
        assert_eq!(config.telegram.poll_timeout_secs, 25);
        assert!(config.liveness.enabled);
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(matches!(
            BotConfig::from_file(&path),
            Err(BotError::Config(_))
        ));
    }

    #[test]
    fn from_file_nonexistent_returns_io_error() {
        let result = BotConfig::from_file(std::path::Path::new("/nonexistent/lunchbot.toml"));
        assert!(matches!(result, Err(BotError::Io(_))));
    }

    #[test]
    fn validate_rejects_empty_token() {
        let config = BotConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn validate_rejects_out_of_range_times() {
        let mut config = valid_config();
        config.window.open_hour = 24;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.window.close_minute = 60;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.window.utc_offset_minutes = 19 * 60;
        assert!(config.validate().is_err());

        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn overrides_replace_token_chat_and_port() {
        let mut config = BotConfig::default();
        config
            .apply_overrides(|key| match key {
                "LUNCHBOT_TOKEN" => Some(" 42:xyz ".to_owned()),
                "LUNCHBOT_CHAT_ID" => Some("-100".to_owned()),
                "PORT" => Some("9000".to_owned()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.telegram.bot_token, "42:xyz");
        assert_eq!(config.window.target_chat_id, -100);
        assert_eq!(config.liveness.port, 9000);
    }

    #[test]
    fn bad_port_override_is_a_config_error() {
        let mut config = BotConfig::default();
        let result = config.apply_overrides(|key| (key == "PORT").then(|| "http".to_owned()));
        assert!(matches!(result, Err(BotError::Config(_))));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = BotConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("lunchbot"));
    }
}
