//! Configuration and settings management
//!
//! Loads settings from environment variables and validates required values.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use teloxide::types::{ChatId, Recipient};
use tracing::warn;

/// Default maximum downloadable file size (2 GB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2_000_000_000;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub bot_token: String,

    /// Telegram application identifier (kept for deployment parity;
    /// the Bot API transport itself only consumes the token)
    pub api_id: u64,

    /// Telegram application secret
    pub api_hash: String,

    /// Owner user id; 0 means unset. Loaded but currently drives no logic.
    #[serde(default)]
    pub owner_id: i64,

    /// Optional chat that receives upload notices (`@username` or numeric id)
    pub log_channel: Option<String>,

    /// Optional force-subscribe channel. Loaded but currently drives no logic.
    pub force_sub_channel: Option<String>,

    /// Maximum downloadable file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

const fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Settings {
    /// Create new settings by loading from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the offending variable if a required
    /// value (`BOT_TOKEN`, `API_ID`, `API_HASH`) is missing, empty, or fails
    /// to parse. Startup must not proceed past such an error.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "BOT_TOKEN must be a non-empty string".to_string(),
            ));
        }
        if self.api_id == 0 {
            return Err(ConfigError::Message(
                "API_ID must be a positive integer".to_string(),
            ));
        }
        if self.api_hash.trim().is_empty() {
            return Err(ConfigError::Message(
                "API_HASH must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve `LOG_CHANNEL` into a Telegram recipient.
    ///
    /// Values starting with `@` are channel usernames; anything else must be
    /// a numeric chat id. An unparsable value counts as "no log channel"
    /// and is reported once per call site via `warn!`.
    #[must_use]
    pub fn log_channel_recipient(&self) -> Option<Recipient> {
        let raw = self.log_channel.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with('@') {
            return Some(Recipient::ChannelUsername(raw.to_string()));
        }
        match raw.parse::<i64>() {
            Ok(id) => Some(Recipient::Id(ChatId(id))),
            Err(_) => {
                warn!(log_channel = %raw, "LOG_CHANNEL is neither @username nor a chat id; ignoring");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_log_channel(log_channel: Option<&str>) -> Settings {
        Settings {
            bot_token: "123456:TEST".to_string(),
            api_id: 12345,
            api_hash: "abcdef".to_string(),
            owner_id: 0,
            log_channel: log_channel.map(str::to_string),
            force_sub_channel: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    #[test]
    fn log_channel_username_becomes_channel_recipient() {
        let settings = settings_with_log_channel(Some("@uploads_log"));
        assert_eq!(
            settings.log_channel_recipient(),
            Some(Recipient::ChannelUsername("@uploads_log".to_string()))
        );
    }

    #[test]
    fn log_channel_numeric_id_becomes_chat_id() {
        let settings = settings_with_log_channel(Some("-1001234567890"));
        assert_eq!(
            settings.log_channel_recipient(),
            Some(Recipient::Id(ChatId(-1_001_234_567_890)))
        );
    }

    #[test]
    fn log_channel_garbage_counts_as_absent() {
        let settings = settings_with_log_channel(Some("not a channel"));
        assert_eq!(settings.log_channel_recipient(), None);
    }

    #[test]
    fn log_channel_unset_is_absent() {
        let settings = settings_with_log_channel(None);
        assert_eq!(settings.log_channel_recipient(), None);
    }

    #[test]
    fn empty_bot_token_is_rejected() {
        let mut settings = settings_with_log_channel(None);
        settings.bot_token = "   ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_api_id_is_rejected() {
        let mut settings = settings_with_log_channel(None);
        settings.api_id = 0;
        assert!(settings.validate().is_err());
    }
}
