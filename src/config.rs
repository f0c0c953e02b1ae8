//! Environment-based configuration.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot token. Required — startup fails without it.
pub const ENV_BOT_TOKEN: &str = "SIGNIN_BOT_TOKEN";
/// Path to the libsql database file.
pub const ENV_DB_PATH: &str = "SIGNIN_BOT_DB_PATH";
/// Base URL sign-in links are built against.
pub const ENV_BASE_URL: &str = "SIGNIN_BOT_BASE_URL";
/// Service name used in user-facing messages.
pub const ENV_SERVICE_NAME: &str = "SIGNIN_BOT_SERVICE_NAME";
/// URL of the Terms of Service document.
pub const ENV_TOS_URL: &str = "SIGNIN_BOT_TOS_URL";

const DEFAULT_DB_PATH: &str = "./data/signin-bot.db";
const DEFAULT_BASE_URL: &str = "https://kyber.network";
const DEFAULT_SERVICE_NAME: &str = "Kyber Network";
const DEFAULT_TOS_URL: &str = "https://home.kyber.network/assets/tac.pdf";

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub bot_token: SecretString,
    /// libsql database file path.
    pub db_path: PathBuf,
    /// Base URL for generated sign-in links (no trailing slash).
    pub base_url: String,
    /// Service name shown in prompts.
    pub service_name: String,
    /// Terms of Service document URL.
    pub tos_url: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// The bot token is the only required value; everything else has a
    /// default. A missing token is fatal — callers are expected to exit.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var(ENV_BOT_TOKEN)
            .map_err(|_| ConfigError::MissingEnvVar(ENV_BOT_TOKEN.to_string()))?;
        if bot_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ENV_BOT_TOKEN.to_string(),
                message: "token is empty".to_string(),
            });
        }

        let db_path = std::env::var(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let base_url = std::env::var(ENV_BASE_URL)
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let service_name =
            std::env::var(ENV_SERVICE_NAME).unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());

        let tos_url = std::env::var(ENV_TOS_URL).unwrap_or_else(|_| DEFAULT_TOS_URL.to_string());

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            db_path,
            base_url,
            service_name,
            tos_url,
        })
    }
}
