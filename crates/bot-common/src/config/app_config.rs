//! Application configuration structs
//!
//! Loads configuration from environment variables, with `.env` support.

use bot_core::{Token, TokenType};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Production REST endpoint
pub const API_BASE_URL: &str = "https://api.sgroup.qq.com";
/// Sandbox REST endpoint
pub const SANDBOX_API_BASE_URL: &str = "https://sandbox.api.sgroup.qq.com";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub bot: BotConfig,
    pub api: ApiConfig,
    pub gateway: GatewayConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Bot identity
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub app_id: u64,
    pub token: Token,
    /// Route REST calls to the sandbox environment
    pub sandbox: bool,
}

/// REST client configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Shard connection tuning
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub connect_timeout: Duration,
    /// Capacity of each shard's inbound frame queue
    pub queue_size: usize,
    /// Heartbeat interval used until Hello arrives, or when Hello carries none
    pub default_heartbeat: Duration,
    /// Window over which `max_concurrency` sessions may start
    pub concurrency_window: Duration,
    /// Terminate a shard whose previous heartbeat was never acknowledged
    pub zombie_detection: bool,
    /// How long a closing shard waits for in-flight frames
    pub drain_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(default_connect_timeout_secs()),
            queue_size: default_queue_size(),
            default_heartbeat: Duration::from_millis(default_heartbeat_ms()),
            concurrency_window: Duration::from_secs(default_concurrency_window_secs()),
            zombie_detection: true,
            drain_timeout: Duration::from_secs(default_drain_timeout_secs()),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "bot-gateway".to_string()
}

fn default_api_timeout_secs() -> u64 {
    3
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_queue_size() -> usize {
    10_000
}

fn default_heartbeat_ms() -> u64 {
    45_000
}

fn default_concurrency_window_secs() -> u64 {
    2
}

fn default_drain_timeout_secs() -> u64 {
    5
}

/// Parse an optional variable, failing on a present but malformed value
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        _ => Ok(None),
    }
}

fn parse_bool(name: &'static str) -> Result<Option<bool>, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue(name, raw)),
        },
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let app = AppSettings {
            name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
            env: env::var("APP_ENV")
                .ok()
                .and_then(|s| Environment::parse(&s))
                .unwrap_or_default(),
        };

        let token_type = match env::var("BOT_TOKEN_TYPE") {
            Ok(raw) => TokenType::from_str(&raw)
                .map_err(|_| ConfigError::InvalidValue("BOT_TOKEN_TYPE", raw))?,
            Err(_) => TokenType::default(),
        };
        let app_id = match token_type {
            TokenType::Bot => {
                parse_var::<u64>("BOT_APP_ID")?.ok_or(ConfigError::MissingVar("BOT_APP_ID"))?
            }
            TokenType::Bearer => parse_var::<u64>("BOT_APP_ID")?.unwrap_or(0),
        };
        let secret = env::var("BOT_TOKEN").map_err(|_| ConfigError::MissingVar("BOT_TOKEN"))?;
        let token = Token::new(token_type, app_id, secret)
            .map_err(|e| ConfigError::InvalidValue("BOT_TOKEN", e.to_string()))?;
        let sandbox = parse_bool("BOT_SANDBOX")?.unwrap_or(false);

        let api = ApiConfig {
            base_url: env::var("API_BASE_URL").unwrap_or_else(|_| {
                if sandbox {
                    SANDBOX_API_BASE_URL.to_string()
                } else {
                    API_BASE_URL.to_string()
                }
            }),
            timeout: Duration::from_secs(
                parse_var("API_TIMEOUT_SECS")?.unwrap_or_else(default_api_timeout_secs),
            ),
        };

        let defaults = GatewayConfig::default();
        let gateway = GatewayConfig {
            connect_timeout: parse_var("GATEWAY_CONNECT_TIMEOUT_SECS")?
                .map_or(defaults.connect_timeout, Duration::from_secs),
            queue_size: parse_var("GATEWAY_QUEUE_SIZE")?
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.queue_size),
            default_heartbeat: parse_var("GATEWAY_DEFAULT_HEARTBEAT_MS")?
                .filter(|&ms: &u64| ms > 0)
                .map_or(defaults.default_heartbeat, Duration::from_millis),
            concurrency_window: parse_var("GATEWAY_CONCURRENCY_WINDOW_SECS")?
                .map_or(defaults.concurrency_window, Duration::from_secs),
            zombie_detection: parse_bool("GATEWAY_ZOMBIE_DETECTION")?
                .unwrap_or(defaults.zombie_detection),
            drain_timeout: parse_var("GATEWAY_DRAIN_TIMEOUT_SECS")?
                .map_or(defaults.drain_timeout, Duration::from_secs),
        };

        Ok(Self {
            app,
            bot: BotConfig {
                app_id,
                token,
                sandbox,
            },
            api,
            gateway,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
