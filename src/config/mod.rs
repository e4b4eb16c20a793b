//! Configuration management for GasBot
//!
//! Loads from YAML files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::GasBotError;
use crate::schedule::Schedule;
use crate::types::{FailurePolicy, Glyphs};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub schedule: ScheduleConfig,
    pub report: ReportConfig,
    pub endpoints: EndpointsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token (secret)
    pub bot_token: String,
    /// Chat receiving scheduled reports
    pub chat_id: i64,
    /// Bot API base URL
    pub api_url: String,
    /// Long-poll timeout for getUpdates in seconds
    pub poll_timeout_secs: u64,
    /// HTTP request timeout in seconds (added on top of the poll timeout)
    pub request_timeout_secs: u64,
    /// Delay before polling again after a transport error
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Push reports on the schedule
    pub enabled: bool,
    /// Five-field cron expression, evaluated in UTC
    pub cron: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// abort | isolate
    pub failure_policy: FailurePolicy,
    pub up_glyph: String,
    pub down_glyph: String,
}

impl ReportConfig {
    pub fn glyphs(&self) -> Glyphs {
        Glyphs::new(self.up_glyph.clone(), self.down_glyph.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default)]
    pub mainnet: Vec<EndpointConfig>,
    #[serde(default)]
    pub testnet: Vec<EndpointConfig>,
}

/// One relayer lookup
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Display name in the report
    pub name: String,
    /// Destination chain id in the relayer's lookup table
    pub chain_id: u16,
    /// JSON-RPC URL of the chain hosting the relayer
    pub rpc_url: String,
    /// Relayer contract address
    pub relayer_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (GASBOT__*)
            .add_source(Environment::with_prefix("GASBOT").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let mut app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.apply_legacy_env();

        Ok(app_config)
    }

    /// Parse configuration from a YAML document on top of the defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = Self::builder()?
            .add_source(File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .context("Failed to build configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            // Telegram defaults
            .set_default("telegram.bot_token", "")?
            .set_default("telegram.chat_id", 0)?
            .set_default("telegram.api_url", "https://api.telegram.org")?
            .set_default("telegram.poll_timeout_secs", 30)?
            .set_default("telegram.request_timeout_secs", 10)?
            .set_default("telegram.retry_delay_ms", 5000)?
            // Schedule defaults
            .set_default("schedule.enabled", true)?
            .set_default("schedule.cron", "*/5 * * * *")?
            // Report defaults
            .set_default("report.failure_policy", "abort")?
            .set_default("report.up_glyph", "🔺")?
            .set_default("report.down_glyph", "🔻")?
            // Logging defaults
            .set_default("logging.json", false)?
            .set_default("endpoints.mainnet", Vec::<String>::new())?
            .set_default("endpoints.testnet", Vec::<String>::new())?)
    }

    /// Fill secrets from the plain `BOT_TOKEN` / `CHAT_ID` variables when unset
    fn apply_legacy_env(&mut self) {
        if self.telegram.bot_token.trim().is_empty() {
            if let Ok(token) = std::env::var("BOT_TOKEN") {
                self.telegram.bot_token = token;
            }
        }
        if self.telegram.chat_id == 0 {
            if let Some(chat_id) = std::env::var("CHAT_ID")
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
            {
                self.telegram.chat_id = chat_id;
            }
        }
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "chat_id={} schedule={} ({}) mainnet={:?} testnet={:?} failure_policy={}",
            self.telegram.chat_id,
            self.schedule.cron,
            if self.schedule.enabled { "on" } else { "off" },
            self.endpoints.mainnet.iter().map(|e| &e.name).collect::<Vec<_>>(),
            self.endpoints.testnet.iter().map(|e| &e.name).collect::<Vec<_>>(),
            self.report.failure_policy,
        )
    }

    /// Check everything required before the bot starts
    pub fn validate(&self) -> std::result::Result<(), GasBotError> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(GasBotError::config(
                "bot token is not set (BOT_TOKEN or GASBOT__TELEGRAM__BOT_TOKEN)",
            ));
        }
        if self.telegram.chat_id == 0 {
            return Err(GasBotError::config(
                "chat id is not set (CHAT_ID or GASBOT__TELEGRAM__CHAT_ID)",
            ));
        }
        self.validate_endpoints()?;
        if self.schedule.enabled {
            Schedule::parse(&self.schedule.cron)?;
        }
        Ok(())
    }

    /// Endpoint checks only; enough for one-shot reports without Telegram
    pub fn validate_endpoints(&self) -> std::result::Result<(), GasBotError> {
        if self.endpoints.mainnet.is_empty() && self.endpoints.testnet.is_empty() {
            return Err(GasBotError::config("no endpoints configured"));
        }
        for endpoint in self
            .endpoints
            .mainnet
            .iter()
            .chain(self.endpoints.testnet.iter())
        {
            endpoint.validate()?;
        }
        Ok(())
    }
}

impl EndpointConfig {
    pub fn validate(&self) -> std::result::Result<(), GasBotError> {
        if self.name.trim().is_empty() {
            return Err(GasBotError::config(format!(
                "endpoint for chain {} has no name",
                self.chain_id
            )));
        }
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(GasBotError::config(format!(
                "endpoint {}: rpc_url must be http(s), got '{}'",
                self.name, self.rpc_url
            )));
        }
        self.relayer_address
            .parse::<ethers::types::Address>()
            .map_err(|e| {
                GasBotError::config(format!(
                    "endpoint {}: invalid relayer address '{}': {}",
                    self.name, self.relayer_address, e
                ))
            })?;
        Ok(())
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
