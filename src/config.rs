//! Application configuration, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::errors::{Result, TradeError};
use crate::fetcher::RuleConfig;

pub const CONFIG_ENV_VAR: &str = "POE_TRADE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_league")]
    pub league: String,

    /// Used to flag the user's own listings.
    #[serde(default)]
    pub account_name: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fixed divine:exalted ratio; when unset the ratio reported by the search is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divine_exalt_ratio: Option<f64>,

    /// Stat table overriding the packaged one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_path: Option<String>,

    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

/// Budgets used until the trade site reports its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_search_rules")]
    pub search: Vec<RuleConfig>,
    #[serde(default = "default_fetch_rules")]
    pub fetch: Vec<RuleConfig>,
}

fn default_league() -> String {
    "Standard".to_string()
}

fn default_api_base_url() -> String {
    "https://www.pathofexile.com/api".to_string()
}

fn default_user_agent() -> String {
    format!("poe-trade-query/{}", env!("CARGO_PKG_VERSION"))
}

pub fn default_search_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::new(5, 10),
        RuleConfig::new(15, 60),
        RuleConfig::new(30, 300),
    ]
}

pub fn default_fetch_rules() -> Vec<RuleConfig> {
    vec![RuleConfig::new(12, 4), RuleConfig::new(16, 12)]
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            search: default_search_rules(),
            fetch: default_fetch_rules(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            league: default_league(),
            account_name: String::new(),
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            divine_exalt_ratio: None,
            stats_path: None,
            rate_limits: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolves the config path (argument, then `POE_TRADE_CONFIG`, then the default
    /// location) and loads it. A missing file yields the defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TradeError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TradeError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.league.trim().is_empty() {
            return Err(TradeError::ConfigError("league must not be empty".to_string()));
        }
        if let Some(ratio) = self.divine_exalt_ratio {
            if ratio.is_nan() || ratio <= 0.0 {
                return Err(TradeError::ConfigError(format!(
                    "divine_exalt_ratio must be positive, got {}",
                    ratio
                )));
            }
        }
        let rules = self.rate_limits.search.iter().chain(&self.rate_limits.fetch);
        for rule in rules {
            if rule.capacity == 0 {
                return Err(TradeError::ConfigError(format!(
                    "rate limit capacity for {} must be at least one request",
                    rule.policy
                )));
            }
            if rule.window_secs == 0 {
                return Err(TradeError::ConfigError(format!(
                    "rate limit window for {} must be at least one second",
                    rule.policy
                )));
            }
        }
        Ok(())
    }
}
