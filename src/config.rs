//! Configuration module for the Otakudesu scraper
//!
//! Handles loading environment variables and application configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::DEFAULT_BASE_URL;
use crate::scraper::{ScraperConfig, DEFAULT_USER_AGENT};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the scraped site
    pub base_url: String,
    /// User agent sent when a call does not override it
    pub user_agent: String,
    /// Pick a random browser user agent per request instead of `user_agent`
    pub rotate_user_agent: bool,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Headers sent on every request, e.g. a clearance cookie
    pub request_headers: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rotate_user_agent: false,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            request_headers: Vec::new(),
        }
    }
}

/// Read and parse an environment variable, falling back when unset or invalid
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// Parse `Name: value` entries separated by `|`
fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split('|')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| match entry.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Some((name.trim().to_string(), value.trim().to_string()))
            }
            _ => {
                tracing::warn!("Ignoring malformed REQUEST_HEADERS entry: {:?}", entry);
                None
            }
        })
        .collect()
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            base_url: env::var("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            user_agent: env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            rotate_user_agent: env_or("ROTATE_USER_AGENT", defaults.rotate_user_agent),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            connect_timeout_secs: env_or("CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            request_headers: env::var("REQUEST_HEADERS")
                .map(|raw| parse_headers(&raw))
                .unwrap_or(defaults.request_headers),
        }
    }

    /// HTTP client settings derived from this configuration
    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            rotate_user_agent: self.rotate_user_agent,
            timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            default_headers: self.request_headers.clone(),
        }
    }
}
