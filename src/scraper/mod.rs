//! Scraper module for fetching HTML content from the target site
//!
//! This module defines the [`Transport`] contract the client talks to and
//! its reqwest implementation, [`Scraper`], which sends browser-like headers.
//! There is no retry or delay logic here: failures surface to the caller.

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::constants::{endpoints, DEFAULT_BASE_URL};

/// Errors that can occur while talking to the site
#[derive(Error, Debug)]
pub enum ScraperError {
    /// Network-related errors (connection timeout, DNS failure, etc.)
    #[error("Failed to connect to server: {0}")]
    NetworkError(String),

    /// Non-2xx response; the message is the response body when there is one
    #[error("{message}")]
    HttpError { status: u16, message: String },

    /// Error reading response body
    #[error("Failed to read response body: {0}")]
    ResponseError(String),

    /// The request could not be built (bad header, bad client settings)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ScraperError {
    /// Build an HTTP error, using the body as message unless it is blank
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.trim().is_empty() {
            format!("Server returned status {}", status)
        } else {
            body
        };
        ScraperError::HttpError { status, message }
    }

    /// HTTP status of the failed response, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ScraperError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Per-request changes applied on top of the default GET
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    /// HTTP method, GET when unset
    pub method: Option<Method>,
    /// Absolute URL used instead of base URL + path
    pub url: Option<String>,
    /// Extra headers; a name already in the defaults replaces that default
    pub headers: Vec<(String, String)>,
    /// Raw request body
    pub body: Option<String>,
}

/// Options accepted by [`Transport::fetch`]
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// User agent for this call only
    pub agent: Option<String>,
    pub overrides: RequestOverrides,
}

/// Fetches raw response bodies from the site
#[async_trait]
pub trait Transport: Send + Sync {
    /// Base URL paths are resolved against
    fn base_url(&self) -> &str;

    /// Send a request for `path` and return the body of a 2xx response
    async fn fetch(&self, path: &str, options: FetchOptions) -> Result<String, ScraperError>;
}

/// Desktop Chrome user agent used unless configured otherwise
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// List of realistic user agents for rotation
const USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Edge on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Site root every path is joined onto
    pub base_url: String,
    /// User agent sent when a call does not override it
    pub user_agent: String,
    /// Whether to rotate user agents
    pub rotate_user_agent: bool,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Headers sent on every request (cookies, proxy auth); per-call headers win
    pub default_headers: Vec<(String, String)>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rotate_user_agent: false,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            default_headers: Vec::new(),
        }
    }
}

/// Client hint headers that match the user agent
fn client_hints(user_agent: &str) -> Option<(&'static str, &'static str)> {
    if user_agent.contains("Edg/") {
        Some((
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Microsoft Edge\";v=\"120\"",
            "\"Windows\"",
        ))
    } else if user_agent.contains("Chrome/119") {
        Some((
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"119\", \"Google Chrome\";v=\"119\"",
            "\"Windows\"",
        ))
    } else if user_agent.contains("Chrome/") && user_agent.contains("Macintosh") {
        Some((
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
            "\"macOS\"",
        ))
    } else if user_agent.contains("Chrome/") {
        Some((
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
            "\"Windows\"",
        ))
    } else {
        // Firefox and Safari don't send Sec-Ch-Ua headers
        None
    }
}

/// Headers a desktop browser sends on a same-origin navigation
pub fn browser_headers(user_agent: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = [
        ("user-agent", user_agent),
        ("accept-language", "en-US,en;q=0.6"),
        ("cache-control", "max-age=0"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "same-origin"),
        ("sec-fetch-user", "?1"),
        ("sec-gpc", "1"),
        ("upgrade-insecure-requests", "1"),
        ("referrer-policy", "same-origin"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    if let Some((sec_ch_ua, platform)) = client_hints(user_agent) {
        headers.push(("sec-ch-ua".to_string(), sec_ch_ua.to_string()));
        headers.push(("sec-ch-ua-mobile".to_string(), "?0".to_string()));
        headers.push(("sec-ch-ua-platform".to_string(), platform.to_string()));
    }
    headers
}

/// Build a header map from layered headers; a later header replaces an earlier one with the same name
fn build_header_map<'a>(
    layers: impl IntoIterator<Item = &'a (String, String)>,
) -> Result<HeaderMap, ScraperError> {
    let mut map = HeaderMap::new();
    for (name, value) in layers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ScraperError::InvalidRequest(format!("header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ScraperError::InvalidRequest(format!("header {}: {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// HTTP client for the site, backed by reqwest
pub struct Scraper {
    client: Client,
    config: ScraperConfig,
}

impl Scraper {
    /// Create a new Scraper with default configuration
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    /// Create a new Scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ScraperError::InvalidRequest(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// User agent for one request: explicit override, then rotation, then the configured one
    fn get_user_agent(&self, agent: Option<&str>) -> String {
        if let Some(agent) = agent {
            return agent.to_string();
        }
        if self.config.rotate_user_agent {
            let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
            USER_AGENTS[idx].to_string()
        } else {
            self.config.user_agent.clone()
        }
    }
}

#[async_trait]
impl Transport for Scraper {
    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn fetch(&self, path: &str, options: FetchOptions) -> Result<String, ScraperError> {
        let FetchOptions { agent, overrides } = options;

        let url = overrides
            .url
            .unwrap_or_else(|| endpoints::absolute(&self.config.base_url, path));
        let user_agent = self.get_user_agent(agent.as_deref());
        let defaults = browser_headers(&user_agent);
        let headers = build_header_map(
            defaults
                .iter()
                .chain(&self.config.default_headers)
                .chain(&overrides.headers),
        )?;
        let method = overrides.method.unwrap_or(Method::GET);

        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url).headers(headers);
        if let Some(body) = overrides.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::NetworkError("Connection timeout".to_string())
            } else if e.is_connect() {
                ScraperError::NetworkError("Failed to connect to server".to_string())
            } else {
                ScraperError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScraperError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            debug!("{} answered {}", url, status);
            return Err(ScraperError::http(status.as_u16(), body));
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn scraper_for(server: &MockServer) -> Scraper {
        Scraper::with_config(ScraperConfig {
            base_url: server.base_url(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ScraperConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(!config.rotate_user_agent);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_user_agent_override_wins() {
        let scraper = Scraper::new().unwrap();
        assert_eq!(scraper.get_user_agent(Some("custom/1.0")), "custom/1.0");
        assert_eq!(scraper.get_user_agent(None), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_user_agent_rotation() {
        let scraper = Scraper::with_config(ScraperConfig {
            rotate_user_agent: true,
            ..Default::default()
        })
        .unwrap();
        let ua = scraper.get_user_agent(None);
        assert!(USER_AGENTS.contains(&ua.as_str()));
    }

    #[test]
    fn test_client_hints() {
        let (ua, platform) = client_hints(USER_AGENTS[0]).unwrap();
        assert!(ua.contains("Google Chrome"));
        assert_eq!(platform, "\"Windows\"");

        let (_, platform) = client_hints(USER_AGENTS[2]).unwrap();
        assert_eq!(platform, "\"macOS\"");

        let (ua, _) = client_hints(USER_AGENTS[4]).unwrap();
        assert!(ua.contains("Microsoft Edge"));

        assert!(client_hints(USER_AGENTS[3]).is_none());
    }

    #[test]
    fn test_browser_headers_carry_agent() {
        let headers = browser_headers("agent/1");
        assert!(headers.contains(&("user-agent".to_string(), "agent/1".to_string())));
        assert!(!headers.iter().any(|(k, _)| k == "sec-ch-ua"));
    }

    #[test]
    fn test_header_overrides_replace_defaults() {
        let defaults = browser_headers(DEFAULT_USER_AGENT);
        let overrides = [
            ("User-Agent".to_string(), "other".to_string()),
            ("x-requested-with".to_string(), "XMLHttpRequest".to_string()),
        ];
        let map = build_header_map(defaults.iter().chain(&overrides)).unwrap();
        assert_eq!(map.get_all("user-agent").iter().count(), 1);
        assert_eq!(map["user-agent"], "other");
        assert_eq!(map["x-requested-with"], "XMLHttpRequest");
    }

    #[test]
    fn test_header_layers_apply_in_order() {
        let defaults = browser_headers(DEFAULT_USER_AGENT);
        let client_wide = [
            ("cookie".to_string(), "cf_clearance=abc".to_string()),
            ("accept-language".to_string(), "id-ID".to_string()),
        ];
        let per_call = [("Cookie".to_string(), "session=1".to_string())];
        let map =
            build_header_map(defaults.iter().chain(&client_wide).chain(&per_call)).unwrap();
        assert_eq!(map["accept-language"], "id-ID");
        assert_eq!(map["cookie"], "session=1");
    }

    #[test]
    fn test_invalid_header_is_request_error() {
        let err = build_header_map(&[("bad header".to_string(), "v".to_string())]).unwrap_err();
        assert!(matches!(err, ScraperError::InvalidRequest(_)));
    }

    #[test]
    fn test_http_error_message_is_body() {
        let err = ScraperError::http(403, "nonce expired");
        assert_eq!(err.to_string(), "nonce expired");
        assert_eq!(err.status(), Some(403));

        let err = ScraperError::http(502, "  ");
        assert_eq!(err.to_string(), "Server returned status 502");
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/ongoing-anime/page/1");
            then.status(200).body("<html>ok</html>");
        });

        let scraper = scraper_for(&server);
        let body = scraper
            .fetch("/ongoing-anime/page/1", FetchOptions::default())
            .await
            .unwrap();

        mock.assert();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_surfaces_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing/");
            then.status(404).body("not here");
        });

        let scraper = scraper_for(&server);
        let err = scraper
            .fetch("/missing/", FetchOptions::default())
            .await
            .unwrap_err();

        mock.assert();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "not here");
    }

    #[tokio::test]
    async fn test_fetch_method_and_body_override() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/wp-admin/admin-ajax.php")
                .header("x-requested-with", "XMLHttpRequest")
                .body("action=abc");
            then.status(200).body(r#"{"data":"n0nce"}"#);
        });

        let scraper = scraper_for(&server);
        let options = FetchOptions {
            agent: None,
            overrides: RequestOverrides {
                method: Some(Method::POST),
                url: None,
                headers: vec![("x-requested-with".to_string(), "XMLHttpRequest".to_string())],
                body: Some("action=abc".to_string()),
            },
        };
        let body = scraper
            .fetch("/wp-admin/admin-ajax.php", options)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(body, r#"{"data":"n0nce"}"#);
    }

    #[tokio::test]
    async fn test_fetch_url_override_ignores_base() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/elsewhere");
            then.status(200).body("moved");
        });

        let scraper = Scraper::new().unwrap();
        let options = FetchOptions {
            overrides: RequestOverrides {
                url: Some(server.url("/elsewhere")),
                ..Default::default()
            },
            ..Default::default()
        };
        let body = scraper.fetch("/ignored", options).await.unwrap();

        mock.assert();
        assert_eq!(body, "moved");
    }
}
