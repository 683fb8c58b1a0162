//! Runner configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use webhook_manager::{
    DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT, EndpointRateLimit, SendOptions, WebhookConfig,
    WebhookMessage,
};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Outbound request settings.
    pub dispatch: DispatchConfig,
    /// Default per-endpoint admission limit.
    pub rate_limit: RateLimitConfig,
    /// Endpoints to register.
    pub endpoints: Vec<EndpointConfig>,
    /// Deliveries to run, in order.
    pub deliveries: Vec<DeliveryConfig>,
}

impl RunnerConfig {
    /// Builds the library configuration.
    pub fn webhook_config(&self) -> WebhookConfig {
        WebhookConfig::new()
            .timeout_ms(self.dispatch.timeout_ms)
            .user_agent(self.dispatch.user_agent.clone())
            .rate_limit(EndpointRateLimit::new(
                self.rate_limit.max_requests,
                Duration::from_secs(self.rate_limit.window_secs),
            ))
    }
}

/// Log level wrapper that defaults to `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

/// Outbound request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Send timeout in milliseconds.
    pub timeout_ms: u64,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Admission limit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Admissions per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let limit = EndpointRateLimit::default();
        Self {
            max_requests: limit.max_requests,
            window_secs: limit.window.as_secs(),
        }
    }
}

/// An endpoint to register at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Local key referenced by deliveries.
    pub name: String,
    /// Owning user.
    pub owner_id: String,
    /// Target URL.
    pub url: String,
    /// Register as inactive.
    #[serde(default)]
    pub disabled: bool,
}

/// A delivery to run once the endpoints are registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Name of the target endpoint.
    pub endpoint: String,
    #[serde(flatten)]
    pub message: WebhookMessage,
    #[serde(flatten)]
    pub options: SendOptions,
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &str) -> Result<RunnerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RunnerConfig, ConfigError> {
    let config: RunnerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    for delivery in &config.deliveries {
        if !config.endpoints.iter().any(|e| e.name == delivery.endpoint) {
            return Err(ConfigError::UnknownEndpoint(delivery.endpoint.clone()));
        }
    }

    Ok(config)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Delivery references unknown endpoint '{0}'")]
    UnknownEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.log_level.0, "info");
        assert_eq!(config.dispatch.timeout_ms, 10_000);
        assert_eq!(config.rate_limit.max_requests, 30);
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            log_level = "debug"

            [dispatch]
            timeout_ms = 5000

            [rate_limit]
            max_requests = 5
            window_secs = 10

            [[endpoints]]
            name = "alerts"
            owner_id = "user-1"
            url = "https://hooks.example.com/alerts"

            [[deliveries]]
            endpoint = "alerts"
            content = "deploy finished"
            username = "ci-bot"
            tts = true
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level.0, "debug");
        assert_eq!(config.dispatch.user_agent, DEFAULT_USER_AGENT);

        let webhook = config.webhook_config();
        assert_eq!(webhook.timeout_ms, 5000);
        assert_eq!(webhook.rate_limit, EndpointRateLimit::new(5, Duration::from_secs(10)));

        let delivery = &config.deliveries[0];
        assert_eq!(delivery.message.content.as_deref(), Some("deploy finished"));
        assert_eq!(delivery.message.embeds, None);
        assert_eq!(delivery.options.username.as_deref(), Some("ci-bot"));
        assert_eq!(delivery.options.tts, Some(true));
        assert!(!config.endpoints[0].disabled);
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let err = parse_config(
            r#"
            [[deliveries]]
            endpoint = "nowhere"
            content = "hi"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEndpoint(name) if name == "nowhere"));
    }
}
