//! Webhook manager - main entry point.

use std::sync::Arc;

use crate::delivery::{DeliveryAttempt, DeliveryLog, DeliveryStats};
use crate::dispatcher::{DeliveryResult, WebhookDispatcher};
use crate::endpoint::{EndpointData, WebhookEndpoint};
use crate::error::WebhookResult;
use crate::payload::{SendOptions, WebhookMessage};
use crate::rate_limiter::{EndpointRateLimit, WebhookRateLimiter};
use crate::registry::WebhookRegistry;
use crate::schedule::ScheduledDelivery;
use crate::storage::{DeliveryLogStore, EndpointStore, InMemoryWebhookStorage};
use crate::transport::Transport;
use crate::validation::{DefaultValidator, EndpointValidator};

/// User-Agent sent with every delivery unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Discord-Webhook-Manager/1.0";

/// Hard send timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Webhook manager configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Send timeout in milliseconds.
    pub timeout_ms: u64,
    /// User-Agent header value.
    pub user_agent: String,
    /// Default per-endpoint admission limit.
    pub rate_limit: EndpointRateLimit,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rate_limit: EndpointRateLimit::default(),
        }
    }
}

impl WebhookConfig {
    /// Creates a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the send timeout.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the default admission limit.
    pub fn rate_limit(mut self, limit: EndpointRateLimit) -> Self {
        self.rate_limit = limit;
        self
    }
}

/// The main webhook manager.
///
/// Wires the registry, rate limiter, delivery log, and dispatcher over one
/// set of stores and one transport.
pub struct WebhookManager {
    config: WebhookConfig,
    registry: WebhookRegistry,
    rate_limiter: Arc<WebhookRateLimiter>,
    log: DeliveryLog,
    dispatcher: WebhookDispatcher,
}

impl WebhookManager {
    /// Creates a manager with in-memory storage and the default rules.
    pub fn in_memory(config: WebhookConfig, transport: Arc<dyn Transport>) -> Self {
        let storage = Arc::new(InMemoryWebhookStorage::new());
        Self::with_storage(
            config,
            storage.clone(),
            storage,
            Arc::new(DefaultValidator),
            transport,
        )
    }

    /// Creates a manager over custom stores and rules.
    pub fn with_storage(
        config: WebhookConfig,
        endpoints: Arc<dyn EndpointStore>,
        attempts: Arc<dyn DeliveryLogStore>,
        validator: Arc<dyn EndpointValidator>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let registry = WebhookRegistry::new(endpoints, validator);
        let rate_limiter = Arc::new(WebhookRateLimiter::with_default_limit(config.rate_limit.clone()));
        let log = DeliveryLog::new(attempts);
        let dispatcher = WebhookDispatcher::new(
            registry.clone(),
            rate_limiter.clone(),
            log.clone(),
            transport,
            &config,
        );

        Self {
            config,
            registry,
            rate_limiter,
            log,
            dispatcher,
        }
    }

    /// Registers a webhook endpoint for an owner.
    pub async fn register(&self, owner_id: &str, data: EndpointData) -> WebhookResult<WebhookEndpoint> {
        self.registry.register(owner_id, data).await
    }

    /// Gets an endpoint by ID.
    pub async fn endpoint(&self, id: &str) -> WebhookResult<WebhookEndpoint> {
        self.registry.lookup(id).await
    }

    /// Gets an owner's endpoints, newest first.
    pub async fn endpoints_for(&self, owner_id: &str) -> WebhookResult<Vec<WebhookEndpoint>> {
        self.registry.list_by_owner(owner_id).await
    }

    /// Delivers a message now.
    pub async fn send(
        &self,
        endpoint_id: &str,
        message: &WebhookMessage,
        options: &SendOptions,
    ) -> WebhookResult<DeliveryResult> {
        self.dispatcher.send(endpoint_id, message, options).await
    }

    /// Prepares a delivery for an external scheduler to trigger later.
    ///
    /// Only checks that the endpoint exists; activity and rate limits are
    /// evaluated when the delivery is triggered.
    pub async fn schedule(
        &self,
        endpoint_id: &str,
        schedule: impl Into<String>,
        message: WebhookMessage,
        options: SendOptions,
    ) -> WebhookResult<ScheduledDelivery> {
        let endpoint = self.registry.lookup(endpoint_id).await?;
        let scheduled = ScheduledDelivery::new(endpoint.id, schedule, message, options);

        tracing::debug!(
            scheduled_id = %scheduled.id,
            endpoint_id = %scheduled.endpoint_id,
            schedule = %scheduled.schedule,
            "Delivery scheduled"
        );
        Ok(scheduled)
    }

    /// Runs a scheduled delivery through the normal send path.
    pub async fn trigger_scheduled(&self, scheduled: &ScheduledDelivery) -> WebhookResult<DeliveryResult> {
        tracing::debug!(scheduled_id = %scheduled.id, "Triggering scheduled delivery");
        self.send(&scheduled.endpoint_id, &scheduled.message, &scheduled.options)
            .await
    }

    /// Gets delivery stats for an endpoint.
    pub async fn stats(&self, endpoint_id: &str) -> WebhookResult<DeliveryStats> {
        self.log.stats_for(endpoint_id).await
    }

    /// Gets logged attempts for an endpoint, oldest first.
    pub async fn attempts(&self, endpoint_id: &str) -> WebhookResult<Vec<DeliveryAttempt>> {
        self.log.attempts_for(endpoint_id).await
    }

    /// Gets the registry.
    pub fn registry(&self) -> &WebhookRegistry {
        &self.registry
    }

    /// Gets the rate limiter.
    pub fn rate_limiter(&self) -> &WebhookRateLimiter {
        &self.rate_limiter
    }

    /// Gets the dispatcher.
    pub fn dispatcher(&self) -> &WebhookDispatcher {
        &self.dispatcher
    }

    /// Gets the configuration.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }
}

#[cfg(feature = "http-client")]
impl WebhookManager {
    /// Creates an in-memory manager that delivers over reqwest.
    pub fn new() -> Self {
        Self::with_config(WebhookConfig::default())
    }

    /// Creates an in-memory reqwest-backed manager with custom configuration.
    pub fn with_config(config: WebhookConfig) -> Self {
        Self::in_memory(config, Arc::new(crate::transport::ReqwestTransport::new()))
    }
}

#[cfg(feature = "http-client")]
impl Default for WebhookManager {
    fn default() -> Self {
        Self::new()
    }
}
