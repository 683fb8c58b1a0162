//! Single-delivery orchestration.
//!
//! A call to [`WebhookDispatcher::send`] moves through
//! `Starting -> Admitted -> Sending -> Succeeded | Failed -> Logged -> Done`.
//! Failures before `Admitted` return immediately and leave no trace in the
//! delivery log. Once admitted, the rest of the sequence runs on its own task
//! so that dropping the caller's future cannot skip the log write.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::time::Instant;

use crate::delivery::{DeliveryAttempt, DeliveryLog};
use crate::endpoint::WebhookEndpoint;
use crate::error::{TransportError, WebhookError, WebhookResult};
use crate::payload::{SendOptions, WebhookMessage, WebhookPayload};
use crate::rate_limiter::WebhookRateLimiter;
use crate::registry::WebhookRegistry;
use crate::system::WebhookConfig;
use crate::transport::{Transport, TransportResponse};

/// What a successful delivery returns to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    /// ID of the logged attempt.
    pub attempt_id: String,
    pub status_code: u16,
    /// Response body as returned by the remote.
    pub body: String,
    pub elapsed_ms: u64,
}

/// Orchestrates lookup, admission, send, and logging for one delivery.
#[derive(Clone)]
pub struct WebhookDispatcher {
    registry: WebhookRegistry,
    rate_limiter: Arc<WebhookRateLimiter>,
    log: DeliveryLog,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    headers: Arc<[(String, String)]>,
}

impl WebhookDispatcher {
    /// Creates a dispatcher.
    pub fn new(
        registry: WebhookRegistry,
        rate_limiter: Arc<WebhookRateLimiter>,
        log: DeliveryLog,
        transport: Arc<dyn Transport>,
        config: &WebhookConfig,
    ) -> Self {
        let headers: Vec<(String, String)> = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), config.user_agent.clone()),
        ];

        Self {
            registry,
            rate_limiter,
            log,
            transport,
            timeout: Duration::from_millis(config.timeout_ms),
            headers: headers.into(),
        }
    }

    /// Delivers a message to an endpoint.
    ///
    /// # Errors
    ///
    /// `EndpointNotFound`, `InactiveEndpoint` and `RateLimitExceeded` are
    /// returned before anything is sent or logged. `Transport` is returned
    /// after the failed attempt has been logged. `StorageError` means the
    /// attempt could not be logged.
    pub async fn send(
        &self,
        endpoint_id: &str,
        message: &WebhookMessage,
        options: &SendOptions,
    ) -> WebhookResult<DeliveryResult> {
        let endpoint = self.registry.lookup(endpoint_id).await?;

        if !endpoint.is_active {
            return Err(WebhookError::InactiveEndpoint(endpoint.id));
        }

        if !self.rate_limiter.admit(&endpoint.id).await {
            return Err(WebhookError::RateLimitExceeded(endpoint.id));
        }

        let task = tokio::spawn(self.clone().run_admitted(endpoint, message.clone(), options.clone()));
        task.await
            .map_err(|e| WebhookError::Internal(format!("delivery task failed: {}", e)))?
    }

    /// Sends, classifies, and logs an admitted delivery.
    async fn run_admitted(
        self,
        endpoint: WebhookEndpoint,
        message: WebhookMessage,
        options: SendOptions,
    ) -> WebhookResult<DeliveryResult> {
        let payload = WebhookPayload::build(&message, &options);

        let start = Instant::now();
        let outcome = self.post(&endpoint.url, &payload).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let attempt = match &outcome {
            Ok(response) => {
                DeliveryAttempt::success(&endpoint.id, response.status_code, elapsed_ms, message)
            }
            Err(err) => DeliveryAttempt::failure(
                &endpoint.id,
                err.response_status(),
                err.to_string(),
                elapsed_ms,
                message,
            ),
        };

        if let Err(log_err) = self.log.record(&attempt).await {
            tracing::error!(
                endpoint_id = %endpoint.id,
                success = attempt.success,
                delivery_error = ?outcome.as_ref().err(),
                error = %log_err,
                "Failed to record delivery attempt"
            );
            return Err(log_err);
        }

        match outcome {
            Ok(response) => {
                tracing::info!(
                    endpoint_id = %endpoint.id,
                    status = response.status_code,
                    elapsed_ms,
                    "Webhook delivered"
                );
                Ok(DeliveryResult {
                    attempt_id: attempt.id,
                    status_code: response.status_code,
                    body: response.body,
                    elapsed_ms,
                })
            }
            Err(err) => {
                tracing::warn!(
                    endpoint_id = %endpoint.id,
                    status = ?attempt.status_code,
                    elapsed_ms,
                    error = %err,
                    "Webhook delivery failed"
                );
                Err(err)
            }
        }
    }

    /// Posts the payload under the hard timeout and classifies the response.
    async fn post(&self, url: &str, payload: &WebhookPayload) -> WebhookResult<TransportResponse> {
        let body = payload.to_value()?;
        let send = AssertUnwindSafe(self.transport.post(url, &body, self.timeout, &self.headers))
            .catch_unwind();

        let response = match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(result)) => result?,
            Ok(Err(panic)) => return Err(TransportError::Panicked(panic_message(panic.as_ref())).into()),
            Err(_) => {
                return Err(TransportError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }
                .into());
            }
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status {
                status: response.status_code,
                body: response.body,
            }
            .into())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
