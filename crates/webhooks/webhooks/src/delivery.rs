//! Delivery attempt records, the delivery log, and stats.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WebhookResult;
use crate::payload::WebhookMessage;
use crate::storage::DeliveryLogStore;

/// Outcome message recorded for successful deliveries.
pub const SUCCESS_MESSAGE: &str = "Webhook sent successfully";

/// One logged delivery attempt. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Attempt ID.
    pub id: String,
    /// Endpoint ID.
    pub endpoint_id: String,
    /// Whether the remote answered 2xx.
    pub success: bool,
    /// HTTP status code (if a response was received).
    pub status_code: Option<u16>,
    /// Wall-clock time spent in the send.
    pub elapsed_ms: u64,
    /// Human-readable outcome.
    pub message: String,
    /// The caller's message, not the wire payload.
    pub payload: WebhookMessage,
    /// When the attempt was logged.
    pub created_at: DateTime<Utc>,
}

impl DeliveryAttempt {
    /// Creates a successful attempt record.
    pub fn success(
        endpoint_id: impl Into<String>,
        status_code: u16,
        elapsed_ms: u64,
        payload: WebhookMessage,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            endpoint_id: endpoint_id.into(),
            success: true,
            status_code: Some(status_code),
            elapsed_ms,
            message: SUCCESS_MESSAGE.to_string(),
            payload,
            created_at: Utc::now(),
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(
        endpoint_id: impl Into<String>,
        status_code: Option<u16>,
        error: impl Into<String>,
        elapsed_ms: u64,
        payload: WebhookMessage,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            endpoint_id: endpoint_id.into(),
            success: false,
            status_code,
            elapsed_ms,
            message: error.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// Aggregate delivery counts for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage in `0.0..=100.0`.
    pub success_rate: f64,
}

impl DeliveryStats {
    /// Computes stats over a set of attempts.
    pub fn from_attempts<'a>(attempts: impl IntoIterator<Item = &'a DeliveryAttempt>) -> Self {
        let (total, successful) = attempts
            .into_iter()
            .fold((0usize, 0usize), |(total, ok), a| (total + 1, ok + a.success as usize));

        let success_rate = if total > 0 {
            successful as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total,
            successful,
            failed: total - successful,
            success_rate,
        }
    }
}

/// Append-only sink for delivery attempts.
#[derive(Clone)]
pub struct DeliveryLog {
    store: Arc<dyn DeliveryLogStore>,
}

impl DeliveryLog {
    /// Creates a log over a store.
    pub fn new(store: Arc<dyn DeliveryLogStore>) -> Self {
        Self { store }
    }

    /// Appends an attempt.
    pub async fn record(&self, attempt: &DeliveryAttempt) -> WebhookResult<()> {
        self.store.insert_attempt(attempt).await
    }

    /// Returns every attempt for an endpoint, oldest first.
    pub async fn attempts_for(&self, endpoint_id: &str) -> WebhookResult<Vec<DeliveryAttempt>> {
        self.store.find_attempts_by_endpoint(endpoint_id).await
    }

    /// Computes stats for an endpoint from its logged attempts.
    pub async fn stats_for(&self, endpoint_id: &str) -> WebhookResult<DeliveryStats> {
        let attempts = self.attempts_for(endpoint_id).await?;
        Ok(DeliveryStats::from_attempts(&attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryWebhookStorage;

    fn log() -> DeliveryLog {
        DeliveryLog::new(Arc::new(InMemoryWebhookStorage::new()))
    }

    #[tokio::test]
    async fn test_stats_empty() {
        let stats = log().stats_for("endpoint-1").await.unwrap();

        assert_eq!(stats.total, 0);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_stats_percentage() {
        let log = log();
        let message = WebhookMessage::text("hi");
        log.record(&DeliveryAttempt::success("endpoint-1", 200, 12, message.clone()))
            .await
            .unwrap();
        log.record(&DeliveryAttempt::success("endpoint-1", 204, 8, message.clone()))
            .await
            .unwrap();
        log.record(&DeliveryAttempt::failure(
            "endpoint-1",
            Some(500),
            "Request failed with status code 500",
            30,
            message.clone(),
        ))
        .await
        .unwrap();
        log.record(&DeliveryAttempt::failure("endpoint-2", None, "refused", 1, message))
            .await
            .unwrap();

        let stats = log.stats_for("endpoint-1").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_rate - 200.0 / 3.0).abs() < 1e-9);

        // No new attempts, same answer
        assert_eq!(log.stats_for("endpoint-1").await.unwrap(), stats);
    }

    #[tokio::test]
    async fn test_attempts_for_is_ordered() {
        let log = log();
        for content in ["first", "second"] {
            log.record(&DeliveryAttempt::success("endpoint-1", 200, 1, WebhookMessage::text(content)))
                .await
                .unwrap();
        }

        let attempts = log.attempts_for("endpoint-1").await.unwrap();
        let contents: Vec<_> = attempts
            .iter()
            .map(|a| a.payload.content.as_deref().unwrap())
            .collect();
        assert_eq!(contents, ["first", "second"]);
        assert_eq!(attempts[0].message, SUCCESS_MESSAGE);
    }
}
