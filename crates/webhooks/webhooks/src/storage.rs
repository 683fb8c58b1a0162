//! Webhook storage traits for persistence.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::delivery::DeliveryAttempt;
use crate::endpoint::WebhookEndpoint;
use crate::error::{WebhookError, WebhookResult};

/// Trait for endpoint storage backends.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Gets an endpoint by ID.
    async fn get_endpoint(&self, id: &str) -> WebhookResult<Option<WebhookEndpoint>>;

    /// Inserts a new endpoint.
    async fn insert_endpoint(&self, endpoint: &WebhookEndpoint) -> WebhookResult<()>;

    /// Sets the active flag and bumps `updated_at` in one write.
    ///
    /// Returns the updated endpoint, or `None` if it does not exist.
    async fn set_endpoint_active(&self, id: &str, active: bool) -> WebhookResult<Option<WebhookEndpoint>>;

    /// Sets the URL and bumps `updated_at` in one write.
    ///
    /// Returns the updated endpoint, or `None` if it does not exist.
    async fn set_endpoint_url(&self, id: &str, url: &str) -> WebhookResult<Option<WebhookEndpoint>>;

    /// Lists an owner's endpoints, newest-created first.
    async fn list_endpoints_by_owner(&self, owner_id: &str) -> WebhookResult<Vec<WebhookEndpoint>>;
}

/// Trait for delivery log storage backends.
#[async_trait]
pub trait DeliveryLogStore: Send + Sync {
    /// Appends a delivery attempt.
    async fn insert_attempt(&self, attempt: &DeliveryAttempt) -> WebhookResult<()>;

    /// Gets all attempts for an endpoint, in insertion order.
    async fn find_attempts_by_endpoint(&self, endpoint_id: &str) -> WebhookResult<Vec<DeliveryAttempt>>;
}

/// In-memory webhook storage for testing and single-process use.
pub struct InMemoryWebhookStorage {
    endpoints: RwLock<Vec<WebhookEndpoint>>,
    attempts: RwLock<HashMap<String, Vec<DeliveryAttempt>>>,
}

impl InMemoryWebhookStorage {
    /// Creates a new in-memory storage.
    pub fn new() -> Self {
        Self {
            endpoints: RwLock::new(Vec::new()),
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of attempts stored across all endpoints.
    pub async fn attempt_count(&self) -> usize {
        self.attempts.read().await.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryWebhookStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointStore for InMemoryWebhookStorage {
    async fn get_endpoint(&self, id: &str) -> WebhookResult<Option<WebhookEndpoint>> {
        let endpoints = self.endpoints.read().await;
        Ok(endpoints.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_endpoint(&self, endpoint: &WebhookEndpoint) -> WebhookResult<()> {
        let mut endpoints = self.endpoints.write().await;
        if endpoints.iter().any(|e| e.id == endpoint.id) {
            return Err(WebhookError::storage(format!(
                "endpoint {} already exists",
                endpoint.id
            )));
        }
        endpoints.push(endpoint.clone());
        Ok(())
    }

    async fn set_endpoint_active(&self, id: &str, active: bool) -> WebhookResult<Option<WebhookEndpoint>> {
        let mut endpoints = self.endpoints.write().await;
        Ok(endpoints.iter_mut().find(|e| e.id == id).map(|endpoint| {
            endpoint.set_active(active);
            endpoint.clone()
        }))
    }

    async fn set_endpoint_url(&self, id: &str, url: &str) -> WebhookResult<Option<WebhookEndpoint>> {
        let mut endpoints = self.endpoints.write().await;
        Ok(endpoints.iter_mut().find(|e| e.id == id).map(|endpoint| {
            endpoint.set_url(url);
            endpoint.clone()
        }))
    }

    async fn list_endpoints_by_owner(&self, owner_id: &str) -> WebhookResult<Vec<WebhookEndpoint>> {
        let endpoints = self.endpoints.read().await;
        // Reverse first so equal timestamps keep later inserts in front
        let mut owned: Vec<_> = endpoints
            .iter()
            .rev()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

#[async_trait]
impl DeliveryLogStore for InMemoryWebhookStorage {
    async fn insert_attempt(&self, attempt: &DeliveryAttempt) -> WebhookResult<()> {
        let mut attempts = self.attempts.write().await;
        attempts
            .entry(attempt.endpoint_id.clone())
            .or_default()
            .push(attempt.clone());
        Ok(())
    }

    async fn find_attempts_by_endpoint(&self, endpoint_id: &str) -> WebhookResult<Vec<DeliveryAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(endpoint_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointData;
    use chrono::Duration;

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let storage = InMemoryWebhookStorage::new();

        let mut older = WebhookEndpoint::new("user-1", EndpointData::new("https://a.example.com"));
        older.created_at = older.created_at - Duration::minutes(5);
        let newer = WebhookEndpoint::new("user-1", EndpointData::new("https://b.example.com"));
        let other = WebhookEndpoint::new("user-2", EndpointData::new("https://c.example.com"));

        storage.insert_endpoint(&newer).await.unwrap();
        storage.insert_endpoint(&older).await.unwrap();
        storage.insert_endpoint(&other).await.unwrap();

        let listed = storage.list_endpoints_by_owner("user-1").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, [newer.id.as_str(), older.id.as_str()]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let storage = InMemoryWebhookStorage::new();
        let endpoint = WebhookEndpoint::new("user-1", EndpointData::new("https://a.example.com"));

        storage.insert_endpoint(&endpoint).await.unwrap();
        assert!(matches!(
            storage.insert_endpoint(&endpoint).await,
            Err(WebhookError::StorageError(_))
        ));
    }

    #[tokio::test]
    async fn test_field_updates_on_missing_endpoint() {
        let storage = InMemoryWebhookStorage::new();

        assert_eq!(storage.set_endpoint_active("missing", false).await.unwrap(), None);
        assert_eq!(
            storage.set_endpoint_url("missing", "https://a.example.com").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_field_updates_leave_other_fields() {
        let storage = InMemoryWebhookStorage::new();
        let endpoint = WebhookEndpoint::new("user-1", EndpointData::new("https://a.example.com"));
        storage.insert_endpoint(&endpoint).await.unwrap();

        storage.set_endpoint_active(&endpoint.id, false).await.unwrap();
        let updated = storage
            .set_endpoint_url(&endpoint.id, "https://b.example.com")
            .await
            .unwrap()
            .unwrap();

        assert!(!updated.is_active);
        assert_eq!(updated.url, "https://b.example.com");
        assert_eq!(storage.get_endpoint(&endpoint.id).await.unwrap(), Some(updated));
    }
}
