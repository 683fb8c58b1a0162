//! Endpoint registration and lookup.

use std::sync::Arc;

use crate::endpoint::{EndpointData, WebhookEndpoint};
use crate::error::{WebhookError, WebhookResult};
use crate::storage::EndpointStore;
use crate::validation::EndpointValidator;

/// Lifecycle and lookup of webhook endpoints.
#[derive(Clone)]
pub struct WebhookRegistry {
    store: Arc<dyn EndpointStore>,
    validator: Arc<dyn EndpointValidator>,
}

impl WebhookRegistry {
    /// Creates a registry over a store and a rule set.
    pub fn new(store: Arc<dyn EndpointStore>, validator: Arc<dyn EndpointValidator>) -> Self {
        Self { store, validator }
    }

    /// Validates and stores a new, active endpoint.
    pub async fn register(&self, owner_id: &str, data: EndpointData) -> WebhookResult<WebhookEndpoint> {
        self.validate(&data)?;

        let endpoint = WebhookEndpoint::new(owner_id, data);
        self.store.insert_endpoint(&endpoint).await?;

        tracing::info!(
            endpoint_id = %endpoint.id,
            owner_id,
            "Webhook endpoint registered"
        );
        Ok(endpoint)
    }

    /// Gets an endpoint, failing if it does not exist.
    pub async fn lookup(&self, endpoint_id: &str) -> WebhookResult<WebhookEndpoint> {
        self.store
            .get_endpoint(endpoint_id)
            .await?
            .ok_or_else(|| WebhookError::EndpointNotFound(endpoint_id.to_string()))
    }

    /// Lists an owner's endpoints, newest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> WebhookResult<Vec<WebhookEndpoint>> {
        self.store.list_endpoints_by_owner(owner_id).await
    }

    /// Re-enables deliveries to an endpoint.
    pub async fn activate(&self, endpoint_id: &str) -> WebhookResult<WebhookEndpoint> {
        self.set_active(endpoint_id, true).await
    }

    /// Stops deliveries to an endpoint.
    pub async fn deactivate(&self, endpoint_id: &str) -> WebhookResult<WebhookEndpoint> {
        self.set_active(endpoint_id, false).await
    }

    /// Points an endpoint at a new URL after validating it.
    pub async fn update_url(&self, endpoint_id: &str, url: &str) -> WebhookResult<WebhookEndpoint> {
        let endpoint = self.lookup(endpoint_id).await?;
        self.validate(&EndpointData {
            url: Some(url.to_string()),
            name: endpoint.name,
        })?;

        // Only the URL is written, so a concurrent activate/deactivate is kept
        let updated = self
            .store
            .set_endpoint_url(endpoint_id, url)
            .await?
            .ok_or_else(|| WebhookError::EndpointNotFound(endpoint_id.to_string()))?;

        tracing::info!(endpoint_id, "Webhook endpoint URL changed");
        Ok(updated)
    }

    async fn set_active(&self, endpoint_id: &str, active: bool) -> WebhookResult<WebhookEndpoint> {
        let endpoint = self
            .store
            .set_endpoint_active(endpoint_id, active)
            .await?
            .ok_or_else(|| WebhookError::EndpointNotFound(endpoint_id.to_string()))?;

        tracing::info!(endpoint_id, active, "Webhook endpoint state changed");
        Ok(endpoint)
    }

    fn validate(&self, data: &EndpointData) -> WebhookResult<()> {
        let report = self.validator.validate(data);
        if report.is_valid {
            Ok(())
        } else {
            Err(WebhookError::Validation(report.errors.join(", ")))
        }
    }
}
