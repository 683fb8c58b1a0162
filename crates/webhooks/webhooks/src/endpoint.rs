//! Webhook endpoint records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered webhook target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    /// Unique identifier.
    pub id: String,
    /// Owning user.
    pub owner_id: String,
    /// Human-readable name.
    pub name: Option<String>,
    /// Target URL.
    pub url: String,
    /// Whether deliveries are allowed.
    pub is_active: bool,
    /// When the endpoint was created.
    pub created_at: DateTime<Utc>,
    /// When the endpoint was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WebhookEndpoint {
    /// Creates an active endpoint from validated registration data.
    pub fn new(owner_id: impl Into<String>, data: EndpointData) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            name: data.name,
            url: data.url.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the active flag and bumps `updated_at`.
    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.touch();
    }

    /// Replaces the URL and bumps `updated_at`.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Registration input for a new endpoint.
///
/// Fields are optional so that missing values reach the validator
/// instead of failing at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointData {
    /// Target URL.
    pub url: Option<String>,
    /// Human-readable name.
    pub name: Option<String>,
}

impl EndpointData {
    /// Creates registration data for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            name: None,
        }
    }

    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
