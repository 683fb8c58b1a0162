//! Deferred deliveries handed to an external scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{SendOptions, WebhookMessage};

/// A delivery to be triggered later by a scheduler.
///
/// The schedule expression is opaque here; only the scheduler that owns the
/// timer interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDelivery {
    pub id: String,
    pub endpoint_id: String,
    pub schedule: String,
    pub message: WebhookMessage,
    #[serde(default)]
    pub options: SendOptions,
    pub created_at: DateTime<Utc>,
}

impl ScheduledDelivery {
    /// Creates a trigger record.
    pub fn new(
        endpoint_id: impl Into<String>,
        schedule: impl Into<String>,
        message: WebhookMessage,
        options: SendOptions,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            endpoint_id: endpoint_id.into(),
            schedule: schedule.into(),
            message,
            options,
            created_at: Utc::now(),
        }
    }
}
