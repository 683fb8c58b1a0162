//! # Webhook Manager
//!
//! Outbound webhook delivery:
//! - Endpoint registration and lifecycle
//! - Per-endpoint sliding-window rate limiting
//! - Payload construction that omits unset fields
//! - Send, classify, and log every admitted delivery
//! - Per-endpoint delivery stats
//!
//! ## Example
//!
//! ```rust,ignore
//! use webhook_manager::{EndpointData, SendOptions, WebhookManager, WebhookMessage};
//!
//! let manager = WebhookManager::new();
//!
//! let endpoint = manager
//!     .register("user-1", EndpointData::new("https://discord.com/api/webhooks/..."))
//!     .await?;
//!
//! manager
//!     .send(&endpoint.id, &WebhookMessage::text("deploy finished"), &SendOptions::new())
//!     .await?;
//!
//! let stats = manager.stats(&endpoint.id).await?;
//! ```

mod endpoint;
mod delivery;
mod dispatcher;
mod payload;
mod registry;
mod schedule;
mod storage;
mod error;
mod system;
mod transport;
mod validation;
pub mod rate_limiter;

pub use endpoint::{WebhookEndpoint, EndpointData};
pub use delivery::{DeliveryAttempt, DeliveryLog, DeliveryStats, SUCCESS_MESSAGE};
pub use dispatcher::{WebhookDispatcher, DeliveryResult};
pub use payload::{WebhookMessage, SendOptions, WebhookPayload};
pub use registry::WebhookRegistry;
pub use schedule::ScheduledDelivery;
pub use storage::{EndpointStore, DeliveryLogStore, InMemoryWebhookStorage};
pub use error::{WebhookError, WebhookResult, TransportError};
pub use system::{WebhookManager, WebhookConfig, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT_MS};
pub use transport::{Transport, TransportResponse};
#[cfg(feature = "http-client")]
pub use transport::ReqwestTransport;
pub use validation::{EndpointValidator, DefaultValidator, ValidationReport, MAX_NAME_LEN};
pub use rate_limiter::{WebhookRateLimiter, EndpointRateLimit, RateLimitInfo};
