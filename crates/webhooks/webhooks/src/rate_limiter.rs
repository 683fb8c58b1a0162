//! Rate Limiter for Webhook Endpoints
//!
//! Sliding-window admission control per endpoint:
//! - Configurable admissions per window
//! - Per-endpoint overrides
//! - Linearizable check-and-record for concurrent callers

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Rate limiter for webhook endpoints
pub struct WebhookRateLimiter {
    windows: RwLock<HashMap<String, Arc<SlidingWindow>>>,
    default_limit: EndpointRateLimit,
}

/// Rate limit configuration for an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRateLimit {
    /// Maximum admissions per window
    pub max_requests: u32,

    /// Length of the rolling window
    pub window: Duration,
}

impl EndpointRateLimit {
    /// Creates a limit of `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

impl Default for EndpointRateLimit {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// Limit and admission instants for one endpoint.
///
/// The mutex is never held across an await point.
struct SlidingWindow {
    state: Mutex<WindowState>,
}

struct WindowState {
    limit: EndpointRateLimit,
    admitted: VecDeque<Instant>,
}

impl SlidingWindow {
    fn new(limit: EndpointRateLimit) -> Self {
        Self {
            state: Mutex::new(WindowState {
                limit,
                admitted: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops expired instants, then records `now` if a slot is free.
    ///
    /// On refusal, returns the limit that was applied.
    fn try_admit(&self, now: Instant) -> Result<(), EndpointRateLimit> {
        let mut state = self.lock();
        state.evict(now);

        if state.admitted.len() >= state.limit.max_requests as usize {
            return Err(state.limit.clone());
        }
        state.admitted.push_back(now);
        Ok(())
    }

    fn set_limit(&self, limit: EndpointRateLimit) {
        self.lock().limit = limit;
    }

    fn clear(&self) {
        self.lock().admitted.clear();
    }

    fn info(&self, now: Instant) -> RateLimitInfo {
        let mut state = self.lock();
        state.evict(now);
        let used = state.admitted.len() as u32;
        RateLimitInfo {
            max_requests: state.limit.max_requests,
            window: state.limit.window,
            used,
            remaining: state.limit.max_requests.saturating_sub(used),
        }
    }
}

impl WindowState {
    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.admitted.front() {
            if now.duration_since(*oldest) >= self.limit.window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }
}

impl WebhookRateLimiter {
    /// Create a new rate limiter with default limits
    pub fn new() -> Self {
        Self::with_default_limit(EndpointRateLimit::default())
    }

    /// Create a rate limiter with custom default limits
    pub fn with_default_limit(default_limit: EndpointRateLimit) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            default_limit,
        }
    }

    /// Decide whether a delivery to `endpoint_id` may proceed now.
    ///
    /// An admitted call is counted against the window before returning.
    pub async fn admit(&self, endpoint_id: &str) -> bool {
        let window = self.get_or_create_window(endpoint_id).await;

        match window.try_admit(Instant::now()) {
            Ok(()) => {
                tracing::debug!(endpoint_id, "Delivery admitted");
                true
            }
            Err(limit) => {
                tracing::warn!(
                    endpoint_id,
                    max_requests = limit.max_requests,
                    window_secs = limit.window.as_secs(),
                    "Delivery refused by rate limiter"
                );
                false
            }
        }
    }

    /// Set custom rate limit for an endpoint
    ///
    /// Admissions already recorded stay in the window and count against the
    /// new limit.
    pub async fn set_limit(&self, endpoint_id: &str, limit: EndpointRateLimit) {
        self.get_or_create_window(endpoint_id).await.set_limit(limit);
    }

    /// Forget all admissions recorded for an endpoint.
    pub async fn reset(&self, endpoint_id: &str) {
        let windows = self.windows.read().await;
        if let Some(window) = windows.get(endpoint_id) {
            window.clear();
        }
    }

    /// Get current rate limit info for an endpoint
    pub async fn limit_info(&self, endpoint_id: &str) -> RateLimitInfo {
        let windows = self.windows.read().await;
        match windows.get(endpoint_id) {
            Some(window) => window.info(Instant::now()),
            None => RateLimitInfo {
                max_requests: self.default_limit.max_requests,
                window: self.default_limit.window,
                used: 0,
                remaining: self.default_limit.max_requests,
            },
        }
    }

    /// Get or create the window for an endpoint
    async fn get_or_create_window(&self, endpoint_id: &str) -> Arc<SlidingWindow> {
        {
            let windows = self.windows.read().await;
            if let Some(window) = windows.get(endpoint_id) {
                return window.clone();
            }
        }

        // Another caller may have created it between the two locks
        let mut windows = self.windows.write().await;
        match windows.entry(endpoint_id.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => entry
                .insert(Arc::new(SlidingWindow::new(self.default_limit.clone())))
                .clone(),
        }
    }
}

impl Default for WebhookRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about current rate limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub max_requests: u32,
    pub window: Duration,
    pub used: u32,
    pub remaining: u32,
}
