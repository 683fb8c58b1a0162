//! End-to-end tests for the delivery pipeline
//!
//! Covers:
//! - Registration through stats
//! - Inactive and unknown endpoints
//! - Concurrent deliveries against one rate-limited endpoint
//! - Mixed outcomes feeding the stats

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use webhook_manager::{
    EndpointData, EndpointRateLimit, SendOptions, Transport, TransportError, TransportResponse,
    WebhookConfig, WebhookError, WebhookManager, WebhookMessage,
};

/// Answers with the next status from a script, repeating the last one.
struct ScriptedTransport {
    statuses: Vec<u16>,
    calls: AtomicUsize,
    bodies: std::sync::Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    fn new(statuses: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            statuses: statuses.to_vec(),
            calls: AtomicUsize::new(0),
            bodies: std::sync::Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(
        &self,
        _url: &str,
        body: &Value,
        _timeout: Duration,
        _headers: &[(String, String)],
    ) -> Result<TransportResponse, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().unwrap().push(body.clone());
        let status = self.statuses[n.min(self.statuses.len() - 1)];
        Ok(TransportResponse::new(status, ""))
    }
}

fn manager(transport: Arc<ScriptedTransport>, config: WebhookConfig) -> WebhookManager {
    WebhookManager::in_memory(config, transport)
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_register_send_stats() {
        let transport = ScriptedTransport::new(&[204]);
        let manager = manager(transport.clone(), WebhookConfig::default());

        let endpoint = manager
            .register("user-u", EndpointData::new("https://hooks.example.com/e"))
            .await
            .unwrap();

        let message: WebhookMessage = serde_json::from_value(json!({"content": "hello"})).unwrap();
        let result = manager
            .send(&endpoint.id, &message, &SendOptions::default())
            .await
            .unwrap();
        assert_eq!(result.status_code, 204);

        let stats = manager.stats(&endpoint.id).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.success_rate, 100.0);

        assert_eq!(
            transport.bodies.lock().unwrap()[0],
            json!({"content": "hello", "tts": false})
        );
    }

    #[tokio::test]
    async fn test_inactive_endpoint_leaves_stats_untouched() {
        let transport = ScriptedTransport::new(&[200]);
        let manager = manager(transport.clone(), WebhookConfig::default());

        let endpoint = manager
            .register("user-u", EndpointData::new("https://hooks.example.com/e"))
            .await
            .unwrap();
        manager.registry().deactivate(&endpoint.id).await.unwrap();

        let err = manager
            .send(&endpoint.id, &WebhookMessage::text("hello"), &SendOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::InactiveEndpoint(_)));
        assert!(!err.was_attempted());

        assert_eq!(manager.stats(&endpoint.id).await.unwrap().total, 0);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let transport = ScriptedTransport::new(&[200]);
        let manager = manager(transport.clone(), WebhookConfig::default());

        let err = manager
            .send("does-not-exist", &WebhookMessage::text("hello"), &SendOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::EndpointNotFound(_)));
        assert_eq!(err.status_code(), 404);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_mixed_outcomes() {
        let transport = ScriptedTransport::new(&[200, 500, 201]);
        let manager = manager(transport, WebhookConfig::default());

        let endpoint = manager
            .register("user-u", EndpointData::new("https://hooks.example.com/e"))
            .await
            .unwrap();

        let message = WebhookMessage::text("status update");
        let options = SendOptions::new();
        assert!(manager.send(&endpoint.id, &message, &options).await.is_ok());
        let err = manager.send(&endpoint.id, &message, &options).await.unwrap_err();
        assert!(err.was_attempted());
        assert!(manager.send(&endpoint.id, &message, &options).await.is_ok());

        let stats = manager.stats(&endpoint.id).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_rate - 66.666_666).abs() < 1e-3);

        let attempts = manager.attempts(&endpoint.id).await.unwrap();
        let statuses: Vec<_> = attempts.iter().map(|a| a.status_code).collect();
        assert_eq!(statuses, [Some(200), Some(500), Some(201)]);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_respect_limit() {
        const LIMIT: u32 = 3;

        let transport = ScriptedTransport::new(&[200]);
        let config = WebhookConfig::new().rate_limit(EndpointRateLimit::new(LIMIT, Duration::from_secs(60)));
        let manager = Arc::new(manager(transport.clone(), config));

        let endpoint = manager
            .register("user-u", EndpointData::new("https://hooks.example.com/e"))
            .await
            .unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let manager = manager.clone();
                let id = endpoint.id.clone();
                tokio::spawn(async move {
                    manager
                        .send(&id, &WebhookMessage::text(format!("msg {}", i)), &SendOptions::new())
                        .await
                })
            })
            .collect();

        let mut delivered = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => delivered += 1,
                Err(WebhookError::RateLimitExceeded(_)) => refused += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(delivered, LIMIT as usize);
        assert_eq!(refused, 20 - LIMIT as usize);
        assert_eq!(transport.calls(), LIMIT as usize);
        assert_eq!(manager.stats(&endpoint.id).await.unwrap().total, LIMIT as usize);
    }
}
