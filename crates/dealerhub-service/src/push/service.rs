//! Push delivery service.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use futures::future::join_all;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use dealerhub_core::config::push::PushConfig;
use dealerhub_core::types::{SubscriptionId, UserId};
use dealerhub_database::store::SubscriptionStore;
use dealerhub_entity::notification::{NotificationPriority, NotificationRecord};
use dealerhub_entity::push::PushSubscription;

use super::crypto;
use super::error::PushFailure;
use super::payload::PushPayload;
use super::transport::{PushRequest, PushTransport};
use super::vapid::VapidSigner;

/// Per-user delivery outcome.
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    /// Subscriptions the push service accepted the message for.
    pub sent: usize,
    /// Subscriptions that failed.
    pub failed: usize,
    /// Failure detail per subscription.
    pub errors: Vec<(SubscriptionId, PushFailure)>,
}

impl DeliverySummary {
    /// Number of delivery attempts made.
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

/// Delivers encrypted Web Push messages to users' active subscriptions.
pub struct PushService {
    subscriptions: Arc<dyn SubscriptionStore>,
    transport: Arc<dyn PushTransport>,
    vapid: Arc<VapidSigner>,
    config: PushConfig,
    limiter: Arc<Semaphore>,
}

impl fmt::Debug for PushService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushService")
            .field("vapid", &self.vapid)
            .field("available_permits", &self.limiter.available_permits())
            .finish_non_exhaustive()
    }
}

impl PushService {
    /// Creates a new push service.
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        transport: Arc<dyn PushTransport>,
        vapid: Arc<VapidSigner>,
        config: PushConfig,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_sends.max(1)));
        Self {
            subscriptions,
            transport,
            vapid,
            config,
            limiter,
        }
    }

    /// Application server public key for browser subscriptions.
    pub fn public_key(&self) -> &str {
        self.vapid.public_key()
    }

    /// Payload for a stored notification, with configured icon and badge.
    pub fn payload_for(&self, record: &NotificationRecord) -> PushPayload {
        PushPayload::from_record(record, &self.config.icon, &self.config.badge)
    }

    /// Push a stored notification to every active subscription of its recipient.
    pub async fn notify(&self, record: &NotificationRecord) -> DeliverySummary {
        self.deliver_to_user(record.user_id, &self.payload_for(record), record.priority)
            .await
    }

    /// Send `payload` to all of the user's active subscriptions concurrently.
    ///
    /// One failing subscription never affects the others.
    pub async fn deliver_to_user(
        &self,
        user_id: UserId,
        payload: &PushPayload,
        priority: NotificationPriority,
    ) -> DeliverySummary {
        let mut summary = DeliverySummary::default();
        if !self.config.enabled {
            return summary;
        }

        let subscriptions = match self.subscriptions.find_active_by_user(user_id).await {
            Ok(subs) => subs,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to load push subscriptions");
                return summary;
            }
        };

        let results = join_all(
            subscriptions
                .iter()
                .map(|sub| self.deliver(sub, payload, priority)),
        )
        .await;

        for (sub, result) in subscriptions.iter().zip(results) {
            match result {
                Ok(()) => summary.sent += 1,
                Err(failure) => {
                    summary.failed += 1;
                    summary.errors.push((sub.id, failure));
                }
            }
        }

        debug!(
            user_id = %user_id,
            sent = summary.sent,
            failed = summary.failed,
            "Push delivery finished"
        );
        summary
    }

    /// Deliver one message to one subscription and record the outcome.
    pub async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
        priority: NotificationPriority,
    ) -> Result<(), PushFailure> {
        let result = self.send(subscription, payload, priority).await;

        match &result {
            Ok(()) => {
                if let Err(e) = self
                    .subscriptions
                    .record_success(subscription.id, Utc::now())
                    .await
                {
                    warn!(subscription_id = %subscription.id, error = %e, "Failed to record push success");
                }
            }
            Err(failure) if failure.is_gone() => {
                info!(
                    subscription_id = %subscription.id,
                    user_id = %subscription.user_id,
                    "Push subscription gone, deactivating"
                );
                if let Err(e) = self.subscriptions.deactivate(subscription.id).await {
                    error!(subscription_id = %subscription.id, error = %e, "Failed to deactivate subscription");
                }
            }
            Err(failure) => {
                warn!(
                    subscription_id = %subscription.id,
                    user_id = %subscription.user_id,
                    error = %failure,
                    "Push delivery failed"
                );
                if let Err(e) = self.subscriptions.record_failure(subscription.id).await {
                    warn!(subscription_id = %subscription.id, error = %e, "Failed to record push failure");
                }
            }
        }

        result
    }

    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
        priority: NotificationPriority,
    ) -> Result<(), PushFailure> {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| PushFailure::Encryption(format!("failed to encode payload: {e}")))?;
        let body = crypto::encrypt(&plaintext, &subscription.p256dh, &subscription.auth)?;
        let authorization = self.vapid.authorization(&subscription.endpoint, Utc::now())?;

        let request = PushRequest {
            endpoint: subscription.endpoint.clone(),
            headers: vec![
                ("TTL", self.config.ttl_seconds.to_string()),
                ("Urgency", priority.push_urgency().to_string()),
                ("Topic", topic_for(&payload.tag)),
                ("Content-Encoding", "aes128gcm".to_string()),
                ("Content-Type", "application/octet-stream".to_string()),
                ("Authorization", authorization),
            ],
            body,
        };

        let response = {
            let _permit = self
                .limiter
                .acquire()
                .await
                .map_err(|_| PushFailure::Transport {
                    status: None,
                    body: "push sender shut down".to_string(),
                })?;
            self.transport.send(request).await?
        };

        if response.is_success() {
            Ok(())
        } else {
            Err(PushFailure::from_status(
                response.status,
                response.retry_after,
                response.body,
            ))
        }
    }
}

/// `Topic` header for a notification tag.
///
/// Topics are limited to 32 characters of the base64url alphabet, so the
/// tag is hashed.
pub fn topic_for(tag: &str) -> String {
    let digest = Sha256::digest(tag.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..24])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use dealerhub_core::types::NotificationId;
    use dealerhub_database::memory::MemorySubscriptionStore;
    use dealerhub_entity::notification::{EventType, NewNotification, NotificationCategory};
    use dealerhub_entity::push::{NewPushSubscription, SubscriptionKeys};
    use p256::SecretKey;
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use serde_json::json;

    use crate::push::transport::PushResponse;

    /// Answers with a fixed status per endpoint and records requests.
    #[derive(Default)]
    struct ScriptedTransport {
        statuses: Mutex<Vec<(String, u16)>>,
        requests: Mutex<Vec<PushRequest>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedTransport {
        fn answer(&self, endpoint: &str, status: u16) {
            self.statuses.lock().unwrap().push((endpoint.to_string(), status));
        }

        fn requests(&self) -> Vec<PushRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushTransport for ScriptedTransport {
        async fn send(&self, request: PushRequest) -> Result<PushResponse, PushFailure> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let status = self
                .statuses
                .lock()
                .unwrap()
                .iter()
                .find(|(e, _)| *e == request.endpoint)
                .map(|(_, s)| *s)
                .unwrap_or(201);
            self.requests.lock().unwrap().push(request);
            Ok(PushResponse {
                status,
                retry_after: (status == 429).then_some(60),
                body: String::new(),
            })
        }
    }

    fn keys() -> SubscriptionKeys {
        let secret = SecretKey::random(&mut aes_gcm::aead::OsRng);
        SubscriptionKeys {
            p256dh: URL_SAFE_NO_PAD.encode(secret.public_key().to_encoded_point(false).as_bytes()),
            auth: URL_SAFE_NO_PAD.encode([1u8; 16]),
        }
    }

    async fn subscribe(store: &MemorySubscriptionStore, user: UserId, endpoint: &str) -> PushSubscription {
        store
            .upsert(NewPushSubscription {
                user_id: user,
                device_id: None,
                endpoint: endpoint.to_string(),
                keys: keys(),
            })
            .await
            .unwrap()
    }

    fn record(user: UserId, priority: NotificationPriority) -> NotificationRecord {
        NewNotification {
            user_id: user,
            event_type: EventType::LeadAssigned,
            category: NotificationCategory::Leads,
            priority,
            title: "Lead assigned".into(),
            message: "Ann's lead is yours".into(),
            action_url: Some("/leads/9".into()),
            entity_type: Some("lead".into()),
            entity_id: Some("9".into()),
            action_data: json!({}),
        }
        .into_record(NotificationId::new(), Utc::now())
    }

    fn service(
        store: Arc<MemorySubscriptionStore>,
        transport: Arc<ScriptedTransport>,
        config: PushConfig,
    ) -> PushService {
        PushService::new(
            store,
            transport,
            Arc::new(VapidSigner::generate("mailto:ops@dealer.example").unwrap()),
            config,
        )
    }

    #[tokio::test]
    async fn test_gone_deactivates_and_is_skipped_next_time() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let transport = Arc::new(ScriptedTransport::default());
        let user = UserId::new();
        subscribe(&store, user, "https://push.example/gone").await;
        subscribe(&store, user, "https://push.example/live").await;
        transport.answer("https://push.example/gone", 410);

        let push = service(store.clone(), transport.clone(), PushConfig::default());
        let rec = record(user, NotificationPriority::High);

        let first = push.notify(&rec).await;
        assert_eq!(first.sent, 1);
        assert_eq!(first.failed, 1);
        assert_eq!(first.errors[0].1, PushFailure::Gone { status: 410 });
        assert!(!store.get("https://push.example/gone").unwrap().is_active);
        assert!(store.get("https://push.example/live").unwrap().last_success_at.is_some());

        let second = push.notify(&rec).await;
        assert_eq!(second.attempted(), 1);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_failures_are_contained_and_classified() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let transport = Arc::new(ScriptedTransport::default());
        let user = UserId::new();
        subscribe(&store, user, "https://push.example/throttled").await;
        subscribe(&store, user, "https://push.example/broken").await;
        subscribe(&store, user, "https://push.example/ok").await;
        transport.answer("https://push.example/throttled", 429);
        transport.answer("https://push.example/broken", 502);

        let push = service(store.clone(), transport, PushConfig::default());
        let summary = push.notify(&record(user, NotificationPriority::Low)).await;

        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 2);
        assert!(summary
            .errors
            .iter()
            .any(|(_, f)| *f == PushFailure::RateLimited { retry_after: Some(60) }));
        assert!(summary
            .errors
            .iter()
            .any(|(_, f)| matches!(f, PushFailure::Transport { status: Some(502), .. })));
        let throttled = store.get("https://push.example/throttled").unwrap();
        assert!(throttled.is_active);
        assert_eq!(throttled.failure_count, 1);
    }

    #[tokio::test]
    async fn test_request_headers() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let transport = Arc::new(ScriptedTransport::default());
        let user = UserId::new();
        subscribe(&store, user, "https://push.example/a").await;

        let push = service(store, transport.clone(), PushConfig::default());
        push.notify(&record(user, NotificationPriority::Medium)).await;

        let request = &transport.requests()[0];
        assert_eq!(request.header("TTL"), Some("86400"));
        assert_eq!(request.header("urgency"), Some("normal"));
        assert_eq!(request.header("Content-Encoding"), Some("aes128gcm"));
        let topic = request.header("Topic").unwrap();
        assert_eq!(topic.len(), 32);
        assert!(request.header("Authorization").unwrap().starts_with("vapid t="));
    }

    #[tokio::test]
    async fn test_malformed_keys_fail_without_network_call() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let transport = Arc::new(ScriptedTransport::default());
        let user = UserId::new();
        store
            .upsert(NewPushSubscription {
                user_id: user,
                device_id: None,
                endpoint: "https://push.example/bad".into(),
                keys: SubscriptionKeys {
                    p256dh: "AAAA".into(),
                    auth: "AAAA".into(),
                },
            })
            .await
            .unwrap();

        let push = service(store.clone(), transport.clone(), PushConfig::default());
        let summary = push.notify(&record(user, NotificationPriority::Low)).await;

        assert_eq!(summary.failed, 1);
        assert!(matches!(summary.errors[0].1, PushFailure::Encryption(_)));
        assert!(transport.requests().is_empty());
        assert!(store.get("https://push.example/bad").unwrap().is_active);
    }

    #[tokio::test]
    async fn test_outstanding_sends_are_bounded() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let transport = Arc::new(ScriptedTransport::default());
        let user = UserId::new();
        for i in 0..8 {
            subscribe(&store, user, &format!("https://push.example/{i}")).await;
        }
        let config = PushConfig {
            max_concurrent_sends: 2,
            ..Default::default()
        };

        let push = service(store, transport.clone(), config);
        let summary = push.notify(&record(user, NotificationPriority::Low)).await;

        assert_eq!(summary.sent, 8);
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_disabled_push_sends_nothing() {
        let store = Arc::new(MemorySubscriptionStore::new());
        let transport = Arc::new(ScriptedTransport::default());
        let user = UserId::new();
        subscribe(&store, user, "https://push.example/a").await;
        let config = PushConfig {
            enabled: false,
            ..Default::default()
        };

        let summary = service(store, transport.clone(), config)
            .notify(&record(user, NotificationPriority::Urgent))
            .await;
        assert_eq!(summary.attempted(), 0);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_topic_is_stable_and_url_safe() {
        let a = topic_for("vehicle.sold-42");
        assert_eq!(a, topic_for("vehicle.sold-42"));
        assert_ne!(a, topic_for("vehicle.sold-43"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
