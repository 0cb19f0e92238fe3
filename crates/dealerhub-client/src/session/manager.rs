//! Owns the current session and rebuilds it on identity change.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::info;

use dealerhub_core::config::client::ClientConfig;
use dealerhub_realtime::message::ConnectedUser;

use super::connection::ConnectionSession;
use crate::bus::EventBus;
use crate::cache::ReadModelCache;
use crate::poller::{LocalNotifier, NotificationPoller, PollingApi};
use crate::profile::TransportProfile;
use crate::transport::Connector;

/// What the polling fallback needs from the host.
struct PollingFallback {
    api: Arc<dyn PollingApi>,
    notifier: Arc<dyn LocalNotifier>,
    visibility: watch::Receiver<bool>,
}

struct Active {
    session: Arc<ConnectionSession>,
    poller: Option<JoinHandle<()>>,
}

impl Active {
    async fn shutdown(self) {
        if let Some(poller) = self.poller {
            poller.abort();
        }
        self.session.shutdown().await;
    }
}

/// At most one live session, for the signed-in identity.
///
/// Local event subscriptions live on the manager's [`EventBus`] and survive
/// reconnects and identity changes. When the profile asks for it and a
/// polling fallback was supplied, a [`NotificationPoller`] runs for as long
/// as the session does.
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    profile: TransportProfile,
    baseline_rooms: Vec<String>,
    poll_interval: Duration,
    polling: Option<PollingFallback>,
    bus: Arc<EventBus>,
    cache: Arc<ReadModelCache>,
    current: Mutex<Option<Active>>,
}

impl SessionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        profile: TransportProfile,
        config: &ClientConfig,
    ) -> Self {
        Self {
            connector,
            profile,
            baseline_rooms: config.baseline_rooms.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            polling: None,
            bus: EventBus::new(),
            cache: Arc::new(ReadModelCache::new()),
            current: Mutex::new(None),
        }
    }

    /// Supply the polling fallback. `api` must act for whoever is signed
    /// in; it is only used when the profile sets `poll_fallback`.
    pub fn with_polling(
        mut self,
        api: Arc<dyn PollingApi>,
        notifier: Arc<dyn LocalNotifier>,
        visibility: watch::Receiver<bool>,
    ) -> Self {
        self.polling = Some(PollingFallback {
            api,
            notifier,
            visibility,
        });
        self
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn cache(&self) -> &Arc<ReadModelCache> {
        &self.cache
    }

    pub fn profile(&self) -> &TransportProfile {
        &self.profile
    }

    /// The session for `identity`, reusing the current one if it belongs to
    /// the same identity.
    pub async fn connect(&self, identity: ConnectedUser) -> Arc<ConnectionSession> {
        let mut current = self.current.lock().await;

        if let Some(active) = current.as_ref() {
            if active.session.identity() == &identity {
                return active.session.clone();
            }
        }

        if let Some(previous) = current.take() {
            info!(
                previous = %previous.session.identity().user_id,
                next = %identity.user_id,
                "Identity changed, replacing realtime session"
            );
            previous.shutdown().await;
            self.cache.clear();
        }

        let poller = self.spawn_poller(&identity);
        let session = ConnectionSession::start(
            identity,
            self.profile.clone(),
            self.connector.clone(),
            self.baseline_rooms.clone(),
            self.bus.clone(),
            self.cache.clone(),
        );
        *current = Some(Active {
            session: session.clone(),
            poller,
        });
        session
    }

    fn spawn_poller(&self, user: &ConnectedUser) -> Option<JoinHandle<()>> {
        if !self.profile.poll_fallback {
            return None;
        }
        let Some(polling) = self.polling.as_ref() else {
            info!(platform = ?self.profile.class, "Polling fallback wanted but not configured");
            return None;
        };
        info!(user_id = %user.user_id, "Starting notification polling fallback");
        let poller = NotificationPoller::new(
            polling.api.clone(),
            polling.notifier.clone(),
            self.poll_interval,
            polling.visibility.clone(),
        );
        Some(poller.spawn())
    }

    /// Close the current session, if any.
    pub async fn logout(&self) {
        let previous = self.current.lock().await.take();
        if let Some(active) = previous {
            info!(user_id = %active.session.identity().user_id, "Logging out realtime session");
            active.shutdown().await;
            self.cache.clear();
        }
    }

    pub async fn current(&self) -> Option<Arc<ConnectionSession>> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|active| active.session.clone())
    }

    /// Whether the polling fallback is running for the current session.
    pub async fn is_polling(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .and_then(|active| active.poller.as_ref())
            .is_some_and(|poller| !poller.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use dealerhub_core::types::{NotificationId, UserId};
    use dealerhub_entity::notification::NotificationRecord;
    use dealerhub_entity::user::UserRole;

    use crate::error::ClientError;
    use crate::platform::PlatformClass;
    use crate::session::status::ConnectionStatus;
    use crate::transport::MemoryConnector;

    fn user(name: &str, role: UserRole) -> ConnectedUser {
        ConnectedUser {
            user_id: UserId::new(),
            username: name.into(),
            role,
        }
    }

    #[derive(Default)]
    struct CountingApi {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl PollingApi for CountingApi {
        async fn pending(&self) -> Result<Vec<NotificationRecord>, ClientError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn mark_delivered(&self, _id: NotificationId) -> Result<(), ClientError> {
            Ok(())
        }
    }

    struct SilentNotifier;

    impl LocalNotifier for SilentNotifier {
        fn show(&self, _notification: &NotificationRecord) -> bool {
            true
        }
    }

    fn polling_manager(
        class: PlatformClass,
        api: Arc<CountingApi>,
    ) -> (SessionManager, watch::Sender<bool>) {
        let (connector, _peers) = MemoryConnector::new();
        let (visible, visibility) = watch::channel(true);
        let manager = SessionManager::new(
            Arc::new(connector),
            TransportProfile::for_class(class),
            &ClientConfig::default(),
        )
        .with_polling(api, Arc::new(SilentNotifier), visibility);
        (manager, visible)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ios_safari_profile_starts_polling() {
        let api = Arc::new(CountingApi::default());
        let (manager, _visible) = polling_manager(PlatformClass::IosSafari, api.clone());

        manager.connect(user("sam", UserRole::Salesperson)).await;
        assert!(manager.is_polling().await);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 2);

        manager.logout().await;
        assert!(!manager.is_polling().await);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_desktop_profile_does_not_poll() {
        let api = Arc::new(CountingApi::default());
        let (manager, _visible) = polling_manager(PlatformClass::Desktop, api.clone());

        manager.connect(user("mia", UserRole::Manager)).await;
        assert!(!manager.is_polling().await);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 0);
        manager.logout().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_change_restarts_poller() {
        let api = Arc::new(CountingApi::default());
        let (manager, _visible) = polling_manager(PlatformClass::IosSafari, api.clone());

        manager.connect(user("sam", UserRole::Salesperson)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        manager.connect(user("tom", UserRole::Technician)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        // One immediate poll per identity, none left over from the first.
        assert_eq!(api.polls.load(Ordering::SeqCst), 2);
        assert!(manager.is_polling().await);
        manager.logout().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_change_rebuilds_session() {
        let (connector, _peers) = MemoryConnector::new();
        let manager = SessionManager::new(
            Arc::new(connector),
            TransportProfile::for_class(PlatformClass::Desktop),
            &ClientConfig::default(),
        );
        manager.cache().put("leads", serde_json::json!([]));

        let alice = user("alice", UserRole::Admin);
        let first = manager.connect(alice.clone()).await;
        let again = manager.connect(alice).await;
        assert!(Arc::ptr_eq(&first, &again));

        let bob = user("bob", UserRole::Salesperson);
        let second = manager.connect(bob.clone()).await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.status(), ConnectionStatus::Disconnected);
        assert_eq!(second.identity(), &bob);
        assert!(manager.cache().get("leads").is_none());

        manager.logout().await;
        assert!(manager.current().await.is_none());
        assert_eq!(second.status(), ConnectionStatus::Disconnected);
    }
}
