//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use dealerhub_core::config::AppConfig;
use dealerhub_database::DatabasePool;
use dealerhub_database::memory::{
    MemoryDeviceStore, MemoryDirectory, MemoryNotificationStore, MemorySubscriptionStore,
};
use dealerhub_database::repositories::{
    device::DeviceRepository, notification::NotificationRepository,
    permission::PermissionRepository, preference::PreferenceRepository,
    subscription::SubscriptionRepository, user::UserRepository,
};
use dealerhub_database::store::{
    DeviceStore, NotificationStore, PermissionStore, PreferenceStore, SubscriptionStore,
    UserDirectory,
};
use dealerhub_realtime::RealtimeEngine;
use dealerhub_service::notification::RealtimeChannel;
use dealerhub_service::push::{PushTransport, VapidSigner};
use dealerhub_service::{
    DeviceService, EventRegistry, EventTrigger, NotificationService, NotificationWriter,
    PushService, RecipientResolver,
};

use crate::auth::JwtDecoder;

/// The stores the pipeline reads and writes through.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub permissions: Arc<dyn PermissionStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub devices: Arc<dyn DeviceStore>,
}

impl Stores {
    /// PostgreSQL repositories over one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            permissions: Arc::new(PermissionRepository::new(pool.clone())),
            preferences: Arc::new(PreferenceRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            subscriptions: Arc::new(SubscriptionRepository::new(pool.clone())),
            devices: Arc::new(DeviceRepository::new(pool)),
        }
    }

    /// In-memory stores; users, permissions, and preferences come from
    /// `directory`.
    pub fn memory(directory: Arc<MemoryDirectory>) -> Self {
        Self {
            users: directory.clone(),
            permissions: directory.clone(),
            preferences: directory,
            notifications: Arc::new(MemoryNotificationStore::new()),
            subscriptions: Arc::new(MemorySubscriptionStore::new()),
            devices: Arc::new(MemoryDeviceStore::new()),
        }
    }
}

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Access-token validation
    pub jwt: Arc<JwtDecoder>,
    /// Device and push-subscription registry
    pub devices: Arc<DeviceService>,
    /// Pending notifications for polling clients
    pub notifications: Arc<NotificationService>,
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,
    /// Notification pipeline entry point
    pub trigger: Arc<EventTrigger>,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("realtime", &self.realtime)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire services over the given stores and push transport.
    pub fn new(
        config: AppConfig,
        stores: Stores,
        transport: Arc<dyn PushTransport>,
        vapid: VapidSigner,
    ) -> Self {
        let vapid = Arc::new(vapid);
        let realtime = Arc::new(RealtimeEngine::new(
            config.realtime.clone(),
            stores.users.clone(),
        ));

        let push = Arc::new(PushService::new(
            stores.subscriptions.clone(),
            transport,
            vapid.clone(),
            config.push.clone(),
        ));

        let resolver = RecipientResolver::new(
            stores.users.clone(),
            stores.permissions.clone(),
            stores.preferences.clone(),
        );
        let channel: Arc<dyn RealtimeChannel> = realtime.broadcaster.clone();
        let trigger = Arc::new(EventTrigger::new(
            Arc::new(EventRegistry::standard()),
            resolver,
            NotificationWriter::new(stores.notifications.clone()),
            push,
            channel,
        ));

        let devices = Arc::new(DeviceService::new(
            stores.devices.clone(),
            stores.subscriptions.clone(),
            vapid.public_key().to_string(),
        ));
        let notifications = Arc::new(NotificationService::new(
            stores.notifications.clone(),
            config.notifications.clone(),
        ));

        Self {
            jwt: Arc::new(JwtDecoder::new(&config.auth)),
            config: Arc::new(config),
            devices,
            notifications,
            realtime,
            trigger,
            started_at: Instant::now(),
        }
    }
}
