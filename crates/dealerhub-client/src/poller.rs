//! Pending-notification polling for platforms without background push.
//!
//! Runs alongside the realtime session and push. Nothing coordinates the
//! channels, so a notification may be shown more than once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use url::Url;

use dealerhub_core::types::NotificationId;
use dealerhub_entity::notification::NotificationRecord;

use crate::error::ClientError;

/// Server side of the polling path.
#[async_trait]
pub trait PollingApi: Send + Sync {
    /// The caller's pending notifications.
    async fn pending(&self) -> Result<Vec<NotificationRecord>, ClientError>;

    /// Confirm a notification was shown.
    async fn mark_delivered(&self, id: NotificationId) -> Result<(), ClientError>;
}

/// Renders a notification on the device.
pub trait LocalNotifier: Send + Sync {
    /// Show the notification. Returns `false` if it could not be shown.
    fn show(&self, notification: &NotificationRecord) -> bool;
}

/// Polls while the page is visible.
pub struct NotificationPoller {
    api: Arc<dyn PollingApi>,
    notifier: Arc<dyn LocalNotifier>,
    interval: Duration,
    visibility: watch::Receiver<bool>,
}

impl NotificationPoller {
    /// `visibility` carries the page's visibility; the poller stops when
    /// its sender is dropped.
    pub fn new(
        api: Arc<dyn PollingApi>,
        notifier: Arc<dyn LocalNotifier>,
        interval: Duration,
        visibility: watch::Receiver<bool>,
    ) -> Self {
        Self {
            api,
            notifier,
            interval,
            visibility,
        }
    }

    /// Fetch pending notifications, show each and mark it delivered.
    ///
    /// Returns how many were marked delivered. A failed mark is logged and
    /// the notification is shown again on the next poll.
    pub async fn poll_once(&self) -> Result<usize, ClientError> {
        let pending = self.api.pending().await?;
        let mut delivered = 0;

        for notification in &pending {
            if !self.notifier.show(notification) {
                debug!(notification_id = %notification.id, "Local notification not shown");
                continue;
            }
            match self.api.mark_delivered(notification.id).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(notification_id = %notification.id, error = %e, "Failed to mark delivered");
                }
            }
        }

        if !pending.is_empty() {
            debug!(pending = pending.len(), delivered, "Polled pending notifications");
        }
        Ok(delivered)
    }

    /// Poll every interval while visible, immediately on becoming visible.
    pub async fn run(mut self) {
        loop {
            if self.visibility.wait_for(|visible| *visible).await.is_err() {
                break;
            }

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let tick = tokio::select! {
                    _ = ticker.tick() => true,
                    changed = self.visibility.changed() => {
                        if changed.is_err() {
                            info!("Visibility source gone, stopping poller");
                            return;
                        }
                        false
                    }
                };

                if tick {
                    if let Err(e) = self.poll_once().await {
                        warn!(error = %e, "Polling pending notifications failed");
                    }
                } else if !*self.visibility.borrow() {
                    debug!("Page hidden, pausing poller");
                    break;
                }
            }
        }
        info!("Notification poller stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

/// [`PollingApi`] over the server's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPollingApi {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl HttpPollingApi {
    pub fn new(server_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        let mut base = Url::parse(server_url)?;
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: token.into(),
        })
    }

    /// `path` is relative so a prefix on the server URL is kept.
    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }
}

#[async_trait]
impl PollingApi for HttpPollingApi {
    async fn pending(&self) -> Result<Vec<NotificationRecord>, ClientError> {
        let response = self
            .http
            .get(self.url("api/notifications/pending")?)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        let body: Envelope<Vec<NotificationRecord>> = response.json().await?;
        if !body.success {
            return Err(ClientError::Status(200));
        }
        Ok(body.data)
    }

    async fn mark_delivered(&self, id: NotificationId) -> Result<(), ClientError> {
        let response = self
            .http
            .put(self.url(&format!("api/notifications/{id}/delivered"))?)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
