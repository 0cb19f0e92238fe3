//! Device and push-subscription registration.

use std::fmt;
use std::sync::Arc;

use tracing::info;
use url::Url;

use dealerhub_core::error::AppError;
use dealerhub_core::result::AppResult;
use dealerhub_core::types::UserId;
use dealerhub_database::store::{DeviceStore, SubscriptionStore};
use dealerhub_entity::device::{DeviceRegistration, NewDeviceRegistration};
use dealerhub_entity::push::{NewPushSubscription, PushSubscription, SubscriptionKeys};

use crate::push::crypto::decode_key;

const P256DH_LEN: usize = 65;
const AUTH_LEN: usize = 16;

/// Registers devices and their push subscriptions.
pub struct DeviceService {
    devices: Arc<dyn DeviceStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    vapid_public_key: String,
}

impl fmt::Debug for DeviceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceService")
            .field("vapid_public_key", &self.vapid_public_key)
            .finish_non_exhaustive()
    }
}

impl DeviceService {
    /// Creates a new device service.
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        vapid_public_key: String,
    ) -> Self {
        Self {
            devices,
            subscriptions,
            vapid_public_key,
        }
    }

    /// Application server key browsers subscribe with.
    pub fn vapid_public_key(&self) -> &str {
        &self.vapid_public_key
    }

    /// Register or refresh a device. Idempotent by device token.
    pub async fn register_device(
        &self,
        device: NewDeviceRegistration,
    ) -> AppResult<DeviceRegistration> {
        if device.device_token.trim().is_empty() {
            return Err(AppError::validation("Device token must not be empty"));
        }
        let registered = self.devices.upsert(device).await?;
        info!(
            device_id = %registered.id,
            user_id = %registered.user_id,
            platform = %registered.platform,
            push = registered.supports_push,
            "Device registered"
        );
        Ok(registered)
    }

    /// Devices registered by a user.
    pub async fn devices(&self, user_id: UserId) -> AppResult<Vec<DeviceRegistration>> {
        self.devices.find_by_user(user_id).await
    }

    /// Register a push subscription. Idempotent by endpoint; re-registering
    /// an endpoint takes over its owner and key material.
    pub async fn register_subscription(
        &self,
        subscription: NewPushSubscription,
    ) -> AppResult<PushSubscription> {
        validate_endpoint(&subscription.endpoint)?;
        validate_keys(&subscription.keys)?;

        let stored = self.subscriptions.upsert(subscription).await?;
        info!(
            subscription_id = %stored.id,
            user_id = %stored.user_id,
            "Push subscription registered"
        );
        Ok(stored)
    }

    /// Deactivate the caller's subscription for `endpoint`.
    pub async fn unregister_subscription(&self, user_id: UserId, endpoint: &str) -> AppResult<()> {
        let found = self
            .subscriptions
            .deactivate_by_endpoint(user_id, endpoint)
            .await?;
        if !found {
            return Err(AppError::not_found("No push subscription for this endpoint"));
        }
        info!(user_id = %user_id, "Push subscription unregistered");
        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> AppResult<()> {
    let url = Url::parse(endpoint)
        .map_err(|e| AppError::validation(format!("Invalid push endpoint: {e}")))?;
    if url.scheme() != "https" {
        return Err(AppError::validation("Push endpoint must use https"));
    }
    if url.host_str().is_none() {
        return Err(AppError::validation("Push endpoint has no host"));
    }
    Ok(())
}

fn validate_keys(keys: &SubscriptionKeys) -> AppResult<()> {
    let p256dh = decode_key(&keys.p256dh)
        .map_err(|_| AppError::validation("p256dh key is not valid base64url"))?;
    if p256dh.len() != P256DH_LEN || p256dh[0] != 0x04 {
        return Err(AppError::validation(
            "p256dh key must be an uncompressed P-256 point",
        ));
    }
    let auth =
        decode_key(&keys.auth).map_err(|_| AppError::validation("auth key is not valid base64url"))?;
    if auth.len() != AUTH_LEN {
        return Err(AppError::validation("auth secret must be 16 bytes"));
    }
    Ok(())
}
