//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use dealerhub_core::error::AppError;
use dealerhub_core::types::{DeviceId, UserId};
use dealerhub_entity::device::{DeviceCapabilities, DevicePlatform, NewDeviceRegistration};
use dealerhub_entity::push::{NewPushSubscription, SubscriptionKeys};

/// Run `validator` rules and map failures to a validation error.
pub fn validate(request: &impl Validate) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// Device registration body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    /// Client-generated token, stable per install.
    #[validate(length(min = 1, max = 512, message = "Device token is required"))]
    pub device_token: String,
    /// Device platform.
    pub platform: DevicePlatform,
    /// Capability flags.
    #[serde(default)]
    pub capabilities: DeviceCapabilities,
    /// Client version.
    #[validate(length(max = 64))]
    pub app_version: Option<String>,
}

impl RegisterDeviceRequest {
    pub fn into_registration(
        self,
        user_id: UserId,
        user_agent: Option<String>,
    ) -> NewDeviceRegistration {
        NewDeviceRegistration {
            user_id,
            device_token: self.device_token,
            platform: self.platform,
            capabilities: self.capabilities,
            user_agent,
            app_version: self.app_version,
        }
    }
}

/// Push subscription body, in the shape `PushSubscription.toJSON()` yields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterSubscriptionRequest {
    /// Push service endpoint.
    #[validate(url(message = "Endpoint must be a URL"))]
    pub endpoint: String,
    /// Key material.
    pub keys: SubscriptionKeys,
    /// Registering device, if already registered.
    #[serde(default)]
    pub device_id: Option<DeviceId>,
}

impl RegisterSubscriptionRequest {
    pub fn into_subscription(self, user_id: UserId) -> NewPushSubscription {
        NewPushSubscription {
            user_id,
            device_id: self.device_id,
            endpoint: self.endpoint,
            keys: self.keys,
        }
    }
}

/// Subscription removal body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UnsubscribeRequest {
    /// Push service endpoint to deactivate.
    #[validate(length(min = 1, message = "Endpoint is required"))]
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_request_validation() {
        let ok: RegisterSubscriptionRequest = serde_json::from_value(serde_json::json!({
            "endpoint": "https://fcm.googleapis.com/fcm/send/abc",
            "keys": {"p256dh": "BPk", "auth": "c2VjcmV0"}
        }))
        .unwrap();
        assert!(validate(&ok).is_ok());

        let bad = RegisterSubscriptionRequest {
            endpoint: "nope".into(),
            ..ok
        };
        assert!(validate(&bad).is_err());
    }

    #[test]
    fn test_device_request_requires_token() {
        let req: RegisterDeviceRequest = serde_json::from_value(serde_json::json!({
            "device_token": "",
            "platform": "web"
        }))
        .unwrap();
        assert!(validate(&req).is_err());
        assert_eq!(req.capabilities, DeviceCapabilities::default());
    }
}
