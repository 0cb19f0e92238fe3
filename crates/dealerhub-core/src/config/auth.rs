//! Access-token validation configuration.

use serde::{Deserialize, Serialize};

/// Settings for validating access tokens issued by the login service.
///
/// Token issuance lives outside this application; the API only verifies
/// the signature and reads the identity claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HS256 access tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Accepted clock skew in seconds when checking `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_leeway() -> u64 {
    30
}
