//! Access-token validation.
//!
//! Tokens are issued by the login service; this side only checks the HS256
//! signature and expiry and reads the identity claims.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use dealerhub_core::config::auth::AuthConfig;
use dealerhub_core::error::AppError;
use dealerhub_core::types::UserId;
use dealerhub_entity::user::UserRole;

/// Identity claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user ID.
    pub sub: UserId,
    /// Username for convenience.
    pub username: String,
    /// User role at the time of token issuance.
    pub role: UserRole,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Validates access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use dealerhub_core::error::ErrorKind;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, exp_offset: Duration) -> (UserId, String) {
        let id = UserId::new();
        let claims = Claims {
            sub: id,
            username: "alice".into(),
            role: UserRole::Manager,
            exp: (Utc::now() + exp_offset).timestamp(),
            iat: Some(Utc::now().timestamp()),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (id, token)
    }

    fn decoder() -> JwtDecoder {
        JwtDecoder::new(&AuthConfig {
            jwt_secret: "test-secret".into(),
            leeway_seconds: 0,
        })
    }

    #[test]
    fn test_valid_token() {
        let (id, token) = token("test-secret", Duration::minutes(5));
        let claims = decoder().decode(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::Manager);
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired() {
        let (_, forged) = token("other-secret", Duration::minutes(5));
        let err = decoder().decode(&forged).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let (_, expired) = token("test-secret", Duration::minutes(-5));
        let err = decoder().decode(&expired).unwrap_err();
        assert_eq!(err.message, "Token has expired");

        assert!(decoder().decode("not-a-jwt").is_err());
    }
}
