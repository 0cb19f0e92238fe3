//! VAPID application-server identification (RFC 8292).

use std::fmt;

use aes_gcm::aead::OsRng;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePrivateKey;
use serde::Serialize;
use url::Url;

use dealerhub_core::config::push::PushConfig;
use dealerhub_core::error::AppError;

use super::crypto::decode_key;
use super::error::PushFailure;

/// Lifetime of a signed VAPID token; push services reject more than 24h.
const TOKEN_LIFETIME_HOURS: i64 = 12;

/// Claims of a VAPID token.
#[derive(Debug, Serialize)]
struct VapidClaims<'a> {
    aud: String,
    exp: i64,
    sub: &'a str,
}

/// Signs ES256 VAPID tokens with the application server key.
pub struct VapidSigner {
    secret: SecretKey,
    encoding_key: EncodingKey,
    public_key: String,
    subject: String,
}

impl fmt::Debug for VapidSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidSigner")
            .field("public_key", &self.public_key)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl VapidSigner {
    /// Load the key pair from configuration.
    ///
    /// When a public key is configured it must match the private key.
    pub fn from_config(config: &PushConfig) -> Result<Self, AppError> {
        let raw = decode_key(&config.vapid_private_key)
            .map_err(|e| AppError::configuration(format!("push.vapid_private_key: {e}")))?;
        let secret = SecretKey::from_slice(&raw).map_err(|e| {
            AppError::configuration(format!("push.vapid_private_key is not a P-256 scalar: {e}"))
        })?;
        let signer = Self::from_secret(secret, &config.subject)?;

        if !config.vapid_public_key.is_empty() && config.vapid_public_key.trim_end_matches('=') != signer.public_key {
            return Err(AppError::configuration(
                "push.vapid_public_key does not match push.vapid_private_key",
            ));
        }
        Ok(signer)
    }

    /// Generate a throwaway key pair; subscriptions made against it do not
    /// survive a restart.
    pub fn generate(subject: &str) -> Result<Self, AppError> {
        Self::from_secret(SecretKey::random(&mut OsRng), subject)
    }

    fn from_secret(secret: SecretKey, subject: &str) -> Result<Self, AppError> {
        let der = secret
            .to_pkcs8_der()
            .map_err(|e| AppError::configuration(format!("VAPID key export failed: {e}")))?;
        let public_key =
            URL_SAFE_NO_PAD.encode(secret.public_key().to_encoded_point(false).as_bytes());
        Ok(Self {
            encoding_key: EncodingKey::from_ec_der(der.as_bytes()),
            secret,
            public_key,
            subject: subject.to_string(),
        })
    }

    /// Application server key browsers pass to `pushManager.subscribe`.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Raw private scalar, base64url, for persisting a generated key.
    pub fn private_key(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.secret.to_bytes())
    }

    /// Signed JWT for the origin of `endpoint`.
    pub fn token(&self, endpoint: &str, now: DateTime<Utc>) -> Result<String, PushFailure> {
        let audience = Url::parse(endpoint)
            .map_err(|e| PushFailure::Transport {
                status: None,
                body: format!("invalid endpoint URL: {e}"),
            })?
            .origin()
            .ascii_serialization();

        let claims = VapidClaims {
            aud: audience,
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            sub: &self.subject,
        };

        encode(&Header::new(Algorithm::ES256), &claims, &self.encoding_key)
            .map_err(|e| PushFailure::Encryption(format!("VAPID signing failed: {e}")))
    }

    /// Value of the `Authorization` header for `endpoint`.
    pub fn authorization(&self, endpoint: &str, now: DateTime<Utc>) -> Result<String, PushFailure> {
        Ok(format!(
            "vapid t={}, k={}",
            self.token(endpoint, now)?,
            self.public_key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::{Signature, VerifyingKey};

    #[test]
    fn test_token_claims_and_signature() {
        let signer = VapidSigner::generate("mailto:ops@dealer.example").unwrap();
        let now = Utc::now();
        let token = signer
            .token("https://fcm.googleapis.com/fcm/send/abc123", now)
            .unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "ES256");
        assert_eq!(header["typ"], "JWT");

        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(claims["aud"], "https://fcm.googleapis.com");
        assert_eq!(claims["sub"], "mailto:ops@dealer.example");
        let exp = claims["exp"].as_i64().unwrap();
        assert!(exp > now.timestamp() && exp <= (now + Duration::hours(24)).timestamp());

        let public = URL_SAFE_NO_PAD.decode(signer.public_key()).unwrap();
        let verifying = VerifyingKey::from_sec1_bytes(&public).unwrap();
        let signature =
            Signature::from_slice(&URL_SAFE_NO_PAD.decode(parts[2]).unwrap()).unwrap();
        verifying
            .verify(format!("{}.{}", parts[0], parts[1]).as_bytes(), &signature)
            .unwrap();
    }

    #[test]
    fn test_authorization_header_format() {
        let signer = VapidSigner::generate("mailto:ops@dealer.example").unwrap();
        let header = signer
            .authorization("https://updates.push.services.mozilla.com/wpush/v2/x", Utc::now())
            .unwrap();
        assert!(header.starts_with("vapid t="));
        assert!(header.ends_with(&format!(", k={}", signer.public_key())));
    }

    #[test]
    fn test_from_config_round_trip_and_mismatch() {
        let generated = VapidSigner::generate("mailto:a@b.c").unwrap();
        let mut config = PushConfig {
            vapid_private_key: generated.private_key(),
            vapid_public_key: generated.public_key().to_string(),
            ..Default::default()
        };
        let loaded = VapidSigner::from_config(&config).unwrap();
        assert_eq!(loaded.public_key(), generated.public_key());

        config.vapid_public_key = VapidSigner::generate("mailto:a@b.c").unwrap().public_key().to_string();
        assert!(VapidSigner::from_config(&config).is_err());
    }

    #[test]
    fn test_invalid_endpoint() {
        let signer = VapidSigner::generate("mailto:a@b.c").unwrap();
        assert!(signer.token("not a url", Utc::now()).is_err());
    }
}
