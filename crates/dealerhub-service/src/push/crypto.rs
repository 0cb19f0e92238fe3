//! Message encryption for Web Push (RFC 8291, `aes128gcm` content coding).
//!
//! Each message uses a fresh application-server ECDH key pair and salt.
//! The body is a single RFC 8188 record:
//!
//! ```text
//! salt (16) | rs (4, BE) | idlen (1) = 65 | keyid = server public key (65) | ciphertext
//! ```

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use sha2::Sha256;

use super::error::PushFailure;

type HmacSha256 = Hmac<Sha256>;

/// Record size advertised in the header.
pub const RECORD_SIZE: u32 = 4096;

/// Largest encrypted body push services are required to accept.
pub const MAX_BODY_LEN: usize = 4096;

const SALT_LEN: usize = 16;
const KEY_ID_LEN: usize = 65;
const HEADER_LEN: usize = SALT_LEN + 4 + 1 + KEY_ID_LEN;
/// Padding delimiter plus AEAD tag.
const RECORD_OVERHEAD: usize = 1 + 16;

/// Largest plaintext that still fits in one message.
pub const MAX_PLAINTEXT_LEN: usize = MAX_BODY_LEN - HEADER_LEN - RECORD_OVERHEAD;

/// Encrypt `plaintext` for a subscription's `p256dh` and `auth` keys.
pub fn encrypt(plaintext: &[u8], p256dh: &str, auth: &str) -> Result<Vec<u8>, PushFailure> {
    if plaintext.len() > MAX_PLAINTEXT_LEN {
        return Err(PushFailure::PayloadTooLarge);
    }

    let ua_public = PublicKey::from_sec1_bytes(&decode_key(p256dh)?)
        .map_err(|e| PushFailure::Encryption(format!("invalid p256dh key: {e}")))?;
    let auth_secret = decode_key(auth)?;
    if auth_secret.len() != 16 {
        return Err(PushFailure::Encryption(format!(
            "auth secret must be 16 bytes, got {}",
            auth_secret.len()
        )));
    }

    let server_secret = SecretKey::random(&mut OsRng);
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    encrypt_with(plaintext, &ua_public, &auth_secret, &server_secret, salt)
}

/// Encryption with caller-chosen server key and salt.
pub(crate) fn encrypt_with(
    plaintext: &[u8],
    ua_public: &PublicKey,
    auth_secret: &[u8],
    server_secret: &SecretKey,
    salt: [u8; SALT_LEN],
) -> Result<Vec<u8>, PushFailure> {
    let ua_point = ua_public.to_encoded_point(false);
    let server_point = server_secret.public_key().to_encoded_point(false);

    let shared = p256::ecdh::diffie_hellman(server_secret.to_nonzero_scalar(), ua_public.as_affine());
    let (cek, nonce) = derive_keys(
        shared.raw_secret_bytes().as_slice(),
        auth_secret,
        ua_point.as_bytes(),
        server_point.as_bytes(),
        &salt,
    )?;

    let cipher = <Aes128Gcm as KeyInit>::new_from_slice(&cek)
        .map_err(|e| PushFailure::Encryption(format!("invalid content key: {e}")))?;

    let mut record = Vec::with_capacity(plaintext.len() + 1);
    record.extend_from_slice(plaintext);
    record.push(0x02);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), record.as_slice())
        .map_err(|_| PushFailure::Encryption("AES-GCM encryption failed".to_string()))?;

    let mut body = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(KEY_ID_LEN as u8);
    body.extend_from_slice(server_point.as_bytes());
    body.extend_from_slice(&ciphertext);

    if body.len() > MAX_BODY_LEN {
        return Err(PushFailure::PayloadTooLarge);
    }
    Ok(body)
}

/// Derive the 16-byte content encryption key and 12-byte nonce.
pub(crate) fn derive_keys(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    ua_public: &[u8],
    server_public: &[u8],
    salt: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), PushFailure> {
    let prk_key = hmac_sha256(auth_secret, &[ecdh_secret])?;
    let ikm = hmac_sha256(
        &prk_key,
        &[b"WebPush: info\0", ua_public, server_public, &[0x01]],
    )?;
    let prk = hmac_sha256(salt, &[&ikm])?;
    let cek = hmac_sha256(&prk, &[b"Content-Encoding: aes128gcm\0", &[0x01]])?;
    let nonce = hmac_sha256(&prk, &[b"Content-Encoding: nonce\0", &[0x01]])?;
    Ok((cek[..16].to_vec(), nonce[..12].to_vec()))
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, PushFailure> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| PushFailure::Encryption(format!("invalid HMAC key: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Decode browser-supplied key material.
///
/// Browsers hand out unpadded base64url; padded and standard-alphabet input
/// is accepted too.
pub fn decode_key(input: &str) -> Result<Vec<u8>, PushFailure> {
    let normalized: String = input
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD
        .decode(normalized)
        .map_err(|e| PushFailure::Encryption(format!("invalid base64 key: {e}")))
}
