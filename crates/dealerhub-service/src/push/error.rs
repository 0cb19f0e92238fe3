//! Push delivery failure classification.

use thiserror::Error;

/// Why a single push delivery did not go through.
///
/// None of these are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushFailure {
    /// The push service no longer knows the subscription (404/410).
    #[error("subscription gone (HTTP {status})")]
    Gone { status: u16 },
    /// The encrypted message exceeds what push services accept.
    #[error("payload too large")]
    PayloadTooLarge,
    /// The push service throttled us (429).
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
    /// Any other transport-level failure.
    #[error("transport error (status {status:?}): {body}")]
    Transport { status: Option<u16>, body: String },
    /// Key material could not be used to encrypt or sign.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

impl PushFailure {
    /// Classify a non-success HTTP status from a push service.
    pub fn from_status(status: u16, retry_after: Option<u64>, body: String) -> Self {
        match status {
            404 | 410 => Self::Gone { status },
            413 => Self::PayloadTooLarge,
            429 => Self::RateLimited { retry_after },
            _ => Self::Transport {
                status: Some(status),
                body,
            },
        }
    }

    /// Whether the subscription should be deactivated.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(PushFailure::from_status(410, None, String::new()), PushFailure::Gone { status: 410 });
        assert_eq!(PushFailure::from_status(404, None, String::new()), PushFailure::Gone { status: 404 });
        assert_eq!(PushFailure::from_status(413, None, String::new()), PushFailure::PayloadTooLarge);
        assert_eq!(
            PushFailure::from_status(429, Some(30), String::new()),
            PushFailure::RateLimited { retry_after: Some(30) }
        );
        assert_eq!(
            PushFailure::from_status(500, None, "boom".into()),
            PushFailure::Transport { status: Some(500), body: "boom".into() }
        );
    }
}
