//! Per-platform transport policy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::platform::PlatformClass;

/// Transport used for the first connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    WebSocket,
    /// An HTTP reachability probe before the socket is opened.
    LongPolling,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSocket => f.write_str("websocket"),
            Self::LongPolling => f.write_str("long_polling"),
        }
    }
}

/// Connection policy for one platform class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportProfile {
    pub class: PlatformClass,
    pub initial_transport: TransportKind,
    /// Whether the initial transport may be upgraded to a WebSocket.
    pub upgrade: bool,
    pub connect_timeout: Duration,
    pub auth_timeout: Duration,
    /// Reconnect attempts before the session gives up with an error.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Whether the polling fallback should run alongside the session.
    pub poll_fallback: bool,
}

impl TransportProfile {
    /// The policy for a platform class.
    pub fn for_class(class: PlatformClass) -> Self {
        match class {
            PlatformClass::Desktop => Self {
                class,
                initial_transport: TransportKind::WebSocket,
                upgrade: true,
                connect_timeout: Duration::from_secs(10),
                auth_timeout: Duration::from_secs(5),
                max_attempts: 10,
                backoff_base: Duration::from_secs(1),
                backoff_max: Duration::from_secs(5),
                poll_fallback: false,
            },
            PlatformClass::Mobile => Self {
                class,
                initial_transport: TransportKind::LongPolling,
                upgrade: true,
                connect_timeout: Duration::from_secs(20),
                auth_timeout: Duration::from_secs(10),
                max_attempts: 15,
                backoff_base: Duration::from_secs(2),
                backoff_max: Duration::from_secs(10),
                poll_fallback: false,
            },
            PlatformClass::IosSafari => Self {
                class,
                initial_transport: TransportKind::WebSocket,
                upgrade: false,
                connect_timeout: Duration::from_secs(30),
                auth_timeout: Duration::from_secs(15),
                max_attempts: 20,
                backoff_base: Duration::from_secs(3),
                backoff_max: Duration::from_secs(15),
                poll_fallback: true,
            },
        }
    }

    /// The policy for a user agent.
    pub fn detect(user_agent: &str) -> Self {
        Self::for_class(PlatformClass::detect(user_agent))
    }

    /// Delay before reconnect attempt `attempt` (1-based): doubles from
    /// the base, capped at the maximum.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.backoff_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_table() {
        let desktop = TransportProfile::for_class(PlatformClass::Desktop);
        assert_eq!(desktop.initial_transport, TransportKind::WebSocket);
        assert!(desktop.upgrade);
        assert_eq!(desktop.connect_timeout, Duration::from_secs(10));
        assert_eq!(desktop.auth_timeout, Duration::from_secs(5));
        assert_eq!(desktop.max_attempts, 10);
        assert!(!desktop.poll_fallback);

        let mobile = TransportProfile::for_class(PlatformClass::Mobile);
        assert_eq!(mobile.initial_transport, TransportKind::LongPolling);
        assert_eq!(mobile.max_attempts, 15);
        assert_eq!(mobile.backoff_max, Duration::from_secs(10));

        let ios = TransportProfile::for_class(PlatformClass::IosSafari);
        assert!(!ios.upgrade);
        assert_eq!(ios.connect_timeout, Duration::from_secs(30));
        assert_eq!(ios.auth_timeout, Duration::from_secs(15));
        assert_eq!(ios.max_attempts, 20);
        assert!(ios.poll_fallback);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let desktop = TransportProfile::for_class(PlatformClass::Desktop);
        let delays: Vec<_> = (1..=5).map(|n| desktop.backoff(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);

        let ios = TransportProfile::for_class(PlatformClass::IosSafari);
        assert_eq!(ios.backoff(1), Duration::from_secs(3));
        assert_eq!(ios.backoff(3), Duration::from_secs(12));
        assert_eq!(ios.backoff(40), Duration::from_secs(15));
    }
}
