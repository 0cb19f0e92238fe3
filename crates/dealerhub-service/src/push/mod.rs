//! Web Push delivery (RFC 8030 / 8291 / 8292).

pub mod crypto;
pub mod error;
pub mod payload;
pub mod service;
pub mod transport;
pub mod vapid;

pub use error::PushFailure;
pub use payload::{PushData, PushPayload};
pub use service::{DeliverySummary, PushService};
pub use transport::{HttpPushTransport, PushRequest, PushResponse, PushTransport};
pub use vapid::VapidSigner;
