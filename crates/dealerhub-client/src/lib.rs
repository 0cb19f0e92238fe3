//! # dealerhub-client
//!
//! Client side of the realtime channel:
//!
//! - [`SessionManager`] keeps one authenticated [`ConnectionSession`] per
//!   identity alive across transport loss, with per-platform policy from
//!   [`TransportProfile`]
//! - [`EventBus`] dispatches server events to local handlers behind an
//!   error boundary, after invalidating the [`ReadModelCache`]
//! - [`NotificationPoller`] fetches pending notifications while the page is
//!   visible, for platforms without background push

pub mod bus;
pub mod cache;
pub mod error;
pub mod platform;
pub mod poller;
pub mod profile;
pub mod session;
pub mod transport;

pub use bus::{ClientEvent, EventBus, Subscription};
pub use cache::ReadModelCache;
pub use error::{ClientError, ConnectionError};
pub use platform::PlatformClass;
pub use poller::{HttpPollingApi, LocalNotifier, NotificationPoller, PollingApi};
pub use profile::{TransportKind, TransportProfile};
pub use session::{ConnectionSession, ConnectionStatus, SessionManager, SessionSnapshot};
pub use transport::{Connector, Transport};
