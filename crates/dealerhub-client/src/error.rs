//! Client error types.

use thiserror::Error;

use crate::profile::TransportKind;

/// Why a realtime connection could not be established or was lost.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The transport could not connect.
    #[error("connect failed: {0}")]
    Connect(String),
    /// A stage did not finish within the profile's timeout.
    #[error("{stage} timed out")]
    Timeout { stage: &'static str },
    /// The server refused the claimed identity.
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),
    /// The transport closed.
    #[error("connection closed: {0}")]
    Closed(String),
    /// The profile asks for a transport this connector cannot provide.
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(TransportKind),
    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// HTTP errors of the polling API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request did not complete.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with an error status.
    #[error("server returned HTTP {0}")]
    Status(u16),
    /// The URL could not be built.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
