//! WebSocket transport over `tokio-tungstenite`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use url::Url;

use dealerhub_core::config::client::ClientConfig;
use dealerhub_realtime::message::{InboundMessage, OutboundMessage};

use super::{Connector, Transport};
use crate::error::ConnectionError;
use crate::profile::{TransportKind, TransportProfile};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the server's realtime endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    ws_url: String,
    probe_url: String,
    http: reqwest::Client,
}

impl WebSocketConnector {
    /// Build a connector from client settings.
    ///
    /// The bearer token, when given, is passed as the `token` query
    /// parameter so the server can pin the identity.
    pub fn from_config(config: &ClientConfig, token: Option<&str>) -> Result<Self, ConnectionError> {
        let base = Url::parse(&config.server_url)
            .map_err(|e| ConnectionError::Connect(format!("invalid server url: {e}")))?;

        let mut ws = under(&base, &config.ws_path)
            .map_err(|e| ConnectionError::Connect(format!("invalid ws path: {e}")))?;
        let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
        ws.set_scheme(scheme)
            .map_err(|_| ConnectionError::Connect("cannot derive websocket url".to_string()))?;
        if let Some(token) = token {
            ws.query_pairs_mut().append_pair("token", token);
        }

        let probe = under(&base, "api/health")
            .map_err(|e| ConnectionError::Connect(format!("invalid probe url: {e}")))?;

        Ok(Self {
            ws_url: ws.to_string(),
            probe_url: probe.to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// The WebSocket URL this connector dials.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    async fn probe(&self, timeout: Duration) -> Result<(), ConnectionError> {
        let response = self
            .http
            .get(&self.probe_url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ConnectionError::Connect(format!("probe failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ConnectionError::Connect(format!(
                "probe returned HTTP {}",
                response.status().as_u16()
            )));
        }
        debug!(url = %self.probe_url, "Long-polling probe succeeded");
        Ok(())
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(
        &self,
        profile: &TransportProfile,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        if profile.initial_transport == TransportKind::LongPolling {
            if !profile.upgrade {
                return Err(ConnectionError::UnsupportedTransport(TransportKind::LongPolling));
            }
            self.probe(profile.connect_timeout).await?;
        }

        let (stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;
        debug!(url = %self.ws_url, "WebSocket connected");
        Ok(Box::new(WebSocketTransport { stream }))
    }
}

struct WebSocketTransport {
    stream: WsStream,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: &InboundMessage) -> Result<(), ConnectionError> {
        let text = serde_json::to_string(message)
            .map_err(|e| ConnectionError::Protocol(e.to_string()))?;
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ConnectionError::Closed(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<OutboundMessage, ConnectionError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    return Some(
                        serde_json::from_str(text.as_str())
                            .map_err(|e| ConnectionError::Protocol(e.to_string())),
                    );
                }
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return Some(Err(ConnectionError::Closed(reason)));
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(ConnectionError::Closed(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            warn!(error = %e, "WebSocket close failed");
        }
    }
}

/// Resolve `path` below `base`, keeping any path prefix `base` carries.
fn under(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_from_config() {
        let config = ClientConfig {
            server_url: "https://dealer.example.com".into(),
            ..Default::default()
        };
        let connector = WebSocketConnector::from_config(&config, Some("abc.def")).unwrap();
        assert_eq!(connector.ws_url(), "wss://dealer.example.com/ws?token=abc.def");

        let local = WebSocketConnector::from_config(&ClientConfig::default(), None).unwrap();
        assert_eq!(local.ws_url(), "ws://localhost:8080/ws");
        assert_eq!(local.probe_url, "http://localhost:8080/api/health");
    }

    #[test]
    fn test_urls_keep_server_path_prefix() {
        for server_url in ["https://dealer.example.com/dms", "https://dealer.example.com/dms/"] {
            let config = ClientConfig {
                server_url: server_url.into(),
                ..Default::default()
            };
            let connector = WebSocketConnector::from_config(&config, None).unwrap();
            assert_eq!(connector.ws_url(), "wss://dealer.example.com/dms/ws");
            assert_eq!(connector.probe_url, "https://dealer.example.com/dms/api/health");
        }
    }
}
