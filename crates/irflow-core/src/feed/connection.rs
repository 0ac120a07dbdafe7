//! Transport seam for the live feed.
//!
//! The supervisor only sees [`FeedConnector`] and [`FeedConnection`], so the
//! reconnect and keep-alive logic can be driven by scripted connections in
//! tests. [`WsConnector`] is the production WebSocket transport.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::debug;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::AUTHORIZATION, HeaderValue},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};

use super::FeedConfig;
use crate::error::{FlowError, Result};

/// Opens connections to the push endpoint.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self, config: &FeedConfig) -> Result<Box<dyn FeedConnection>>;
}

/// One open push connection.
#[async_trait]
pub trait FeedConnection: Send {
    /// Next text frame. `Ok(None)` means the server closed the connection.
    async fn recv(&mut self) -> Result<Option<String>>;

    async fn send(&mut self, text: String) -> Result<()>;
}

fn feed_error(message: impl Into<String>) -> FlowError {
    FlowError::Feed {
        message: message.into(),
    }
}

/// WebSocket transport built on `tokio-tungstenite`.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl FeedConnector for WsConnector {
    async fn connect(&self, config: &FeedConfig) -> Result<Box<dyn FeedConnection>> {
        let mut request = config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| feed_error(format!("Invalid feed URL '{}': {e}", config.url)))?;

        if let Some(ref token) = config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| feed_error(format!("Invalid feed token: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| feed_error(format!("Failed to connect to {}: {e}", config.url)))?;
        debug!("Feed handshake completed with status {}", response.status());

        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedConnection for WsConnection {
    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(frame))) => {
                    debug!("Feed closed by server: {frame:?}");
                    return Ok(None);
                }
                // Pings are answered by tungstenite; binary frames are not part of the protocol
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(feed_error(format!("Feed read failed: {e}"))),
                None => return Ok(None),
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| feed_error(format!("Feed write failed: {e}")))
    }
}
