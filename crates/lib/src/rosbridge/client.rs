//! Rosbridge WebSocket client: connect, subscribe, read published messages.

use crate::config::RosbridgeConfig;
use crate::rosbridge::protocol::{Incoming, PublishFrame, SubscribeOp, UnsubscribeOp};
use crate::topic::ChannelEndpoint;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, error::ProtocolError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, thiserror::Error)]
pub enum RosbridgeError {
    #[error("rosbridge connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("rosbridge send failed: {0}")]
    Send(#[source] tungstenite::Error),
    #[error("rosbridge receive failed: {0}")]
    Receive(#[source] tungstenite::Error),
    #[error("rosbridge frame encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Server-side subscription options sent with every subscribe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub throttle_rate: u32,
    pub queue_length: u32,
}

impl From<&RosbridgeConfig> for SubscribeOptions {
    fn from(config: &RosbridgeConfig) -> Self {
        Self {
            throttle_rate: config.throttle_rate,
            queue_length: config.queue_length,
        }
    }
}

/// One WebSocket connection to a rosbridge server.
pub struct RosbridgeClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl RosbridgeClient {
    pub async fn connect(url: &str) -> Result<Self, RosbridgeError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|source| RosbridgeError::Connect {
                url: url.to_string(),
                source,
            })?;
        log::info!("connected to rosbridge at {}", url);
        Ok(Self { ws, next_id: 0 })
    }

    /// Send a subscribe op for the endpoint. Returns the subscription id used on the wire.
    pub async fn subscribe(
        &mut self,
        endpoint: &ChannelEndpoint,
        options: SubscribeOptions,
    ) -> Result<String, RosbridgeError> {
        self.next_id += 1;
        let id = format!("subscribe:{}:{}", endpoint.name(), self.next_id);
        let op = SubscribeOp::new(
            id.clone(),
            endpoint.name(),
            endpoint.message_type(),
            options.throttle_rate,
            options.queue_length,
        );
        self.send_json(&op).await?;
        log::info!(
            "subscribed to {} ({}) as {}",
            endpoint.name(),
            endpoint.message_type(),
            id
        );
        Ok(id)
    }

    pub async fn unsubscribe(
        &mut self,
        id: &str,
        endpoint: &ChannelEndpoint,
    ) -> Result<(), RosbridgeError> {
        self.send_json(&UnsubscribeOp::new(id, endpoint.name())).await?;
        log::info!("unsubscribed {} from {}", id, endpoint.name());
        Ok(())
    }

    /// Wait for the next `publish` frame. Status frames are logged; other ops and
    /// unparseable frames are skipped. Returns None once the server closes the connection,
    /// with or without a close handshake.
    pub async fn next_publish(&mut self) -> Option<Result<PublishFrame, RosbridgeError>> {
        while let Some(frame) = self.ws.next().await {
            let frame = match frame {
                Ok(f) => f,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return None
                }
                Err(e) if is_disconnect(&e) => {
                    log::warn!("rosbridge connection dropped: {}", e);
                    return None;
                }
                Err(e) => return Some(Err(RosbridgeError::Receive(e))),
            };
            let text = match frame {
                Message::Text(text) => text,
                Message::Close(reason) => {
                    log::info!("rosbridge closed the connection: {:?}", reason);
                    return None;
                }
                _ => continue,
            };
            match serde_json::from_str::<Incoming>(&text) {
                Ok(Incoming::Publish { topic, msg }) => {
                    return Some(Ok(PublishFrame { topic, msg }));
                }
                Ok(Incoming::Status { level, msg, id }) => log_status(&level, &msg, id.as_deref()),
                Ok(Incoming::Other) => log::debug!("ignoring rosbridge frame: {}", text),
                Err(e) => log::warn!("ignoring unparseable rosbridge frame: {}", e),
            }
        }
        None
    }

    /// Send a close frame.
    pub async fn close(mut self) -> Result<(), RosbridgeError> {
        match self.ws.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(RosbridgeError::Send(e)),
        }
    }

    async fn send_json<T: serde::Serialize>(&mut self, value: &T) -> Result<(), RosbridgeError> {
        let text = serde_json::to_string(value)?;
        self.ws
            .send(Message::Text(text))
            .await
            .map_err(RosbridgeError::Send)
    }
}

/// Peer went away without a close frame (process died, TCP reset).
fn is_disconnect(e: &tungstenite::Error) -> bool {
    match e {
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        tungstenite::Error::Io(io) => matches!(
            io.kind(),
            std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
        ),
        _ => false,
    }
}

fn log_status(level: &str, msg: &str, id: Option<&str>) {
    let id = id.unwrap_or("-");
    match level {
        "error" => log::error!("rosbridge status [{}]: {}", id, msg),
        "warning" => log::warn!("rosbridge status [{}]: {}", id, msg),
        "info" => log::info!("rosbridge status [{}]: {}", id, msg),
        _ => log::debug!("rosbridge status {} [{}]: {}", level, id, msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn reset_and_eof_count_as_disconnect() {
        assert!(is_disconnect(&tungstenite::Error::Protocol(
            ProtocolError::ResetWithoutClosingHandshake
        )));
        for kind in [
            io::ErrorKind::UnexpectedEof,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::BrokenPipe,
        ] {
            assert!(is_disconnect(&tungstenite::Error::Io(io::Error::from(kind))));
        }
    }

    #[test]
    fn other_errors_are_not_disconnects() {
        assert!(!is_disconnect(&tungstenite::Error::Io(io::Error::from(
            io::ErrorKind::PermissionDenied
        ))));
        assert!(!is_disconnect(&tungstenite::Error::Protocol(
            ProtocolError::HandshakeIncomplete
        )));
    }
}
