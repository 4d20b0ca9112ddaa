//! WebSocket implementation of the live channel.
//!
//! One socket per room, credential embedded in the URI (the handshake cannot
//! carry custom headers). Frames are JSON text; anything that fails to parse
//! is dropped without disturbing the connection.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parlor_api::{ApiClient, ClientFrame, StreamFrame};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::channel::{ChannelError, ChannelEvent, ChannelFactory, CloseReason, RoomChannel};

/// Opens WebSocket channels via the API client's stream URL.
pub struct WebSocketFactory {
    api: ApiClient,
}

impl WebSocketFactory {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ChannelFactory for WebSocketFactory {
    async fn connect(&self, room_id: &str) -> Result<Box<dyn RoomChannel>, ChannelError> {
        let url = self.api.stream_url(room_id).map_err(|e| match e {
            parlor_api::Error::MissingCredential => ChannelError::MissingCredential,
            other => ChannelError::Connect(other.to_string()),
        })?;
        tracing::debug!("opening channel for room {room_id}");
        let (socket, _response) = connect_async(&url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        Ok(Box::new(WebSocketChannel { socket }))
    }
}

struct WebSocketChannel {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl RoomChannel for WebSocketChannel {
    async fn recv(&mut self) -> ChannelEvent {
        loop {
            match self.socket.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<StreamFrame>(text.as_str()) {
                        Ok(frame) => return ChannelEvent::Frame(frame),
                        Err(err) => {
                            tracing::debug!("dropping malformed frame: {err}");
                        }
                    }
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    return ChannelEvent::Closed(CloseReason::new(
                        frame.map(|f| u16::from(f.code)),
                    ));
                }
                // Protocol ping/pong is answered by tungstenite; binary frames
                // are not part of the contract.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!("channel read error: {err}");
                    return ChannelEvent::Closed(CloseReason::new(None));
                }
                None => return ChannelEvent::Closed(CloseReason::new(None)),
            }
        }
    }

    async fn ping(&mut self) -> Result<(), ChannelError> {
        let frame =
            serde_json::to_string(&ClientFrame::Ping).map_err(|e| ChannelError::Send(e.to_string()))?;
        self.socket
            .send(WsMessage::text(frame))
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }
}
