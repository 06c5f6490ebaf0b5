//! Realtime channel: the one websocket of a session plus its sequence and correlation state.

use crate::rtm::error::RtmError;
use crate::rtm::protocol::{InboundFrame, OutboundFrame};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, ORIGIN};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Text-frame transport under a [`RealtimeChannel`].
#[async_trait]
pub trait FrameTransport: Send {
    /// Next text payload. `Ok(None)` once the peer has closed the socket.
    async fn next_text(&mut self) -> Result<Option<String>, RtmError>;
    /// Write one text payload and wait for the write to complete.
    async fn send_text(&mut self, text: String) -> Result<(), RtmError>;
    /// Start a clean close of the connection.
    async fn close(&mut self) -> Result<(), RtmError>;
}

/// Websocket transport (tokio-tungstenite).
pub struct WsTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    /// Connect to `url`, sending `origin` as the Origin header.
    pub async fn connect(url: &str, origin: &str) -> Result<Self, RtmError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| RtmError::Connection(e.to_string()))?;
        if !origin.is_empty() {
            let value =
                HeaderValue::from_str(origin).map_err(|e| RtmError::Connection(e.to_string()))?;
            request.headers_mut().insert(ORIGIN, value);
        }
        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| RtmError::Connection(e.to_string()))?;
        Ok(Self { ws })
    }
}

#[async_trait]
impl FrameTransport for WsTransport {
    async fn next_text(&mut self) -> Result<Option<String>, RtmError> {
        while let Some(msg) = self.ws.next().await {
            match msg.map_err(|e| RtmError::Transport(e.to_string()))? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(_) => {
                    return Err(RtmError::Decode("unexpected binary frame".to_string()))
                }
                Message::Close(_) => return Ok(None),
                // ping/pong are answered by tungstenite itself
                _ => continue,
            }
        }
        Ok(None)
    }

    async fn send_text(&mut self, text: String) -> Result<(), RtmError> {
        self.ws
            .send(Message::Text(text))
            .await
            .map_err(|e| RtmError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RtmError> {
        self.ws
            .close(None)
            .await
            .map_err(|e| RtmError::Transport(e.to_string()))
    }
}

/// One live RTM socket. Methods take `&mut self`: a channel has exactly one controller,
/// which alternates between receiving and sending.
pub struct RealtimeChannel {
    transport: Box<dyn FrameTransport>,
    sequence: u64,
    last_channel: Option<String>,
}

impl RealtimeChannel {
    /// Open the websocket against a negotiated URL. No retry.
    pub async fn open(url: &str, origin: &str) -> Result<Self, RtmError> {
        let transport = WsTransport::connect(url, origin).await?;
        Ok(Self::new(Box::new(transport)))
    }

    pub fn new(transport: Box<dyn FrameTransport>) -> Self {
        Self {
            transport,
            sequence: 0,
            last_channel: None,
        }
    }

    /// Wait for exactly one frame and decode it.
    pub async fn receive_raw(&mut self) -> Result<InboundFrame, RtmError> {
        let text = self
            .transport
            .next_text()
            .await?
            .ok_or_else(|| RtmError::Transport("socket closed by peer".to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| RtmError::Decode(e.to_string()))?;
        if !value.is_object() {
            return Err(RtmError::Decode("frame is not a JSON object".to_string()));
        }
        serde_json::from_value(value).map_err(|e| RtmError::Decode(e.to_string()))
    }

    /// Serialize and write one frame.
    pub async fn send_raw(&mut self, frame: &OutboundFrame) -> Result<(), RtmError> {
        let text = serde_json::to_string(frame).map_err(|e| RtmError::Transport(e.to_string()))?;
        self.transport.send_text(text).await
    }

    /// Take the next sequence id. The first id of a session is 1.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Last sequence id handed out (0 before the first send).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Channel of the last accepted inbound frame.
    pub fn last_channel(&self) -> Option<&str> {
        self.last_channel.as_deref()
    }

    pub(crate) fn set_last_channel(&mut self, channel: String) {
        self.last_channel = Some(channel);
    }

    pub async fn close(&mut self) -> Result<(), RtmError> {
        self.transport.close().await
    }
}
