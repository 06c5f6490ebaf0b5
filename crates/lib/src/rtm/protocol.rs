//! RTM wire frames.
//!
//! Inbound: `{ "type", "channel", "user", "text", "ts" }`. Outbound: `{ "id", "type", "channel", "text" }`.

use serde::{Deserialize, Serialize};

/// Frame type tag of chat messages, in both directions.
pub const MESSAGE_TYPE: &str = "message";

/// Frame received on the socket. RTM sends many shapes (`hello`, `pong`, acks with `reply_to`),
/// so every field is optional on the wire and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
}

/// Frame written to the socket. `id` is the per-session sequence id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub id: u64,
    #[serde(rename = "type")]
    pub typ: String,
    pub channel: String,
    pub text: String,
}

impl OutboundFrame {
    pub fn message(id: u64, channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            typ: MESSAGE_TYPE.to_string(),
            channel: channel.into(),
            text: text.into(),
        }
    }
}
