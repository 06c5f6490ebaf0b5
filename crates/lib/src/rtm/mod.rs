//! Slack real-time messaging (RTM) session.
//!
//! A session is negotiated once over HTTP (token -> socket URL + bot id), then a
//! single websocket carries JSON frames both ways. Only direct mentions of the bot
//! are surfaced to the caller; replies go back to the channel of the last accepted
//! mention, each tagged with a client-assigned sequence id.

mod channel;
mod client;
mod error;
mod filter;
mod negotiate;
mod protocol;
#[cfg(test)]
mod scripted;

pub use channel::{FrameTransport, RealtimeChannel, WsTransport};
pub use client::Client;
pub use error::RtmError;
pub use filter::{receive_direct, DirectMention};
pub use negotiate::{negotiate, Negotiated};
pub use protocol::{InboundFrame, OutboundFrame, MESSAGE_TYPE};
