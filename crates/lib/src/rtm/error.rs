//! Error kinds surfaced by the RTM session.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RtmError {
    /// Discovery call failed: transport, HTTP status, body decode, or `ok: false`.
    #[error("rtm negotiation failed: {0}")]
    Negotiation(String),
    /// The websocket could not be opened against the negotiated URL.
    #[error("rtm connection failed: {0}")]
    Connection(String),
    /// The open socket failed or closed; the session is over.
    #[error("rtm transport error: {0}")]
    Transport(String),
    /// A frame arrived that is not a JSON object.
    #[error("rtm frame decode failed: {0}")]
    Decode(String),
    #[error("rtm receive timed out after {0:?}")]
    Timeout(Duration),
}

impl RtmError {
    /// True when the session can no longer be used.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RtmError::Decode(_) | RtmError::Timeout(_))
    }
}
