//! Direct-mention filter: only messages that start with `<@BOT_ID>: ` reach the caller.

use crate::rtm::channel::RealtimeChannel;
use crate::rtm::error::RtmError;
use crate::rtm::protocol::{InboundFrame, MESSAGE_TYPE};

/// Matches message frames addressed to one bot id.
#[derive(Debug, Clone)]
pub struct DirectMention {
    prefix: String,
}

impl DirectMention {
    pub fn new(self_id: &str) -> Self {
        Self {
            prefix: format!("<@{}>: ", self_id),
        }
    }

    /// The exact marker a frame's text must start with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Text after the mention marker, or `None` when the frame is not a direct mention.
    pub fn strip<'a>(&self, frame: &'a InboundFrame) -> Option<&'a str> {
        if frame.typ != MESSAGE_TYPE {
            return None;
        }
        frame.text.strip_prefix(self.prefix.as_str())
    }
}

/// Read frames until one is a direct mention, remember its channel, and return its text.
///
/// Frames that are not mentions and frames that fail to decode are skipped without delay
/// and without limit. Transport errors end the session and are returned immediately.
pub async fn receive_direct(
    channel: &mut RealtimeChannel,
    mention: &DirectMention,
) -> Result<String, RtmError> {
    loop {
        let frame = match channel.receive_raw().await {
            Ok(frame) => frame,
            Err(RtmError::Decode(e)) => {
                log::debug!("rtm: skipping undecodable frame: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };
        if let Some(text) = mention.strip(&frame) {
            let text = text.to_string();
            log::debug!("rtm: direct mention in {} from {}", frame.channel, frame.user);
            channel.set_last_channel(frame.channel);
            return Ok(text);
        }
        log::trace!("rtm: ignoring {:?} frame", frame.typ);
    }
}
