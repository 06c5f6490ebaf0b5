//! RTM client: negotiate, connect, then receive direct mentions and reply to them.

use crate::config::SlackConfig;
use crate::rtm::channel::RealtimeChannel;
use crate::rtm::error::RtmError;
use crate::rtm::filter::{receive_direct, DirectMention};
use crate::rtm::negotiate::negotiate;
use crate::rtm::protocol::OutboundFrame;
use std::time::Duration;

/// A connected bot session. Receive and send alternate from a single control loop.
pub struct Client {
    self_id: String,
    channel: RealtimeChannel,
    mention: DirectMention,
    default_timeout: Option<Duration>,
}

impl Client {
    /// Negotiate a session and open its socket. Fails without a partial client; when
    /// negotiation fails no socket is opened.
    pub async fn connect(config: &SlackConfig) -> Result<Self, RtmError> {
        Self::connect_with(&reqwest::Client::new(), config).await
    }

    /// Same as [`Client::connect`] with a caller-provided HTTP client.
    pub async fn connect_with(
        http: &reqwest::Client,
        config: &SlackConfig,
    ) -> Result<Self, RtmError> {
        let session = negotiate(http, config).await?;
        let channel = RealtimeChannel::open(&session.url, &config.origin).await?;
        log::info!("rtm socket connected");
        let timeout = config.receive_timeout_secs.map(Duration::from_secs);
        Ok(Self::from_channel(session.self_id, channel).with_receive_timeout(timeout))
    }

    /// Wrap an already-open channel for the given bot id.
    pub fn from_channel(self_id: impl Into<String>, channel: RealtimeChannel) -> Self {
        let self_id = self_id.into();
        Self {
            mention: DirectMention::new(&self_id),
            self_id,
            channel,
            default_timeout: None,
        }
    }

    /// Bound every [`Client::receive`] by `timeout` (None waits forever).
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Channel the next [`Client::send`] goes to.
    pub fn last_channel(&self) -> Option<&str> {
        self.channel.last_channel()
    }

    /// Wait for the next direct mention and return its text without the mention marker.
    pub async fn receive(&mut self) -> Result<String, RtmError> {
        match self.default_timeout {
            Some(timeout) => self.receive_timeout(timeout).await,
            None => receive_direct(&mut self.channel, &self.mention).await,
        }
    }

    /// Like [`Client::receive`] but gives up after `timeout`. The session stays usable.
    pub async fn receive_timeout(&mut self, timeout: Duration) -> Result<String, RtmError> {
        tokio::time::timeout(timeout, receive_direct(&mut self.channel, &self.mention))
            .await
            .map_err(|_| RtmError::Timeout(timeout))?
    }

    /// Send `text` to the channel of the last received mention. Before any mention the
    /// channel is empty and the server decides what to do with the frame.
    pub async fn send(&mut self, text: &str) -> Result<(), RtmError> {
        let id = self.channel.next_sequence();
        let channel = self.channel.last_channel().unwrap_or_default().to_string();
        log::debug!("rtm: sending message {} to {}", id, channel);
        self.channel
            .send_raw(&OutboundFrame::message(id, channel, text))
            .await
    }

    pub async fn close(mut self) -> Result<(), RtmError> {
        self.channel.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtm::scripted::ScriptedTransport;

    fn client_with(frames: Vec<&str>) -> (Client, crate::rtm::scripted::SentLog) {
        let (transport, sent) = ScriptedTransport::with_frames(frames);
        let channel = RealtimeChannel::new(Box::new(transport));
        (Client::from_channel("U1", channel), sent)
    }

    #[tokio::test]
    async fn receive_then_reply_in_same_channel() {
        let (mut client, sent) = client_with(vec![
            r#"{"type":"message","channel":"C1","text":"ignore me"}"#,
            r#"{"type":"message","channel":"C2","text":"<@U1>: ping"}"#,
        ]);

        assert_eq!(client.receive().await.unwrap(), "ping");
        assert_eq!(client.last_channel(), Some("C2"));
        client.send("pong").await.unwrap();

        assert_eq!(
            sent.frames(),
            vec![serde_json::json!({ "id": 1, "type": "message", "channel": "C2", "text": "pong" })]
        );
    }

    #[tokio::test]
    async fn sequence_ids_count_sends() {
        let (mut client, sent) =
            client_with(vec![r#"{"type":"message","channel":"C999","text":"<@U1>: go"}"#]);
        client.receive().await.unwrap();
        for i in 0..5 {
            client.send(&format!("reply {}", i)).await.unwrap();
        }

        let frames = sent.frames();
        assert_eq!(frames.len(), 5);
        for (n, frame) in frames.iter().enumerate() {
            assert_eq!(frame["id"], serde_json::json!(n as u64 + 1));
            assert_eq!(frame["channel"], "C999");
        }
    }

    #[tokio::test]
    async fn reply_follows_latest_mention() {
        let (mut client, sent) = client_with(vec![
            r#"{"type":"message","channel":"C1","text":"<@U1>: one"}"#,
            r#"{"type":"message","channel":"C9","text":"unrelated"}"#,
            r#"{"type":"message","channel":"C2","text":"<@U1>: two"}"#,
        ]);
        assert_eq!(client.receive().await.unwrap(), "one");
        client.send("a").await.unwrap();
        assert_eq!(client.receive().await.unwrap(), "two");
        client.send("b").await.unwrap();

        let frames = sent.frames();
        assert_eq!(frames[0]["channel"], "C1");
        assert_eq!(frames[1]["channel"], "C2");
        assert_eq!(frames[1]["id"], 2);
    }

    #[tokio::test]
    async fn send_before_receive_targets_empty_channel() {
        let (mut client, sent) = client_with(vec![]);
        client.send("hello").await.unwrap();
        assert_eq!(client.channel.sequence(), 1);
        assert_eq!(
            sent.frames(),
            vec![serde_json::json!({ "id": 1, "type": "message", "channel": "", "text": "hello" })]
        );
    }

    #[tokio::test]
    async fn failed_send_still_consumes_sequence_id() {
        let (transport, _sent) = ScriptedTransport::with_frames(vec![
            r#"{"type":"message","channel":"C1","text":"<@U1>: hi"}"#,
        ]);
        let channel = RealtimeChannel::new(Box::new(transport.failing_sends()));
        let mut client = Client::from_channel("U1", channel);
        client.receive().await.unwrap();

        assert!(matches!(client.send("x").await, Err(RtmError::Transport(_))));
        assert!(client.send("y").await.is_err());
        assert_eq!(client.channel.sequence(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn receive_timeout_bounds_the_wait() {
        struct Silent;

        #[async_trait::async_trait]
        impl crate::rtm::channel::FrameTransport for Silent {
            async fn next_text(&mut self) -> Result<Option<String>, RtmError> {
                std::future::pending().await
            }
            async fn send_text(&mut self, _text: String) -> Result<(), RtmError> {
                Ok(())
            }
            async fn close(&mut self) -> Result<(), RtmError> {
                Ok(())
            }
        }

        let mut client = Client::from_channel("U1", RealtimeChannel::new(Box::new(Silent)))
            .with_receive_timeout(Some(Duration::from_secs(5)));
        let err = client.receive().await.unwrap_err();
        assert!(matches!(err, RtmError::Timeout(d) if d == Duration::from_secs(5)));
        assert!(!err.is_terminal());
    }
}
