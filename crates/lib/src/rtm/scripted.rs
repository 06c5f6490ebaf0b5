//! In-memory transport for tests: replays scripted inbound frames and records what was sent.

use crate::rtm::channel::FrameTransport;
use crate::rtm::error::RtmError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub(crate) struct ScriptedTransport {
    inbound: VecDeque<Result<Option<String>, RtmError>>,
    sent: SentLog,
    fail_sends: bool,
}

/// Shared view of the frames written through a [`ScriptedTransport`].
#[derive(Clone, Default)]
pub(crate) struct SentLog(Arc<Mutex<Vec<String>>>);

impl SentLog {
    pub(crate) fn frames(&self) -> Vec<serde_json::Value> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }
}

impl ScriptedTransport {
    /// Replays `frames` as text payloads, then reports the socket closed.
    pub(crate) fn with_frames(frames: Vec<&str>) -> (Self, SentLog) {
        Self::with_script(frames.into_iter().map(|f| Ok(Some(f.to_string()))).collect())
    }

    pub(crate) fn with_script(script: Vec<Result<Option<String>, RtmError>>) -> (Self, SentLog) {
        let sent = SentLog::default();
        let transport = Self {
            inbound: script.into(),
            sent: sent.clone(),
            fail_sends: false,
        };
        (transport, sent)
    }

    pub(crate) fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }
}

#[async_trait]
impl FrameTransport for ScriptedTransport {
    async fn next_text(&mut self) -> Result<Option<String>, RtmError> {
        self.inbound.pop_front().unwrap_or(Ok(None))
    }

    async fn send_text(&mut self, text: String) -> Result<(), RtmError> {
        if self.fail_sends {
            return Err(RtmError::Transport("broken pipe".to_string()));
        }
        self.sent.0.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RtmError> {
        self.inbound.clear();
        Ok(())
    }
}
