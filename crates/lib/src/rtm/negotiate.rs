//! Session negotiation: trade the access token for a one-time socket URL and the bot's own id.

use crate::config::SlackConfig;
use crate::rtm::error::RtmError;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct SelfInfo {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    ok: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    url: String,
    #[serde(default, rename = "self")]
    self_info: SelfInfo,
}

/// Result of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// Websocket URL, valid for one connection.
    pub url: String,
    /// The bot's user id; direct mentions are addressed to it.
    pub self_id: String,
}

/// GET `<discovery_url>?token=..&no_unreads=true&scope=..` once. Every failure is terminal.
pub async fn negotiate(http: &reqwest::Client, config: &SlackConfig) -> Result<Negotiated, RtmError> {
    let token = config
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RtmError::Negotiation("slack token not configured".to_string()))?;

    let res = http
        .get(&config.discovery_url)
        .query(&[
            ("token", token),
            ("no_unreads", "true"),
            ("scope", config.socket_scope.as_str()),
        ])
        .send()
        .await
        .map_err(|e| RtmError::Negotiation(e.without_url().to_string()))?;

    if res.status() != reqwest::StatusCode::OK {
        return Err(RtmError::Negotiation(format!(
            "request failed: {}",
            res.status().as_u16()
        )));
    }

    let body = res
        .bytes()
        .await
        .map_err(|e| RtmError::Negotiation(e.without_url().to_string()))?;
    let data: StartResponse = serde_json::from_slice(&body)
        .map_err(|e| RtmError::Negotiation(format!("malformed response: {}", e)))?;

    if !data.ok {
        return Err(RtmError::Negotiation(data.error));
    }

    log::info!("rtm session negotiated for bot {}", data.self_info.id);
    Ok(Negotiated {
        url: data.url,
        self_id: data.self_info.id,
    })
}
