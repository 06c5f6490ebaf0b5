//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.rtmbot/config.json`) and environment.
//! Credentials never live in code: the RTM token and webhook URL come from here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default discovery endpoint that trades a token for a socket URL.
pub const DEFAULT_DISCOVERY_URL: &str = "https://slack.com/api/rtm.start";

/// Default scope requested during negotiation.
pub const DEFAULT_SOCKET_SCOPE: &str = "bot,incoming-webhook";

/// Default `Origin` header sent when opening the socket.
pub const DEFAULT_ORIGIN: &str = "https://api.slack.com/";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Real-time session settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Incoming-webhook settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Text the `listen` command answers every direct mention with.
    #[serde(default)]
    pub reply: Option<String>,
}

/// RTM session settings: token, discovery endpoint, scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Access token. Overridden by SLACK_TOKEN env.
    #[serde(default)]
    pub token: Option<String>,

    /// Discovery endpoint (default https://slack.com/api/rtm.start).
    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,

    /// Value of the `scope` query parameter (default "bot,incoming-webhook").
    #[serde(default = "default_socket_scope")]
    pub socket_scope: String,

    /// Origin header for the websocket handshake.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Upper bound on a single receive. Unset waits forever.
    #[serde(default)]
    pub receive_timeout_secs: Option<u64>,
}

/// Incoming-webhook target and presentation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Webhook URL. Overridden by SLACK_WEBHOOK_URL env.
    pub url: Option<String>,
    /// Display name sent as `user_name`.
    pub username: Option<String>,
    /// Emoji sent as `icon_emoji` (e.g. ":robot_face:").
    pub icon_emoji: Option<String>,
}

fn default_discovery_url() -> String {
    DEFAULT_DISCOVERY_URL.to_string()
}

fn default_socket_scope() -> String {
    DEFAULT_SOCKET_SCOPE.to_string()
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token: None,
            discovery_url: default_discovery_url(),
            socket_scope: default_socket_scope(),
            origin: default_origin(),
            receive_timeout_secs: None,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the RTM token: env SLACK_TOKEN overrides config.
pub fn resolve_token(config: &Config) -> Option<String> {
    non_empty_env("SLACK_TOKEN").or_else(|| non_empty(config.slack.token.as_ref()))
}

/// Resolve the webhook URL: env SLACK_WEBHOOK_URL overrides config.
pub fn resolve_webhook_url(config: &Config) -> Option<String> {
    non_empty_env("SLACK_WEBHOOK_URL").or_else(|| non_empty(config.webhook.url.as_ref()))
}

/// Apply environment overrides in place so downstream code only reads the config.
pub fn apply_env_overrides(config: &mut Config) {
    config.slack.token = resolve_token(config);
    config.webhook.url = resolve_webhook_url(config);
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RTMBOT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".rtmbot").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, or the default path (or RTMBOT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Create the config directory and write a default `config.json` if it does not exist.
/// Returns true when a file was written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    let body = serde_json::to_string_pretty(&Config::default())?;
    std::fs::write(path, body).with_context(|| format!("writing config to {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slack_defaults() {
        let s = SlackConfig::default();
        assert_eq!(s.discovery_url, "https://slack.com/api/rtm.start");
        assert_eq!(s.socket_scope, "bot,incoming-webhook");
        assert_eq!(s.origin, "https://api.slack.com/");
        assert!(s.receive_timeout_secs.is_none());
    }

    #[test]
    fn parses_camel_case_and_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "slack": { "token": "xoxb-1", "receiveTimeoutSecs": 30 },
                 "webhook": { "url": "https://hooks.example/T", "iconEmoji": ":ghost:" } }"#,
        )
        .unwrap();
        assert_eq!(config.slack.token.as_deref(), Some("xoxb-1"));
        assert_eq!(config.slack.receive_timeout_secs, Some(30));
        assert_eq!(config.slack.discovery_url, DEFAULT_DISCOVERY_URL);
        assert_eq!(config.webhook.icon_emoji.as_deref(), Some(":ghost:"));
        assert!(config.reply.is_none());
    }

    #[test]
    fn blank_config_values_are_ignored() {
        let mut config = Config::default();
        config.slack.token = Some("   ".to_string());
        assert_eq!(non_empty(config.slack.token.as_ref()), None);
        config.slack.token = Some(" xoxb-2 ".to_string());
        assert_eq!(non_empty(config.slack.token.as_ref()).as_deref(), Some("xoxb-2"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir()
            .join(format!("rtmbot-missing-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert!(config.slack.token.is_none());
    }

    #[test]
    fn init_writes_once_and_round_trips() {
        let dir = std::env::temp_dir().join(format!("rtmbot-init-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");
        assert!(init_config(&path).unwrap());
        assert!(!init_config(&path).unwrap());
        let (config, _) = load_config(Some(path)).unwrap();
        assert_eq!(config.slack.socket_scope, DEFAULT_SOCKET_SCOPE);
        let _ = std::fs::remove_dir_all(dir);
    }
}
