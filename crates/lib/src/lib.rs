//! rtmbot core library: Slack RTM session (negotiate, direct-mention receive, sequenced
//! replies), incoming-webhook sender, and configuration used by the CLI.

pub mod config;
pub mod rtm;
pub mod webhook;
