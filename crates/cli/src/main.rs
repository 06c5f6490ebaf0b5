use clap::{Parser, Subcommand};
use rtmbot::config::{self, Config};
use rtmbot::rtm::{Client, RtmError};
use rtmbot::webhook::WebhookClient;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_REPLY: &str = "hi, this is rtmbot responding. I can hear you.";

#[derive(Parser)]
#[command(name = "rtmbot")]
#[command(about = "Slack RTM listener and webhook poster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: RTMBOT_CONFIG_PATH or ~/.rtmbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Connect to Slack RTM and answer every direct mention of the bot.
    Listen {
        /// Config file path (default: RTMBOT_CONFIG_PATH or ~/.rtmbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Reply text (default from config `reply`)
        #[arg(long, short, value_name = "TEXT")]
        reply: Option<String>,
    },

    /// Post a message through the incoming webhook. Without --text, posts each line read from stdin.
    Post {
        /// Config file path (default: RTMBOT_CONFIG_PATH or ~/.rtmbot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Message text to post once
        #[arg(long, short, value_name = "TEXT")]
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("rtmbot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Listen { config, reply }) => {
            if let Err(e) = run_listen(config, reply).await {
                log::error!("listen failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Post { config, text }) => {
            if let Err(e) = run_post(config, text).await {
                log::error!("post failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn load(config_path: Option<PathBuf>) -> anyhow::Result<Config> {
    let (mut config, path) = config::load_config(config_path)?;
    config::apply_env_overrides(&mut config);
    log::debug!("using config {}", path.display());
    Ok(config)
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    if config::init_config(&path)? {
        println!("initialized configuration at {}", path.display());
    } else {
        println!("configuration already exists at {}", path.display());
    }
    Ok(())
}

async fn run_listen(config_path: Option<PathBuf>, reply: Option<String>) -> anyhow::Result<()> {
    let config = load(config_path)?;
    let reply = reply
        .or_else(|| config.reply.clone())
        .unwrap_or_else(|| DEFAULT_REPLY.to_string());

    let mut client = Client::connect(&config.slack).await?;
    log::info!("listening for direct mentions of {}", client.self_id());

    let finished = tokio::select! {
        res = answer_mentions(&mut client, &reply) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };
    match finished {
        Some(res) => res?,
        None => {
            log::info!("shutdown signal received, closing rtm session");
            if let Err(e) = client.close().await {
                log::debug!("rtm close: {}", e);
            }
        }
    }
    Ok(())
}

async fn answer_mentions(client: &mut Client, reply: &str) -> Result<(), RtmError> {
    loop {
        let text = match client.receive().await {
            Ok(text) => text,
            Err(RtmError::Timeout(d)) => {
                log::debug!("no direct mention within {:?}", d);
                continue;
            }
            Err(e) => return Err(e),
        };
        log::info!(
            "direct mention in {}: {}",
            client.last_channel().unwrap_or_default(),
            text
        );
        if text.is_empty() {
            continue;
        }
        client.send(reply).await?;
    }
}

async fn run_post(config_path: Option<PathBuf>, text: Option<String>) -> anyhow::Result<()> {
    let config = load(config_path)?;
    let hook = WebhookClient::from_config(&config.webhook)?;

    if let Some(text) = text {
        hook.send_text(&text).await?;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        hook.send_text(line).await?;
        log::info!("posted {} bytes", line.len());
    }
    Ok(())
}
