//! Lunch poll bot binary.

use clap::Parser;
use lunchbot::channels::TelegramClient;
use lunchbot::scheduler::DailyWindow;
use lunchbot::{BotConfig, EventDispatcher, VoteGateway, WindowScheduler};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Weekday lunch poll for a Telegram group.
#[derive(Parser)]
#[command(name = "lunchbot", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the default configuration as TOML and exit.
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lunchbot=info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", BotConfig::default().to_toml()?);
        return Ok(());
    }

    let config = load_config(cli.config)?;
    let window = DailyWindow::from_config(&config.window)?;
    if config.window.target_chat_id == 0 {
        warn!("window.target_chat_id is 0, the daily poll has nowhere to go");
    }

    let client = Arc::new(TelegramClient::new(&config.telegram));
    let gateway = Arc::new(VoteGateway::new());
    let cancel = CancellationToken::new();

    let scheduler = WindowScheduler::new(
        window,
        config.window.target_chat_id,
        Arc::clone(&gateway),
        client.clone(),
    );
    let dispatcher = EventDispatcher::new(
        client.clone(),
        client,
        Arc::clone(&gateway),
        window,
        config.telegram.poll_timeout_secs,
    );

    info!(
        chat = config.window.target_chat_id,
        open = %window.open_time(),
        close = %window.close_time(),
        "lunchbot starting"
    );

    let liveness = config.liveness.enabled.then(|| {
        let liveness_config = config.liveness.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = lunchbot::liveness::run_liveness(&liveness_config, cancel).await {
                error!("liveness endpoint failed: {e:#}");
            }
        })
    });
    let scheduler = scheduler.run(cancel.clone());
    let dispatcher = dispatcher.run(cancel.clone());

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down...");
    cancel.cancel();

    for handle in [scheduler, dispatcher].into_iter().chain(liveness) {
        if let Err(e) = handle.await {
            error!("task ended abnormally: {e}");
        }
    }

    info!("lunchbot shut down cleanly");
    Ok(())
}

/// Explicit path, else the default path if it exists, else built-in defaults.
/// Environment overrides are applied last.
fn load_config(path: Option<PathBuf>) -> anyhow::Result<BotConfig> {
    let mut config = match path {
        Some(path) => BotConfig::from_file(&path)?,
        None => {
            let default_path = BotConfig::default_config_path();
            if default_path.exists() {
                BotConfig::from_file(&default_path)?
            } else {
                BotConfig::default()
            }
        }
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}
