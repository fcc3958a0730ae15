use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tokio_util::sync::CancellationToken;

use tgb_core::{bridge::Bridge, clipboard::XclipClipboard, config::Config, listener};
use tgb_telegram::TelegramSession;

mod cli;
mod console;
mod window;

use cli::{Cli, UiMode};

/// The window owns the terminal, so its logs go to a file unless LOG_FILE says otherwise.
const DEFAULT_WINDOW_LOG: &str = "tgb.log";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = Config::load(cli.env_file.as_deref())?;
    let log_file = cfg.log_file.clone().or_else(|| {
        (cli.ui == UiMode::Window).then(|| PathBuf::from(DEFAULT_WINDOW_LOG))
    });
    tgb_core::logging::init("tgb", log_file.as_deref())?;
    tracing::debug!(config = ?cfg, "configuration loaded");

    let session = TelegramSession::new(&cfg.telegram_bot_token, cfg.poll_timeout)?;
    session.authorize().await?;
    let updates = session.updates(cfg.poll_timeout);

    let bridge = Arc::new(Bridge::new(
        Arc::new(session),
        Arc::new(XclipClipboard::new(&cfg.clipboard_tool)),
        cfg.telegram_chat_id,
        cfg.download_dir.clone(),
    ));

    let cancel = CancellationToken::new();
    let listener = tokio::spawn(listener::run(bridge.clone(), updates, cancel.clone()));

    let ui = async {
        match cli.ui {
            UiMode::Console => console::run(bridge.clone()).await,
            UiMode::Window => {
                let bridge = bridge.clone();
                let handle = tokio::runtime::Handle::current();
                tokio::task::spawn_blocking(move || window::run(bridge, handle)).await?
            }
        }
    };

    tokio::select! {
        res = ui => {
            cancel.cancel();
            let _ = listener.await;
            res
        }
        _ = tokio::signal::ctrl_c() => {
            if cli.ui == UiMode::Window {
                window::restore_terminal();
            }
            tracing::info!("Exiting...");
            cancel.cancel();
            // The UI may still be blocked reading the terminal.
            std::process::exit(0);
        }
    }
}
