//! Update listener: pulls updates from the bot session and feeds the history.

use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{
    bridge::Bridge,
    history::EntryKind,
    messaging::{
        port::UpdateSource,
        types::{IncomingUpdate, PhotoVariant, UpdateContent},
    },
    Result,
};

/// Sent once, to the first chat that writes to the bot.
pub const GREETING: &str = "Bot is now connected! Send me messages!";

const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

/// File name a received photo is saved under.
pub fn received_image_name(update: &IncomingUpdate) -> String {
    format!("received_image_{}.jpg", update.message_id)
}

/// Poll until `cancel` fires, dispatching every update in order.
pub async fn run(bridge: Arc<Bridge>, mut source: impl UpdateSource, cancel: CancellationToken) {
    tracing::info!("Listening for Telegram updates");
    loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break,
            batch = source.next_batch() => batch,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    handle_update(&bridge, update).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to get updates, retrying in 3 seconds");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                }
            }
        }
    }
    tracing::info!("Update listener stopped");
}

pub async fn handle_update(bridge: &Bridge, update: IncomingUpdate) {
    if bridge.home().adopt(update.chat_id) {
        tracing::info!(chat_id = update.chat_id.0, "Home Chat ID set to {}", update.chat_id);
        if let Err(e) = bridge.session().send_text(update.chat_id, GREETING).await {
            tracing::error!(chat_id = update.chat_id.0, error = %e, "Error sending message");
        }
    }

    match &update.content {
        UpdateContent::Photo(_) => {
            let Some(best) = update.largest_photo() else {
                return;
            };
            match save_photo(bridge, &update, best).await {
                Ok(path) => {
                    tracing::info!(path = %path.display(), from = %update.author, "Received image saved");
                    bridge.history().push(
                        EntryKind::ReceivedImage {
                            author: update.author.clone(),
                            path: path.display().to_string(),
                        },
                        "",
                    );
                }
                Err(e) => {
                    tracing::error!(message_id = update.message_id.0, error = %e, "Error downloading image");
                    bridge
                        .history()
                        .push(EntryKind::Notice, format!("Error downloading image: {e}"));
                }
            }
        }
        UpdateContent::Text(text) if !text.is_empty() => {
            tracing::debug!(from = %update.author, "text message received");
            bridge.history().push(
                EntryKind::Incoming {
                    author: update.author.clone(),
                },
                text.clone(),
            );
        }
        UpdateContent::Text(_) | UpdateContent::Other => {}
    }
}

async fn save_photo(
    bridge: &Bridge,
    update: &IncomingUpdate,
    best: &PhotoVariant,
) -> Result<PathBuf> {
    let url = bridge.session().file_url(&best.file_id).await?;
    let bytes = bridge.session().fetch(&url).await?;

    let path = bridge.download_dir().join(received_image_name(update));
    tokio::fs::write(&path, &bytes).await?;
    Ok(path)
}
