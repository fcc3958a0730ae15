use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use crate::{
    clipboard::ClipboardReader,
    domain::ChatId,
    errors::Error,
    history::{EntryKind, History},
    messaging::{
        port::BotSession,
        types::{FileKind, OutboundMessage},
    },
    Result,
};

/// Destination chat, fixed the first time it becomes known.
#[derive(Debug, Default)]
pub struct HomeChat {
    chat: OnceLock<ChatId>,
    fallback: Option<ChatId>,
}

impl HomeChat {
    pub fn new(fallback: Option<ChatId>) -> Self {
        Self {
            chat: OnceLock::new(),
            fallback,
        }
    }

    pub fn get(&self) -> Option<ChatId> {
        self.chat.get().copied()
    }

    /// Adopt `chat` if no destination is set yet. Returns `true` only for the call that set it.
    pub fn adopt(&self, chat: ChatId) -> bool {
        self.chat.set(chat).is_ok()
    }

    /// Destination for an outgoing send: the adopted chat, else the configured fallback
    /// (which is then adopted for good).
    pub fn resolve(&self) -> Option<ChatId> {
        if let Some(chat) = self.get() {
            return Some(chat);
        }
        self.fallback.map(|f| *self.chat.get_or_init(|| f))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Nothing to send (blank text).
    Empty,
    /// No message received yet and no configured chat id.
    NoDestination,
    /// The failure was logged and the action dropped.
    Failed,
}

/// Shared session context for the UI and the update listener.
pub struct Bridge {
    session: Arc<dyn BotSession>,
    clipboard: Arc<dyn ClipboardReader>,
    home: HomeChat,
    history: History,
    download_dir: PathBuf,
}

impl Bridge {
    pub fn new(
        session: Arc<dyn BotSession>,
        clipboard: Arc<dyn ClipboardReader>,
        fallback_chat: Option<ChatId>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            session,
            clipboard,
            home: HomeChat::new(fallback_chat),
            history: History::new(),
            download_dir: download_dir.into(),
        }
    }

    pub fn session(&self) -> &Arc<dyn BotSession> {
        &self.session
    }

    pub fn home(&self) -> &HomeChat {
        &self.home
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub async fn send_text(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Empty;
        }
        self.deliver(OutboundMessage::Text(text.to_string())).await
    }

    /// Capture the clipboard image and send it as a photo. The temp file is gone
    /// when this returns, whatever the outcome.
    pub async fn send_clipboard_image(&self, caption: Option<&str>) -> SendOutcome {
        let Some(chat_id) = self.destination() else {
            return SendOutcome::NoDestination;
        };

        let image = match self.clipboard.capture_image().await {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(error = %e, "Error getting image");
                self.history
                    .push(EntryKind::Notice, format!("Error getting image: {e}"));
                return SendOutcome::Failed;
            }
        };

        let outcome = self
            .deliver_to(
                chat_id,
                OutboundMessage::file(FileKind::Photo, image.path(), caption),
            )
            .await;
        drop(image);
        outcome
    }

    pub async fn send_file(&self, path: &Path, caption: Option<&str>) -> SendOutcome {
        self.deliver(OutboundMessage::file(FileKind::Document, path, caption))
            .await
    }

    async fn deliver(&self, msg: OutboundMessage) -> SendOutcome {
        match self.destination() {
            Some(chat_id) => self.deliver_to(chat_id, msg).await,
            None => SendOutcome::NoDestination,
        }
    }

    fn destination(&self) -> Option<ChatId> {
        let chat = self.home.resolve();
        if chat.is_none() {
            tracing::warn!("No destination chat yet; send a message to the bot first");
            self.history.push(
                EntryKind::Notice,
                "No chat yet: send the bot a message first (or set TELEGRAM_CHAT_ID)",
            );
        }
        chat
    }

    async fn deliver_to(&self, chat_id: ChatId, msg: OutboundMessage) -> SendOutcome {
        match self.try_deliver(chat_id, &msg).await {
            Ok(()) => {
                match msg {
                    OutboundMessage::Text(text) => {
                        self.history.push(EntryKind::Outgoing, text);
                    }
                    OutboundMessage::File {
                        kind: FileKind::Photo,
                        caption,
                        ..
                    } => {
                        tracing::info!(chat_id = chat_id.0, "Image sent successfully");
                        self.history
                            .push(EntryKind::SentImage, caption.unwrap_or_default());
                    }
                    OutboundMessage::File {
                        kind: FileKind::Document,
                        path,
                        ..
                    } => {
                        tracing::info!(chat_id = chat_id.0, path = %path.display(), "File sent successfully");
                        self.history
                            .push(EntryKind::SentFile, path.display().to_string());
                    }
                }
                SendOutcome::Sent
            }
            Err(e) => {
                let what = match &msg {
                    OutboundMessage::Text(_) => "message",
                    OutboundMessage::File {
                        kind: FileKind::Photo,
                        ..
                    } => "photo",
                    OutboundMessage::File {
                        kind: FileKind::Document,
                        ..
                    } => "file",
                };
                tracing::error!(chat_id = chat_id.0, error = %e, "Error sending {what}");
                self.history
                    .push(EntryKind::Notice, format!("Error sending {what}: {e}"));
                SendOutcome::Failed
            }
        }
    }

    async fn try_deliver(&self, chat_id: ChatId, msg: &OutboundMessage) -> Result<()> {
        match msg {
            OutboundMessage::Text(text) => {
                self.session.send_text(chat_id, text).await?;
            }
            OutboundMessage::File {
                kind,
                path,
                caption,
            } => {
                if tokio::fs::metadata(path).await.is_err() {
                    return Err(Error::FileNotFound(path.clone()));
                }
                match kind {
                    FileKind::Photo => {
                        self.session
                            .send_photo(chat_id, path, caption.as_deref())
                            .await?;
                    }
                    FileKind::Document => {
                        self.session
                            .send_document(chat_id, path, caption.as_deref())
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }
}
