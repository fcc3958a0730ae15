use std::path::PathBuf;

use crate::domain::{ChatId, MessageId};

/// Incoming update model, independent of the Telegram client library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingUpdate {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// Display name of the author (username, else first name, else `unknown`).
    pub author: String,
    pub content: UpdateContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateContent {
    Text(String),
    /// Resolution variants in the order Telegram sends them (smallest first).
    Photo(Vec<PhotoVariant>),
    /// Stickers, voice notes, service messages...
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
}

impl IncomingUpdate {
    /// The highest-resolution variant, which Telegram always puts last.
    pub fn largest_photo(&self) -> Option<&PhotoVariant> {
        match &self.content {
            UpdateContent::Photo(variants) => variants.last(),
            _ => None,
        }
    }
}

/// How a local file is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Photo,
    Document,
}

/// One outbound message; built per send and dropped afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    File {
        kind: FileKind,
        path: PathBuf,
        caption: Option<String>,
    },
}

impl OutboundMessage {
    pub fn file(kind: FileKind, path: impl Into<PathBuf>, caption: Option<&str>) -> Self {
        Self::File {
            kind,
            path: path.into(),
            caption: caption
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        }
    }
}
