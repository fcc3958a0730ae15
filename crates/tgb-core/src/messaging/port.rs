use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::IncomingUpdate,
    Result,
};

/// Outbound half of the bot session.
///
/// Implemented over the Telegram Bot API in `tgb-telegram`; tests use an
/// in-memory fake.
#[async_trait]
pub trait BotSession: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    /// Resolve a downloadable URL for a file id.
    async fn file_url(&self, file_id: &str) -> Result<String>;

    /// Plain HTTP GET of `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Inbound half of the bot session: long-polls the next batch of updates.
#[async_trait]
pub trait UpdateSource: Send {
    /// Waits for the next batch; an empty batch means the poll timed out.
    async fn next_batch(&mut self) -> Result<Vec<IncomingUpdate>>;
}
