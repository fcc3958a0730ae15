//! Telegram adapter (teloxide).
//!
//! Implements the `tgb-core` [`BotSession`] and [`UpdateSource`] ports over the
//! Telegram Bot API.

use std::{path::Path, time::Duration};

use async_trait::async_trait;

use teloxide::{prelude::*, types::InputFile};

pub mod convert;
pub mod polling;

pub use polling::TelegramUpdates;

use tgb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::port::BotSession,
    Result,
};

/// Slack added to the HTTP timeout on top of the long-poll timeout.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct TelegramSession {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramSession {
    /// Build a session whose HTTP timeout outlasts a `poll_timeout` long poll.
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(poll_timeout.saturating_add(HTTP_TIMEOUT_SLACK))
            .build()
            .map_err(Self::map_http_err)?;

        Ok(Self {
            bot: Bot::with_client(token, client.clone()),
            http: client,
        })
    }

    /// `getMe`; returns the bot's username.
    pub async fn authorize(&self) -> Result<String> {
        let me = self.bot.get_me().await.map_err(Self::map_err)?;
        let username = me.username().to_string();
        tracing::info!(account = %username, "Authorized on account {username}");
        Ok(username)
    }

    pub fn updates(&self, poll_timeout: Duration) -> TelegramUpdates {
        TelegramUpdates::new(self.bot.clone(), poll_timeout)
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Telegram(e.to_string())
    }

    fn map_http_err(e: reqwest::Error) -> Error {
        Error::Http(e.to_string())
    }

    fn message_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

/// Download URL for a file path returned by `getFile`.
pub fn file_download_url(api_url: &str, token: &str, file_path: &str) -> String {
    format!(
        "{}/file/bot{}/{}",
        api_url.trim_end_matches('/'),
        token,
        file_path.trim_start_matches('/')
    )
}

#[async_trait]
impl BotSession for TelegramSession {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_photo(Self::tg_chat(chat_id), InputFile::file(path.to_path_buf()));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_document(Self::tg_chat(chat_id), InputFile::file(path.to_path_buf()));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn file_url(&self, file_id: &str) -> Result<String> {
        let file = self
            .bot
            .get_file(file_id.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(file_download_url(
            self.bot.api_url().as_str(),
            self.bot.token(),
            &file.path,
        ))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(Self::map_http_err)?;
        let bytes = resp.bytes().await.map_err(Self::map_http_err)?;
        Ok(bytes.to_vec())
    }
}
