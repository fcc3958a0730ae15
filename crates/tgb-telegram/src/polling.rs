use std::time::Duration;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{AllowedUpdate, Update, UpdateKind},
};

use tgb_core::{
    errors::Error,
    messaging::{port::UpdateSource, types::IncomingUpdate},
    Result,
};

use crate::convert::incoming_from_message;

/// Long-polling `getUpdates` source.
///
/// Keeps the offset so every update is delivered once.
pub struct TelegramUpdates {
    bot: Bot,
    offset: i32,
    timeout_secs: u32,
}

impl TelegramUpdates {
    pub fn new(bot: Bot, poll_timeout: Duration) -> Self {
        Self {
            bot,
            offset: 0,
            timeout_secs: u32::try_from(poll_timeout.as_secs()).unwrap_or(u32::MAX),
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramUpdates {
    async fn next_batch(&mut self) -> Result<Vec<IncomingUpdate>> {
        let updates = self
            .bot
            .get_updates()
            .offset(self.offset)
            .timeout(self.timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await
            .map_err(|e| Error::Telegram(e.to_string()))?;

        Ok(absorb(&mut self.offset, updates))
    }
}

/// Advance `offset` past every update in the batch and keep the messages.
///
/// The offset never moves backwards, so a replayed batch cannot rewind it.
fn absorb(offset: &mut i32, updates: Vec<Update>) -> Vec<IncomingUpdate> {
    let mut out = Vec::with_capacity(updates.len());
    for update in updates {
        *offset = (*offset).max(update.id.saturating_add(1));
        match update.kind {
            UpdateKind::Message(msg) => out.push(incoming_from_message(&msg)),
            other => tracing::debug!(update_id = update.id, kind = ?other, "skipping non-message update"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use tgb_core::{domain::MessageId, messaging::types::UpdateContent};

    use super::*;

    fn update(id: i32, kind: &str, message_id: i32, text: &str) -> Update {
        let mut message = serde_json::json!({
            "message_id": message_id,
            "date": 1700000000,
            "chat": { "id": 4242, "type": "private", "first_name": "Alice" },
            "from": { "id": 4242, "is_bot": false, "first_name": "Alice", "username": "alice" },
            "text": text,
        });
        if kind == "edited_message" {
            message["edit_date"] = serde_json::json!(1700000100);
        }
        let mut raw = serde_json::json!({ "update_id": id });
        raw[kind] = message;
        serde_json::from_str(&raw.to_string()).unwrap()
    }

    #[test]
    fn offset_moves_past_the_highest_update_id() {
        let mut offset = 0;
        let out = absorb(
            &mut offset,
            vec![
                update(10, "message", 1, "one"),
                update(12, "message", 3, "three"),
                update(11, "message", 2, "two"),
            ],
        );

        assert_eq!(offset, 13);
        let ids: Vec<MessageId> = out.iter().map(|u| u.message_id).collect();
        assert_eq!(ids, vec![MessageId(1), MessageId(3), MessageId(2)]);
    }

    #[test]
    fn offset_never_moves_backwards() {
        let mut offset = 50;
        absorb(&mut offset, vec![update(7, "message", 1, "late")]);
        assert_eq!(offset, 50);

        absorb(&mut offset, vec![]);
        assert_eq!(offset, 50);
    }

    #[test]
    fn edited_messages_advance_the_offset_but_are_dropped() {
        let mut offset = 0;
        let out = absorb(
            &mut offset,
            vec![
                update(20, "message", 1, "hi"),
                update(21, "edited_message", 1, "hi!"),
            ],
        );

        assert_eq!(offset, 22);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, UpdateContent::Text("hi".to_string()));
    }
}
