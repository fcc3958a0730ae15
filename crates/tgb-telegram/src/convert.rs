//! teloxide types -> core update model.

use teloxide::types::{Message, User};

use tgb_core::{
    domain::{ChatId, MessageId},
    messaging::types::{IncomingUpdate, PhotoVariant, UpdateContent},
};

pub fn display_name(user: Option<&User>) -> String {
    let Some(user) = user else {
        return "unknown".to_string();
    };
    match &user.username {
        Some(name) if !name.is_empty() => name.clone(),
        _ if !user.first_name.is_empty() => user.first_name.clone(),
        _ => "unknown".to_string(),
    }
}

pub fn incoming_from_message(msg: &Message) -> IncomingUpdate {
    let content = if let Some(photos) = msg.photo().filter(|p| !p.is_empty()) {
        UpdateContent::Photo(
            photos
                .iter()
                .map(|p| PhotoVariant {
                    file_id: p.file.id.clone(),
                })
                .collect(),
        )
    } else if let Some(text) = msg.text() {
        UpdateContent::Text(text.to_string())
    } else {
        UpdateContent::Other
    };

    IncomingUpdate {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        author: display_name(msg.from()),
        content,
    }
}
