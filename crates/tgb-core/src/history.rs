use std::{fmt, sync::Mutex};

use chrono::{DateTime, Local};
use tokio::sync::broadcast;

const SUBSCRIBER_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Incoming { author: String },
    Outgoing,
    ReceivedImage { author: String, path: String },
    SentImage,
    SentFile,
    Notice,
}

/// One line of the visible message list.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub at: DateTime<Local>,
    pub kind: EntryKind,
    pub text: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EntryKind::Incoming { author } => write!(f, "{author}: {}", self.text),
            EntryKind::Outgoing => write!(f, "You: {}", self.text),
            EntryKind::ReceivedImage { author, .. } => write!(f, "Received Image from {author}"),
            EntryKind::SentImage => write!(f, "You sent an image{}", caption_suffix(&self.text)),
            EntryKind::SentFile => write!(f, "You sent a file: {}", self.text),
            EntryKind::Notice => write!(f, "* {}", self.text),
        }
    }
}

fn caption_suffix(caption: &str) -> String {
    if caption.is_empty() {
        String::new()
    } else {
        format!(": {caption}")
    }
}

/// Append-only chat history shared by the listener and the UI.
///
/// Subscribers get every entry pushed after they subscribed; the window UI
/// reads snapshots instead.
pub struct History {
    entries: Mutex<Vec<HistoryEntry>>,
    tx: broadcast::Sender<HistoryEntry>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            entries: Mutex::new(Vec::new()),
            tx,
        }
    }

    pub fn push(&self, kind: EntryKind, text: impl Into<String>) -> HistoryEntry {
        let entry = HistoryEntry {
            at: Local::now(),
            kind,
            text: text.into(),
        };
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());
        // No subscribers is fine.
        let _ = self.tx.send(entry.clone());
        entry
    }

    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<HistoryEntry> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let start = guard.len().saturating_sub(n);
        guard[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEntry> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_render_like_the_chat_list() {
        let h = History::new();
        let a = h.push(
            EntryKind::Incoming {
                author: "alice".to_string(),
            },
            "hi",
        );
        let b = h.push(EntryKind::Outgoing, "hello back");
        let c = h.push(
            EntryKind::ReceivedImage {
                author: "alice".to_string(),
                path: "received_image_7.jpg".to_string(),
            },
            "",
        );
        let d = h.push(EntryKind::SentImage, "");
        let e = h.push(EntryKind::SentImage, "look");

        assert_eq!(a.to_string(), "alice: hi");
        assert_eq!(b.to_string(), "You: hello back");
        assert_eq!(c.to_string(), "Received Image from alice");
        assert_eq!(d.to_string(), "You sent an image");
        assert_eq!(e.to_string(), "You sent an image: look");
    }

    #[test]
    fn history_is_append_only_and_tail_keeps_order() {
        let h = History::new();
        assert!(h.is_empty());
        for i in 0..5 {
            h.push(EntryKind::Notice, format!("n{i}"));
        }
        assert_eq!(h.len(), 5);

        let tail: Vec<String> = h.tail(2).into_iter().map(|e| e.text).collect();
        assert_eq!(tail, vec!["n3", "n4"]);
        assert_eq!(h.tail(50).len(), 5);
        assert_eq!(h.snapshot()[0].text, "n0");
    }

    #[tokio::test]
    async fn subscribers_see_entries_pushed_after_subscribing() {
        let h = History::new();
        h.push(EntryKind::Notice, "before");
        let mut rx = h.subscribe();
        h.push(EntryKind::Outgoing, "after");

        let got = rx.recv().await.unwrap();
        assert_eq!(got.text, "after");
        assert!(rx.try_recv().is_err());
    }
}
