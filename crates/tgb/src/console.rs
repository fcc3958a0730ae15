//! Line-oriented console UI.

use std::{io::Write, path::PathBuf, sync::Arc};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};

use tgb_core::{
    bridge::{Bridge, SendOutcome},
    history::{EntryKind, HistoryEntry},
};

const PROMPT: &str = "> ";
const CAPTION_PROMPT: &str = "Enter caption: (Enter to skip) ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Image,
    File(PathBuf),
    Quit,
    Text(String),
    Blank,
    Usage(&'static str),
}

pub fn parse_line(line: &str) -> ConsoleCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ConsoleCommand::Blank;
    }
    match trimmed {
        "/image" => return ConsoleCommand::Image,
        "/quit" => return ConsoleCommand::Quit,
        "/file" => return ConsoleCommand::Usage("usage: /file <path>"),
        _ => {}
    }
    if let Some(path) = trimmed.strip_prefix("/file ") {
        let path = path.trim();
        if path.is_empty() {
            return ConsoleCommand::Usage("usage: /file <path>");
        }
        return ConsoleCommand::File(PathBuf::from(path));
    }
    ConsoleCommand::Text(line.to_string())
}

/// How a history entry shows up on the console; `None` for echoes of our own input.
pub fn console_line(entry: &HistoryEntry) -> Option<String> {
    match &entry.kind {
        EntryKind::Incoming { .. } => Some(format!("Home Account: {}", entry.text)),
        EntryKind::ReceivedImage { path, .. } => Some(format!("Received image saved as: {path}")),
        EntryKind::Notice => Some(format!("! {}", entry.text)),
        EntryKind::Outgoing | EntryKind::SentImage | EntryKind::SentFile => None,
    }
}

fn print_flush(s: &str) {
    let mut out = std::io::stdout().lock();
    let _ = out.write_all(s.as_bytes());
    let _ = out.flush();
}

async fn print_incoming(mut rx: broadcast::Receiver<HistoryEntry>) {
    loop {
        match rx.recv().await {
            Ok(entry) => {
                if let Some(line) = console_line(&entry) {
                    print_flush(&format!("\n{line}\n{PROMPT}"));
                }
            }
            Err(RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "console fell behind the chat history");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Read commands until EOF or `/quit`.
pub async fn run(bridge: Arc<Bridge>) -> anyhow::Result<()> {
    let printer = tokio::spawn(print_incoming(bridge.history().subscribe()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_flush(PROMPT);
    while let Some(line) = lines.next_line().await? {
        let outcome = match parse_line(&line) {
            ConsoleCommand::Image => {
                print_flush(CAPTION_PROMPT);
                let caption = lines.next_line().await?.unwrap_or_default();
                Some(bridge.send_clipboard_image(Some(&caption)).await)
            }
            ConsoleCommand::File(path) => Some(bridge.send_file(&path, None).await),
            ConsoleCommand::Text(text) => Some(bridge.send_text(&text).await),
            ConsoleCommand::Usage(usage) => {
                print_flush(&format!("{usage}\n"));
                None
            }
            ConsoleCommand::Quit => break,
            ConsoleCommand::Blank => None,
        };
        // Failures re-prompt through the printer, which shows their notice.
        if !matches!(outcome, Some(SendOutcome::Failed | SendOutcome::NoDestination)) {
            print_flush(PROMPT);
        }
    }

    printer.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;

    #[test]
    fn parses_commands_and_text() {
        assert_eq!(parse_line("/image"), ConsoleCommand::Image);
        assert_eq!(parse_line("  /image "), ConsoleCommand::Image);
        assert_eq!(parse_line("/quit"), ConsoleCommand::Quit);
        assert_eq!(
            parse_line("/file ~/Downloads/report.pdf"),
            ConsoleCommand::File(PathBuf::from("~/Downloads/report.pdf"))
        );
        assert!(matches!(parse_line("/file"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse_line("/file   "), ConsoleCommand::Usage(_)));
        assert_eq!(parse_line(""), ConsoleCommand::Blank);
        assert_eq!(parse_line("   "), ConsoleCommand::Blank);
        assert_eq!(
            parse_line("hello /image"),
            ConsoleCommand::Text("hello /image".to_string())
        );
        assert_eq!(
            parse_line("/images please"),
            ConsoleCommand::Text("/images please".to_string())
        );
    }

    fn entry(kind: EntryKind, text: &str) -> HistoryEntry {
        HistoryEntry {
            at: Local::now(),
            kind,
            text: text.to_string(),
        }
    }

    #[test]
    fn only_remote_and_notice_entries_are_printed() {
        let incoming = entry(
            EntryKind::Incoming {
                author: "alice".to_string(),
            },
            "ping",
        );
        assert_eq!(console_line(&incoming).as_deref(), Some("Home Account: ping"));

        let image = entry(
            EntryKind::ReceivedImage {
                author: "alice".to_string(),
                path: "./received_image_9.jpg".to_string(),
            },
            "",
        );
        assert_eq!(
            console_line(&image).as_deref(),
            Some("Received image saved as: ./received_image_9.jpg")
        );

        assert!(console_line(&entry(EntryKind::Outgoing, "pong")).is_none());
        assert!(console_line(&entry(EntryKind::SentImage, "")).is_none());
        assert_eq!(
            console_line(&entry(EntryKind::Notice, "no image in clipboard")).as_deref(),
            Some("! no image in clipboard")
        );
    }
}
