use std::path::PathBuf;

/// Core error type for the bridge.
///
/// Adapter crates map their specific errors into this type so the bridge
/// actions can log and drop every failure the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telegram error: {0}")]
    Telegram(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("no image in clipboard")]
    NoImageInClipboard,

    #[error("no destination chat yet")]
    NoDestination,

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
