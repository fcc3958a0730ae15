use std::{
    env, fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
const POLL_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=600;

/// Typed configuration for the bridge.
#[derive(Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Fallback destination used until the first message arrives.
    pub telegram_chat_id: Option<ChatId>,

    pub download_dir: PathBuf,
    pub clipboard_tool: String,
    pub poll_timeout: Duration,
    pub log_file: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &mask_token(&self.telegram_bot_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("download_dir", &self.download_dir)
            .field("clipboard_tool", &self.clipboard_tool)
            .field("poll_timeout", &self.poll_timeout)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl Config {
    /// Load `.env` (or `env_file`) into the process environment, then read the config.
    ///
    /// Variables already present in the environment win over the file.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        load_dotenv(env_file)?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if telegram_bot_token.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN must be set (environment or .env)".to_string(),
            ));
        }

        let telegram_chat_id = match lookup("TELEGRAM_CHAT_ID").and_then(non_empty) {
            Some(raw) => match parse_chat_id(&raw) {
                Some(id) => Some(id),
                None => {
                    tracing::warn!(value = %raw, "Error parsing TELEGRAM_CHAT_ID, ignoring it");
                    None
                }
            },
            None => None,
        };

        let download_dir = lookup("DOWNLOAD_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let clipboard_tool = lookup("CLIPBOARD_TOOL")
            .and_then(non_empty)
            .unwrap_or_else(|| "xclip".to_string());

        let poll_secs = match lookup("POLL_TIMEOUT_SECS").and_then(non_empty) {
            Some(raw) => parse_poll_timeout(&raw),
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };
        let poll_timeout = Duration::from_secs(poll_secs);

        let log_file = lookup("LOG_FILE").and_then(non_empty).map(PathBuf::from);

        Ok(Self {
            telegram_bot_token,
            telegram_chat_id,
            download_dir,
            clipboard_tool,
            poll_timeout,
            log_file,
        })
    }
}

fn load_dotenv(env_file: Option<&Path>) -> Result<()> {
    let loaded = match env_file {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };

    match loaded {
        Ok(()) => Ok(()),
        // A missing default `.env` is fine; the variables may come from the environment.
        Err(e) if env_file.is_none() && e.not_found() => Ok(()),
        Err(e) => Err(Error::Config(format!("error loading env file: {e}"))),
    }
}

/// Seconds for the `getUpdates` long poll, clamped to `POLL_TIMEOUT_RANGE`.
fn parse_poll_timeout(raw: &str) -> u64 {
    let Ok(secs) = raw.trim().parse::<u64>() else {
        tracing::warn!(value = %raw, "Error parsing POLL_TIMEOUT_SECS, using the default");
        return DEFAULT_POLL_TIMEOUT_SECS;
    };
    let clamped = secs.clamp(*POLL_TIMEOUT_RANGE.start(), *POLL_TIMEOUT_RANGE.end());
    if clamped != secs {
        tracing::warn!(value = secs, used = clamped, "POLL_TIMEOUT_SECS out of range");
    }
    clamped
}

pub fn parse_chat_id(raw: &str) -> Option<ChatId> {
    raw.trim().parse::<i64>().ok().map(ChatId)
}

/// Mask a secret for logs: first 7 chars + `***` + last 4 chars.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
