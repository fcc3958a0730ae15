//! Command-line flags.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "tgb")]
#[command(about = "Bridge this terminal to a Telegram home chat", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Which local UI to run.
    #[arg(long, value_enum, default_value_t = UiMode::Window)]
    pub ui: UiMode,

    /// Env file to load instead of `./.env`.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum UiMode {
    /// Line-oriented prompt on stdin/stdout.
    Console,
    /// Full-screen terminal window with fields and buttons.
    Window,
}
