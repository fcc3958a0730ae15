use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::{fmt, EnvFilter};

use crate::Result;

/// Initialize logging/tracing for the bridge.
///
/// Logs go to stderr unless `log_file` is given, in which case they are appended
/// to that file without ANSI colors (the window UI owns the terminal).
pub fn init(service_name: &str, log_file: Option<&Path>) -> Result<()> {
    // Default: info for our crates, warn for everything else.
    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tgb_core=info,tgb_telegram=info,{service_name}=info"
        ))
    });

    let builder = fmt().with_env_filter(filter).with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| crate::Error::External(format!("logging init failed: {e}")))?;
        }
        None => {
            builder
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| crate::Error::External(format!("logging init failed: {e}")))?;
        }
    }

    Ok(())
}
