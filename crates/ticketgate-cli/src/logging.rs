//! Logging initialization
//!
//! Two sinks: stderr, filtered by `-v`, and the application log file,
//! filtered by `RUST_LOG` or the configured level.

use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

use ticketgate_core::Settings;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Install the global subscriber
pub fn init(settings: &Settings, verbose: u8) {
    let stderr_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let stderr_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_level);

    let file_layer = if settings.logging.file {
        open_log_file(settings).map(|file| {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter)
        })
    } else {
        None
    };

    // A second init (e.g. in tests) keeps the first subscriber
    if let Err(e) = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        tracing::debug!(error = %e, "Subscriber already installed");
    }
}

fn open_log_file(settings: &Settings) -> Option<File> {
    let path = settings.app_log();
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: cannot create log directory {}: {e}", parent.display());
            return None;
        }
    }

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", path.display());
            None
        }
    }
}
