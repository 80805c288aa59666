//! Logging setup for Terra binaries.
//!
//! Library crates only emit `tracing` events; a binary calls
//! [`init_logging`] once to install a console subscriber, plus a JSON log
//! file in debug builds. `RUST_LOG` takes precedence over the configured
//! level.

use std::path::{Path, PathBuf};

use terra_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets a level.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

pub const LOG_FILE_NAME: &str = "terra.log";

/// Filter directive from the config's `debug.log_level`, or the default.
pub fn filter_directive(config: Option<&Config>) -> &str {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => &config.debug.log_level,
        _ => DEFAULT_FILTER,
    }
}

/// Open the JSON log file, creating `log_dir` if needed.
fn open_log_file(log_dir: &Path) -> Option<(std::fs::File, PathBuf)> {
    std::fs::create_dir_all(log_dir).ok()?;
    let path = log_dir.join(LOG_FILE_NAME);
    let file = std::fs::File::create(&path).ok()?;
    Some((file, path))
}

/// Install the global tracing subscriber.
///
/// * `log_dir` - directory for `terra.log` (used in debug builds only)
/// * `debug_build` - whether to add the JSON file layer
/// * `config` - source of the log level
///
/// Calling this twice panics inside `tracing-subscriber`, so binaries call
/// it once at startup.
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    // Mesh workers are named, so thread names tell them apart.
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && let Some((log_file, path)) = open_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::debug!(path = %path.display(), "Writing JSON log file");
        return;
    }

    subscriber.init();
}

/// `EnvFilter` for [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
