//! Logging initialisation for the engine's two run modes.
//!
//! `serve` gets structured JSON on disk plus a human-readable stderr
//! mirror; one-shot subcommands get stderr only. Verbosity follows
//! `RUST_LOG` and defaults to `info`.

use std::io;
use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive.
///
/// Dropping the guard flushes buffered entries and closes the file, so
/// the caller holds it for the life of the process.
#[must_use]
pub struct LogGuard(WorkerGuard);

/// Set up logging for the long-running `serve` mode.
///
/// JSON events land in `{logs_dir}/tarpit.log.YYYY-MM-DD`, rotated
/// daily and written off-thread; a plain-text layer mirrors everything
/// to stderr so stdout stays reserved for reply envelopes.
///
/// # Errors
///
/// Fails when `logs_dir` cannot be created.
pub fn init_serve(logs_dir: &Path) -> anyhow::Result<LogGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("creating logs directory {}", logs_dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, "tarpit.log"));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    Ok(LogGuard(guard))
}

/// Stderr-only logging for one-shot subcommands.
pub fn init_cli() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
