//! Logging setup for NeuroFusion using tracing.
//!
//! Two layers with separate filters: a daily rolling file that always keeps
//! full detail, and stderr. The command prompt shares the terminal with
//! stderr, so the console only shows warnings unless `--verbose` is given.

use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const LOG_FILE_NAME: &str = "neurofusion.log";

/// Directives used when `RUST_LOG` is not set.
const FILE_DIRECTIVES: &str = "info,neurofusion=debug";
const QUIET_CONSOLE_DIRECTIVES: &str = "warn";

/// How the process wants its logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Mirror the file filter on stderr instead of warnings only.
    pub verbose: bool,
    /// Write the log file as one JSON object per line.
    pub json: bool,
}

/// Initialize logging with file appender and console output.
///
/// The returned guard flushes the file writer on drop, so keep it alive
/// for the whole process.
pub fn init(options: LogOptions) -> Result<(WorkerGuard, PathBuf)> {
    let log_dir = get_log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer: Box<dyn Layer<Registry> + Send + Sync> = if options.json {
        fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_current_span(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter(console_directives(options.verbose)));

    tracing_subscriber::registry()
        .with(file_layer.with_filter(filter(FILE_DIRECTIVES)))
        .with(console_layer)
        .init();

    tracing::info!(
        json = options.json,
        verbose = options.verbose,
        "NeuroFusion logging initialized"
    );
    tracing::info!("Log directory: {}", log_dir.display());

    Ok((guard, log_dir))
}

fn console_directives(verbose: bool) -> &'static str {
    if verbose {
        FILE_DIRECTIVES
    } else {
        QUIET_CONSOLE_DIRECTIVES
    }
}

/// `RUST_LOG` wins over the built-in default.
fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Get the log directory path.
fn get_log_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("ai", "neurofusion", "neurofusion")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

    Ok(dirs.data_dir().join("logs"))
}

/// Initialize logging for tests (captured output, no file).
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::registry()
        .with(filter("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
