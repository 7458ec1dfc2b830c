//! Tracing setup for Cadence
//!
//! Console output at a user-controlled level, plus an optional full trace
//! log on disk for diagnosing upstream rejections after the fact.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File name of the per-run trace log inside the log directory.
pub const LOG_FILE_NAME: &str = "cadence-last-run.log";

/// Initialize tracing with console output and an optional trace file.
///
/// `RUST_LOG` takes precedence over `console_level` for the console layer.
/// When `logs_dir` is given, every event down to TRACE is also written to
/// `logs_dir/cadence-last-run.log`, overwriting the previous run.
///
/// # Errors
///
/// - `std::io::Error` - If the logs directory cannot be created or the log file cannot be opened
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> std::io::Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    // Console logs go to stderr; stdout may carry relayed audio.
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    let Some(dir) = logs_dir else {
        tracing_subscriber::registry().with(console_layer).init();
        tracing::info!("Tracing initialized: console={}", console_level);
        return Ok(());
    };

    let log_file_path = open_log_file(dir)?;
    let log_file = File::create(&log_file_path)?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Tracing initialized: console={}, debug_file={}",
        console_level,
        log_file_path.display()
    );

    Ok(())
}

fn open_log_file(dir: &Path) -> std::io::Result<PathBuf> {
    create_dir_all(dir)?;
    Ok(dir.join(LOG_FILE_NAME))
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use cadence_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliLogLevel::Error => write!(f, "error"),
            CliLogLevel::Warn => write!(f, "warn"),
            CliLogLevel::Info => write!(f, "info"),
            CliLogLevel::Debug => write!(f, "debug"),
            CliLogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_lands_in_nested_directory() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("logs").join("today");

        let path = open_log_file(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(path, nested.join(LOG_FILE_NAME));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(CliLogLevel::Warn.as_tracing_level(), Level::WARN);
        assert_eq!(CliLogLevel::Trace.to_string(), "trace");
    }
}
