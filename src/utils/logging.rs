//! Diagnostic logging setup.
//!
//! The full-screen UI owns the terminal, so interactive sessions only log
//! when a file is given with `--log`. One-shot commands log warnings to
//! stderr instead.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "PARLANCE_LOG";
const DEFAULT_FILE_FILTER: &str = "parlance=info";
const DEFAULT_STDERR_FILTER: &str = "parlance=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
    Disabled,
}

pub fn init_logging(target: LogTarget<'_>) -> Result<(), Box<dyn Error>> {
    let from_env = std::env::var(LOG_FILTER_ENV).ok();
    match target {
        LogTarget::Disabled => Ok(()),
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(from_env.as_deref(), DEFAULT_STDERR_FILTER))
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| format!("Failed to initialize logging: {e}"))?;
            Ok(())
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Cannot open log file {}: {e}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(from_env.as_deref(), DEFAULT_FILE_FILTER))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| format!("Failed to initialize logging: {e}"))?;
            tracing::info!("parlance {} logging started", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Parse `directive`, falling back to `default` when it is absent or invalid.
pub fn build_filter(directive: Option<&str>, default: &str) -> EnvFilter {
    directive
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_filter_prefers_valid_directive() {
        let filter = build_filter(Some("parlance=debug"), DEFAULT_FILE_FILTER);
        assert_eq!(filter.to_string(), "parlance=debug");
    }

    #[test]
    fn build_filter_falls_back_on_blank_or_invalid() {
        assert_eq!(
            build_filter(None, DEFAULT_FILE_FILTER).to_string(),
            DEFAULT_FILE_FILTER
        );
        assert_eq!(
            build_filter(Some("   "), DEFAULT_STDERR_FILTER).to_string(),
            DEFAULT_STDERR_FILTER
        );
        assert_eq!(
            build_filter(Some("parlance=verbose"), DEFAULT_FILE_FILTER).to_string(),
            DEFAULT_FILE_FILTER
        );
    }

    #[test]
    fn unwritable_log_path_is_an_error() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let missing = temp_dir.path().join("no-such-dir").join("log.txt");
        let err = init_logging(LogTarget::File(&missing)).expect_err("should fail");
        assert!(err.to_string().contains("Cannot open log file"));
    }

    #[test]
    fn disabled_logging_is_a_noop() {
        assert!(init_logging(LogTarget::Disabled).is_ok());
    }
}
