use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the filter: `RUST_LOG` wins, otherwise `default_level` for every
/// target with the workspace crates at least as verbose.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{default_level},cryptodevs_app={default_level},cryptodevs_dapp={default_level},cryptodevs_chain={default_level}"
        ))
    })
}

/// Initializes file + console logging. The console layer writes to stderr
/// so stdout stays free for the page and for the deployed address.
///
/// Returns a guard that must be kept alive for the duration of the process.
pub fn init_logging(logs_dir: &Path, default_level: &str, file_prefix: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    // File appender: daily rotation
    let file_appender = tracing_appender::rolling::daily(logs_dir, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// File-only logging, for the interactive page where console output would
/// interleave with the rendered screen.
pub fn init_file_logging(logs_dir: &Path, default_level: &str, file_prefix: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_creates_directory() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let logs_dir = tmp.path().join("nested").join("logs");
        assert!(!logs_dir.exists());

        // Only one global subscriber can be installed per process, so the
        // result may be an error; the directory is created either way.
        let result = init_logging(&logs_dir, "warn", "test");
        assert!(logs_dir.exists());
        drop(result);
    }

    #[test]
    fn second_init_reports_logging_error() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let first = init_file_logging(&tmp.path().join("a"), "info", "test");
        let second = init_file_logging(&tmp.path().join("b"), "info", "test");

        // At most one of the two can own the global subscriber.
        assert!(first.is_err() || second.is_err());
        if let Err(e) = second {
            assert!(e.to_string().contains("logging"), "unexpected error: {e}");
        }
    }

    #[test]
    fn env_filter_accepts_levels() {
        for level in ["info", "debug", "warn", "trace"] {
            drop(env_filter(level));
        }
    }
}
