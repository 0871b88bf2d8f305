//! Logging Infrastructure
//!
//! Console output plus an optional daily rolling operator log
//! (`agent.YYYY-MM-DD`), removed after the configured retention.

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of the rolling log
pub const LOG_FILE_PREFIX: &str = "agent";

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level`. When `log_dir` is given, a
/// human-readable file layer is added; keep the returned guard alive for
/// as long as the process logs.
pub fn init_logger(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Delete rolling log files older than `retention_days`
///
/// Returns the number of files removed. Files not matching
/// `agent.YYYY-MM-DD` are left alone.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> anyhow::Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let days = i64::try_from(retention_days).unwrap_or(i64::MAX);
    let cutoff = Local::now().date_naive() - chrono::Duration::days(days.min(36_500));
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some(date_part) = name
            .strip_prefix(LOG_FILE_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            && let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_old_logs() {
        let dir = tempfile::tempdir().unwrap();
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

        fs::write(dir.path().join("agent.2000-01-01"), "old").unwrap();
        fs::write(dir.path().join(format!("agent.{}", today)), "new").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        fs::write(dir.path().join("agent.garbage"), "keep").unwrap();

        let removed = cleanup_old_logs(dir.path(), 14).unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("agent.2000-01-01").exists());
        assert!(dir.path().join(format!("agent.{}", today)).exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("agent.garbage").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_old_logs(&missing, 14).unwrap(), 0);
    }
}
