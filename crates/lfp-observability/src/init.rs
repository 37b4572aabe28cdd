// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging is always available. With the `file-logging` feature,
//! `init_logging` also writes JSON logs into a timestamped run folder and
//! prunes old runs.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

/// Build the env filter for a config and a set of debug flags
///
/// `RUST_LOG`, when set, takes precedence over both.
pub fn build_env_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(debug_flags.to_filter_string_with_base(&config.level)))
}

/// Initialize console-only logging
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(debug_flags, config);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        #[cfg(feature = "file-logging")]
        LogFormat::Json => builder.json().try_init(),
        #[cfg(not(feature = "file-logging"))]
        LogFormat::Json => builder.try_init(),
    };

    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(feature = "file-logging")]
pub use file::{init_logging, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use super::*;
    use anyhow::Context;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use std::path::{Path, PathBuf};
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{Layer, Registry};

    const RUN_PREFIX: &str = "run_";
    const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Keeps the non-blocking writers alive; logs are flushed on drop
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Get the run folder path
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize console logging plus a combined JSON log file
    ///
    /// Creates `<log_dir>/run_YYYYmmdd_HHMMSS/lfp.log` and prunes old runs
    /// according to the retention settings.
    pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
        let base_log_dir = config
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("./logs"));

        let timestamp = Utc::now().format(RUN_TIMESTAMP_FORMAT);
        let run_folder = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(&base_log_dir, config.retention_days, config.retention_runs)?;

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(config.with_target)
            .with_writer(std::io::stderr)
            .with_filter(build_env_filter(debug_flags, config))
            .boxed();

        let appender = rolling::daily(&run_folder, "lfp.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(build_env_filter(debug_flags, config))
            .boxed();

        Registry::default()
            .with(vec![console_layer, file_layer])
            .try_init()
            .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

        Ok(LoggingGuard {
            _file_guards: vec![guard],
            log_dir: run_folder,
        })
    }

    /// Remove run folders older than `retention_days`, then keep at most
    /// `retention_runs` of the remaining ones
    pub(crate) fn cleanup_old_logs(
        base_log_dir: &Path,
        retention_days: u64,
        retention_runs: usize,
    ) -> Result<()> {
        if !base_log_dir.exists() {
            return Ok(());
        }

        let cutoff_date = Utc::now() - chrono::Duration::days(retention_days as i64);
        let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();

        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(stamp) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(RUN_PREFIX))
            else {
                continue;
            };
            if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT) {
                runs.push((path, naive.and_utc()));
            }
        }

        // Oldest first
        runs.sort_by_key(|(_, dt)| *dt);

        let (expired, kept): (Vec<_>, Vec<_>) = runs.into_iter().partition(|(_, dt)| *dt < cutoff_date);
        let surplus = kept.len().saturating_sub(retention_runs);

        for (path, _) in expired.iter().chain(kept.iter().take(surplus)) {
            if let Err(e) = std::fs::remove_dir_all(path) {
                eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tempfile::tempdir;

        #[test]
        fn test_cleanup_keeps_most_recent_runs() {
            let dir = tempdir().unwrap();
            let now = Utc::now();
            for minutes in 0..5 {
                let stamp = (now - chrono::Duration::minutes(minutes)).format(RUN_TIMESTAMP_FORMAT);
                std::fs::create_dir_all(dir.path().join(format!("run_{}", stamp))).unwrap();
            }
            std::fs::create_dir_all(dir.path().join("not_a_run")).unwrap();

            cleanup_old_logs(dir.path(), 30, 2).unwrap();

            let remaining: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .filter(|n| n.starts_with("run_"))
                .collect();
            assert_eq!(remaining.len(), 2);
            assert!(dir.path().join("not_a_run").exists());
        }

        #[test]
        fn test_cleanup_removes_expired_runs() {
            let dir = tempdir().unwrap();
            let old = (Utc::now() - chrono::Duration::days(40)).format(RUN_TIMESTAMP_FORMAT);
            let old_path = dir.path().join(format!("run_{}", old));
            std::fs::create_dir_all(&old_path).unwrap();

            cleanup_old_logs(dir.path(), 30, 10).unwrap();
            assert!(!old_path.exists());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builds_for_every_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-lfp-detector".to_string()]);
        for level in ["trace", "debug", "info", "warn", "error"] {
            let filter = build_env_filter(&flags, &LoggingConfig::with_level(level));
            assert!(!filter.to_string().is_empty());
        }
    }
}
