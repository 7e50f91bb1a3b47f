//! File logging. The terminal belongs to the TUI, so events go to a file
//! through a non-blocking writer.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::profiles::config_dir;

pub const FILTER_ENV: &str = "IDSTOP_LOG";
const DEFAULT_FILTER: &str = "idstop=info";
const DEFAULT_FILE: &str = "idstop.log";

pub fn default_log_path() -> PathBuf {
    config_dir().join(DEFAULT_FILE)
}

/// Splits a log path into the directory and file name the appender wants.
/// A bare file name logs into the working directory.
pub fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file = path.file_name().unwrap_or(OsStr::new(DEFAULT_FILE));
    (dir.to_path_buf(), PathBuf::from(file))
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// life of the program; dropping it flushes and stops the writer thread.
pub fn init(path: Option<PathBuf>) -> anyhow::Result<(PathBuf, WorkerGuard)> {
    let path = path.unwrap_or_else(default_log_path);
    let (dir, file) = split_log_path(&path);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&dir, &file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("installing tracing subscriber")?;

    Ok((dir.join(file), guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_splits_into_dir_and_file() {
        let (dir, file) = split_log_path(Path::new("/var/log/idstop/run.log"));
        assert_eq!(dir, PathBuf::from("/var/log/idstop"));
        assert_eq!(file, PathBuf::from("run.log"));
    }

    #[test]
    fn bare_file_name_logs_to_working_dir() {
        let (dir, file) = split_log_path(Path::new("idstop.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, PathBuf::from("idstop.log"));
    }
}
