// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log setup for binaries. Libraries only emit `tracing` events; the
//! daemon and scope processes install a rolling file subscriber here.

use std::path::Path;

use scopes_core::{Error, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install a file subscriber writing `<prefix>.log` into the configured
/// log directory. Returns the guard that flushes buffered records; keep
/// it alive for the process lifetime.
pub fn init_logging(
    log_dir: &Path,
    prefix: &str,
    max_log_dir_size: u64,
) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        Error::ResourceError(format!("cannot create log directory {:?}: {}", log_dir.display(), e))
    })?;
    trim_log_dir(log_dir, max_log_dir_size);

    let appender = tracing_appender::rolling::daily(log_dir, format!("{}.log", prefix));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Delete the oldest log files until the directory fits the size bound.
fn trim_log_dir(log_dir: &Path, max_size: u64) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };
    let mut files: Vec<(std::time::SystemTime, std::path::PathBuf, u64)> = entries
        .flatten()
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            Some((meta.modified().ok()?, entry.path(), meta.len()))
        })
        .collect();
    let mut total: u64 = files.iter().map(|(_, _, len)| len).sum();
    files.sort_by_key(|(modified, _, _)| *modified);
    for (_, path, len) in files {
        if total <= max_size {
            break;
        }
        if std::fs::remove_file(&path).is_ok() {
            total = total.saturating_sub(len);
        }
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
