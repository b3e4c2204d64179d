//! Last-run gate.
//!
//! A single timestamp is persisted after every rendered profile. A new run is
//! only allowed once `min_interval` has passed since that timestamp. Corrupt
//! or unreadable state counts as "never ran" so a damaged file cannot lock
//! the tool out.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

pub const DEFAULT_FILE_NAME: &str = "lastrun";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleStatus {
    Ready,
    Wait { remaining_secs: i64 },
}

#[derive(Debug, Error)]
#[error("could not write {}: {}", .path.display(), .source)]
pub struct ThrottleError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// `lastrun` next to the running executable, or in the working directory if
/// the executable cannot be located.
pub fn default_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME))
}

pub async fn check(path: &Path, clock: &impl Clock, min_interval: Duration) -> ThrottleStatus {
    let Some(last_run) = read_last_run(path).await else {
        return ThrottleStatus::Ready;
    };

    let elapsed = (clock.now() - last_run).num_seconds();
    let limit = min_interval.num_seconds();
    debug!(elapsed, limit, "compared against last run");

    if elapsed < limit {
        ThrottleStatus::Wait {
            remaining_secs: limit - elapsed,
        }
    } else {
        ThrottleStatus::Ready
    }
}

pub async fn record(path: &Path, clock: &impl Clock) -> Result<(), ThrottleError> {
    let now = clock.now();
    fs::write(path, now.format(TIMESTAMP_FORMAT).to_string())
        .await
        .map_err(|source| ThrottleError {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "recorded last run");
    Ok(())
}

async fn read_last_run(path: &Path) -> Option<DateTime<Local>> {
    if !path.exists() {
        return None;
    }

    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read last run file, ignoring it");
            return None;
        }
    };

    let parsed = parse_timestamp(content.trim());
    if parsed.is_none() {
        warn!(path = %path.display(), content = content.trim(), "unrecognised last run timestamp, ignoring it");
    }
    parsed
}

/// Accepts the format written by [`record`] and bare Unix seconds.
fn parse_timestamp(text: &str) -> Option<DateTime<Local>> {
    if let Ok(datetime) = DateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Some(datetime.with_timezone(&Local));
    }

    let seconds = text.parse::<i64>().ok()?;
    DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&Local))
}
