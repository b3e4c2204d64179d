//! User-facing output, optionally mirrored into a per-run log file.

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const LOG_DIR_NAME: &str = "logs";

/// `logs` next to the running executable, or in the working directory.
pub fn default_log_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(LOG_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(LOG_DIR_NAME))
}

pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("{}.log", started.format("%Y-%m-%d_%H-%M-%S"))
}

pub struct Console<W: Write> {
    out: W,
    mirror: Option<LogMirror>,
}

struct LogMirror {
    path: PathBuf,
    file: Option<File>,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out, mirror: None }
    }

    /// Mirror everything printed from now on into `{dir}/{started}.log`.
    pub fn with_log_dir(mut self, dir: &Path, started: DateTime<Local>) -> Self {
        self.mirror = Some(LogMirror {
            path: dir.join(log_file_name(started)),
            file: None,
        });
        self
    }

    /// Prints `text` without a trailing newline.
    pub fn write(&mut self, text: &str) {
        self.emit(text);
        self.mirror_text(text);
    }

    pub fn line(&mut self, text: &str) {
        self.write(&format!("{}\n", text));
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn mirror_text(&mut self, text: &str) {
        let Some(mirror) = self.mirror.as_mut() else {
            return;
        };

        if let Err(err) = mirror.append(text) {
            let message = format!(
                "Failed to write log file {}: {}\n",
                mirror.path.display(),
                err
            );
            warn!(path = %mirror.path.display(), %err, "disabling log mirror");
            self.mirror = None;
            self.emit(&message);
        }
    }

    /// Output is best-effort: a closed or full stdout is logged, not fatal.
    fn emit(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            warn!(%err, "console output failed");
        }
    }
}

impl LogMirror {
    fn append(&mut self, text: &str) -> io::Result<()> {
        if self.file.is_none() {
            if let Some(dir) = self.path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }

        match self.file.as_mut() {
            Some(file) => file.write_all(text.as_bytes()),
            None => Ok(()),
        }
    }
}
