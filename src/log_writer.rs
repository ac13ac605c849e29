//! Flat text dump of a [`ResultRecorder`].
//!
//! Each entry becomes three lines: the key, the value (`None` when the
//! command printed nothing), and a blank separator. Nothing is escaped.
//!
//! ```text
//! invader29 2026101612:00:01 redis-cli hget platina-mk1 vnet.pollInterval
//! 2.000000
//!
//! result.status
//! Passed
//!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::recorder::{display_value, ResultRecorder};

/// How the log file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Add to the end of an existing file
    Append,
    /// Truncate any existing file first
    Overwrite,
    /// Do not write a log file
    Skip,
}

impl LogMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogMode::Append => "append",
            LogMode::Overwrite => "overwrite",
            LogMode::Skip => "skip",
        }
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "append" | "a" => Ok(LogMode::Append),
            "overwrite" | "w" | "truncate" => Ok(LogMode::Overwrite),
            "skip" | "none" | "off" => Ok(LogMode::Skip),
            other => Err(format!(
                "invalid log mode '{}', expected append, overwrite or skip",
                other
            )),
        }
    }
}

/// Path of the log file for `hash_name` inside `log_dir_path`.
pub fn log_file_path(log_dir_path: impl AsRef<Path>, hash_name: &str) -> PathBuf {
    log_dir_path.as_ref().join(format!("{}.log", hash_name))
}

/// Writes recorder contents to a log file.
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
    mode: LogMode,
}

impl LogWriter {
    pub fn new(path: impl Into<PathBuf>, mode: LogMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every entry of `recorder` to the log file.
    ///
    /// Returns `false` without touching the filesystem in [`LogMode::Skip`].
    pub fn write(&self, recorder: &ResultRecorder) -> io::Result<bool> {
        if self.mode == LogMode::Skip {
            debug!(path = %self.path.display(), "log writing skipped");
            return Ok(false);
        }

        let append = self.mode == LogMode::Append;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        render(recorder, &mut writer)?;
        writer.flush()?;

        debug!(
            path = %self.path.display(),
            mode = %self.mode,
            entries = recorder.len(),
            "log written"
        );
        Ok(true)
    }
}

/// Render `recorder` in log format into `out`.
pub fn render(recorder: &ResultRecorder, out: &mut impl Write) -> io::Result<()> {
    for (key, value) in recorder.iter() {
        out.write_all(key.as_bytes())?;
        out.write_all(b"\n")?;
        out.write_all(display_value(value).as_bytes())?;
        out.write_all(b"\n")?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
