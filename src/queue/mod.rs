
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::core::models::QueueEntry;
use crate::errors::QueueError;
use crate::extensions::chrono::NaiveDateExt;

pub const QUEUE_SUFFIX: &str = "_imaging_queue.json";

/// Name of one night's queue: `<dir>/<prefix><YYYY-MM-DD>_imaging_queue.json`,
/// dated by the site-local date on which that night begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFile {
    dir: PathBuf,
    prefix: String,
    date: NaiveDate,
}

impl QueueFile {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            date,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn file_name(&self) -> String {
        format!("{}{}{}", self.prefix, self.date.format("%Y-%m-%d"), QUEUE_SUFFIX)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(self.file_name())
    }

    /// The same queue one calendar day later.
    pub fn next(&self) -> Self {
        self.on(self.date.next_day())
    }

    /// The same queue for another night.
    pub fn on(&self, date: NaiveDate) -> Self {
        Self {
            dir: self.dir.clone(),
            prefix: self.prefix.clone(),
            date,
        }
    }
}

/// Append-only writer for the active queue file.
///
/// Only the server holds one of these. Opening never truncates, so a
/// restarted server keeps the entries already admitted tonight.
#[derive(Debug)]
pub struct QueueStore {
    file: QueueFile,
    handle: File,
}

impl QueueStore {
    pub fn open(file: QueueFile) -> Result<Self, QueueError> {
        let path = file.path();
        let open_err = |source| QueueError::Open {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&file.dir).map_err(open_err)?;
        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;
        Ok(Self { file, handle })
    }

    pub fn file(&self) -> &QueueFile {
        &self.file
    }

    pub fn path(&self) -> PathBuf {
        self.file.path()
    }

    /// Writes `entry` as one line and flushes it to disk.
    pub fn append(&mut self, entry: &QueueEntry) -> Result<(), QueueError> {
        let line = serde_json::to_string(entry)
            .map_err(|e| QueueError::InvalidEntry(e.to_string()))?;
        writeln!(self.handle, "{line}")?;
        self.handle.flush()?;
        Ok(())
    }

    /// Switches to the file for `night` and returns it.
    pub fn rotate_to(&mut self, night: NaiveDate) -> Result<&QueueFile, QueueError> {
        *self = Self::open(self.file.on(night))?;
        Ok(&self.file)
    }
}

/// Reads every entry of a completed queue file, in admission order.
///
/// Blank lines are ignored. The first malformed line fails the whole load.
pub fn load(path: &Path) -> Result<Vec<QueueEntry>, QueueError> {
    let file = File::open(path).map_err(|source| QueueError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: QueueEntry =
            serde_json::from_str(&line).map_err(|source| QueueError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
        entries.push(entry);
    }
    Ok(entries)
}
