//! File-backed pin history.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};

use super::{DEFAULT_RETENTION_HOURS, HistoryRecord, decode, encode, hours, prune, recently_pinned};
use crate::error::{CollexionsError, Result};

/// Pin history persisted as a single JSON file.
///
/// Saves go through a temp file and a rename so a crash mid-write leaves the
/// previous file intact. A store opened with [`HistoryStore::open_read_only`]
/// never touches the file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    records: Vec<HistoryRecord>,
    retention: Duration,
    read_only: bool,
}

/// What was found on disk.
#[derive(Debug, Default)]
struct Contents {
    records: Vec<HistoryRecord>,
    dropped: usize,
    corrupt: bool,
}

impl HistoryStore {
    /// Open the store, loading whatever is on disk.
    ///
    /// If malformed entries had to be dropped the cleaned history is written
    /// back immediately. A file that is not JSON at all is moved aside to
    /// `<name>.json.corrupt` and the store starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = Self::read(&path)?;

        if contents.corrupt {
            let backup = path.with_extension("json.corrupt");
            log::warn!("Moving unreadable pin history {} to {}", path.display(), backup.display());
            fs::rename(&path, &backup)?;
        }

        let store = Self::with_records(path, contents.records, false);

        if contents.dropped > 0 {
            log::warn!(
                "Dropped {} malformed pin history entries, rewriting {}",
                contents.dropped,
                store.path.display()
            );
            store.save()?;
        }

        Ok(store)
    }

    /// Open the store for inspection. Malformed or unreadable history is
    /// skipped in memory and the file is left exactly as it is.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = Self::read(&path)?;
        Ok(Self::with_records(path, contents.records, true))
    }

    fn with_records(path: PathBuf, records: Vec<HistoryRecord>, read_only: bool) -> Self {
        Self {
            path,
            records,
            retention: hours(DEFAULT_RETENTION_HOURS),
            read_only,
        }
    }

    /// Set how long records are kept on disk.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Read the records stored at `path`, skipping malformed entries.
    ///
    /// Never writes to or moves the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<HistoryRecord>> {
        Self::read(path.as_ref()).map(|contents| contents.records)
    }

    fn read(path: &Path) -> Result<Contents> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Contents::default()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Contents::default());
        }

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value) => {
                let (records, dropped) = decode(value);
                Ok(Contents {
                    records,
                    dropped,
                    corrupt: false,
                })
            }
            Err(e) => {
                log::warn!("Pin history {} is not valid JSON ({}), ignoring it", path.display(), e);
                Ok(Contents {
                    corrupt: true,
                    ..Contents::default()
                })
            }
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Titles pinned within `cooldown` of `now`.
    ///
    /// Records older than the retention window (never shorter than the
    /// cool-down) are evicted and the file rewritten when anything was removed.
    pub fn recently_pinned(&mut self, cooldown: Duration, now: NaiveDateTime) -> Result<HashSet<String>> {
        let before = self.records.len();
        let records = std::mem::take(&mut self.records);
        self.records = prune(records, self.retention.max(cooldown), now);

        if self.records.len() != before {
            log::info!("Pruned {} expired pin history entries", before - self.records.len());
            if !self.read_only {
                self.save()?;
            }
        }

        Ok(recently_pinned(&self.records, cooldown, now))
    }

    /// Append the titles pinned at `timestamp` and persist.
    ///
    /// Nothing is written when `titles` is empty.
    pub fn record(&mut self, timestamp: NaiveDateTime, titles: Vec<String>) -> Result<()> {
        if titles.is_empty() {
            return Ok(());
        }
        self.records.push(HistoryRecord::new(timestamp, titles));
        self.records.sort_by_key(|r| r.timestamp);
        self.save()
    }

    /// Replace all records and persist.
    pub fn replace(&mut self, records: Vec<HistoryRecord>) -> Result<()> {
        self.records = records;
        self.records.sort_by_key(|r| r.timestamp);
        self.save()
    }

    /// Write the history file atomically.
    pub fn save(&self) -> Result<()> {
        if self.read_only {
            return Err(CollexionsError::History(format!(
                "{} was opened read-only",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&encode(&self.records))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            CollexionsError::History(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        log::debug!("Saved {} pin history entries to {}", self.records.len(), self.path.display());
        Ok(())
    }
}
