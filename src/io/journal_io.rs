use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::io::recovery::{RecoveryEntry, atomic_write, log_recovery};
use crate::model::DayList;
use crate::ops::TaskError;
use crate::parse::{parse_day, serialize_day};

/// Error type for journal I/O
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// The directory of `YYYY-MM-DD.md` day files
#[derive(Debug, Clone)]
pub struct JournalStore {
    base_dir: PathBuf,
}

impl JournalStore {
    /// Open (creating if needed) the journal directory
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| JournalError::Write {
            path: base_dir.clone(),
            source: e,
        })?;
        Ok(JournalStore { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<base_dir>/YYYY-MM-DD.md`
    pub fn get_file_path(&self, date: NaiveDate) -> PathBuf {
        self.base_dir.join(format!("{}.md", date.format("%Y-%m-%d")))
    }

    pub fn day_exists(&self, date: NaiveDate) -> bool {
        self.get_file_path(date).is_file()
    }

    /// Last modification time of the day file, if it exists
    pub fn modified_time(&self, date: NaiveDate) -> Option<SystemTime> {
        fs::metadata(self.get_file_path(date))
            .and_then(|m| m.modified())
            .ok()
    }

    /// Load a day. A missing or unreadable file gives an empty list.
    pub fn load_day(&self, date: NaiveDate) -> DayList {
        let path = self.get_file_path(date);
        if !path.exists() {
            return DayList::new(date);
        }
        match fs::read_to_string(&path) {
            Ok(text) => parse_day(&text, date),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read day file; using empty list");
                DayList::new(date)
            }
        }
    }

    /// Save a day atomically. On failure the markdown is appended to the
    /// recovery log and the error is returned.
    pub fn save_day(&self, list: &DayList) -> Result<(), JournalError> {
        let path = self.get_file_path(list.date);
        let content = serialize_day(list);
        if let Err(e) = atomic_write(&path, content.as_bytes()) {
            log_recovery(
                &self.base_dir,
                RecoveryEntry {
                    timestamp: Utc::now(),
                    description: "day write failed".to_string(),
                    fields: vec![
                        ("Target".to_string(), path.display().to_string()),
                        ("Error".to_string(), e.to_string()),
                    ],
                    body: content,
                },
            );
            return Err(JournalError::Write { path, source: e });
        }
        debug!(date = %list.date, entries = list.len(), "saved day");
        Ok(())
    }
}
