use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::io::recovery::atomic_write;

/// The single global timer, persisted to `timer_state.json`.
///
/// All three fields are set while a timer runs and all are `None` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TimerState {
    #[serde(default)]
    pub active_task_index: Option<usize>,
    /// ISO `YYYY-MM-DD` of the day holding the running task
    #[serde(default)]
    pub active_task_date: Option<String>,
    /// ISO-8601 start time
    #[serde(default)]
    pub timer_start_timestamp: Option<String>,
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        self.active_task_index.is_some()
            && self.active_task_date.is_some()
            && self.timer_start_timestamp.is_some()
    }

    pub fn clear(&mut self) {
        *self = TimerState::default();
    }

    /// Either fully idle, or running on a readable date
    fn is_consistent(&self) -> bool {
        if *self == TimerState::default() {
            return true;
        }
        self.is_running()
            && self
                .active_task_date
                .as_deref()
                .is_some_and(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
    }
}

/// Read the timer state. A missing or corrupt file gives an idle state, and
/// so does a half-written one (some fields set, others null, or a bad date).
pub fn read_timer_state(path: &Path) -> TimerState {
    let Ok(content) = fs::read_to_string(path) else {
        return TimerState::default();
    };
    match serde_json::from_str::<TimerState>(&content) {
        Ok(state) if state.is_consistent() => state,
        Ok(state) => {
            warn!(path = %path.display(), ?state, "incomplete timer state; treating timer as stopped");
            TimerState::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt timer state; treating timer as stopped");
            TimerState::default()
        }
    }
}

/// Write the timer state, creating the state directory if needed
pub fn write_timer_state(path: &Path, state: &TimerState) -> Result<(), std::io::Error> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(path, content.as_bytes())
}
