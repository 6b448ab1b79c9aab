//! The single global timer.
//!
//! Idle when no task is tracked; Running when the persisted index, date and
//! start timestamp all refer to one task in one day. The running task also
//! carries `timer_start` in memory, restored by [`TimeTracker::sync_timer_with_task_list`]
//! whenever its day is (re)loaded, since day files never store timers.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use tracing::{debug, warn};

use crate::io::timer_state::{TimerState, read_timer_state, write_timer_state};
use crate::model::{DayList, Task};
use crate::ops::hierarchy::get_task_group;

#[derive(Debug, Clone, Default)]
pub struct TimeTracker {
    state: TimerState,
    /// Where the state is persisted; `None` keeps it in memory only
    path: Option<PathBuf>,
}

impl TimeTracker {
    /// A tracker that never touches disk
    pub fn in_memory() -> Self {
        TimeTracker::default()
    }

    /// Load the persisted timer state at `path` (idle if missing or corrupt)
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = read_timer_state(&path);
        TimeTracker {
            state,
            path: Some(path),
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// True while any timer runs, on any date
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.active_task_index
    }

    /// Date of the day holding the running timer
    pub fn active_date(&self) -> Option<NaiveDate> {
        self.state
            .active_task_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// True if the running timer is on `index` of `list`
    pub fn is_timer_running(&self, list: &DayList, index: usize) -> bool {
        self.state.active_task_index == Some(index) && self.tracks_date(list)
    }

    fn tracks_date(&self, list: &DayList) -> bool {
        self.state.active_task_date.as_deref() == Some(list.date_key().as_str())
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_timer_state(path, &self.state) {
            warn!(path = %path.display(), error = %e, "could not persist timer state");
        }
    }

    fn reset(&mut self) {
        self.state.clear();
        self.persist();
    }

    /// Start timing `index`. Any timer already running on this day is stopped
    /// first. Returns false for an out-of-range index or a divider.
    pub fn start_timer(&mut self, list: &mut DayList, index: usize) -> bool {
        if list.task(index).is_none() {
            return false;
        }

        if self.is_running() {
            if self.tracks_date(list) {
                self.stop_timer(list);
            } else {
                // Callers that care about the elapsed time stop it on its own
                // day before getting here.
                warn!(
                    date = ?self.state.active_task_date,
                    "discarding timer running on another day"
                );
                self.state.clear();
            }
        }

        let now = Local::now();
        if let Some(task) = list.task_mut(index) {
            task.timer_start = Some(now);
        }
        self.state = TimerState {
            active_task_index: Some(index),
            active_task_date: Some(list.date_key()),
            timer_start_timestamp: Some(now.to_rfc3339()),
        };
        self.persist();
        debug!(index, date = %list.date, "timer started");
        true
    }

    /// Stop the running timer and add the elapsed whole seconds to the task.
    /// Returns the seconds added (0 when idle, or when the state no longer
    /// matches the list, in which case it is cleared).
    pub fn stop_timer(&mut self, list: &mut DayList) -> u64 {
        let Some(index) = self.state.active_task_index else {
            return 0;
        };
        if !self.is_running() || !self.tracks_date(list) {
            return 0;
        }

        let Some(task) = list.task_mut(index).filter(|t| t.timer_start.is_some()) else {
            self.reset();
            return 0;
        };

        let elapsed = TimeTracker::get_elapsed_seconds(task);
        task.actual_seconds = task.actual_seconds.saturating_add(elapsed);
        task.timer_start = None;
        self.reset();
        debug!(index, elapsed, "timer stopped");
        elapsed
    }

    /// Stop if `index` is being timed, otherwise start it.
    /// Returns `(now_running, seconds_added)`.
    pub fn toggle_timer(&mut self, list: &mut DayList, index: usize) -> (bool, u64) {
        if self.is_timer_running(list, index) {
            let seconds = self.stop_timer(list);
            return (false, seconds);
        }
        let started = self.start_timer(list, index);
        (started, 0)
    }

    /// Cancel the running timer without adding time. Returns whether a timer
    /// was actually cleared.
    pub fn clear_timer(&mut self, list: &mut DayList) -> bool {
        let Some(index) = self.state.active_task_index else {
            return false;
        };
        if !self.is_running() || !self.tracks_date(list) {
            return false;
        }

        let cleared = match list.task_mut(index) {
            Some(task) if task.timer_start.is_some() => {
                task.timer_start = None;
                true
            }
            _ => false,
        };
        self.reset();
        cleared
    }

    /// Restore the running task's `timer_start` on a freshly loaded list.
    ///
    /// Does nothing when idle or when the timer belongs to another day. A bad
    /// index or unreadable timestamp clears the persisted state.
    pub fn sync_timer_with_task_list(&mut self, list: &mut DayList) {
        if !self.state.is_running() || !self.tracks_date(list) {
            return;
        }
        let Some(index) = self.state.active_task_index else {
            return;
        };

        let date = list.date;
        let start = self
            .state
            .timer_start_timestamp
            .as_deref()
            .and_then(parse_timestamp);

        match (list.task_mut(index), start) {
            (Some(task), Some(start)) => task.timer_start = Some(start),
            (None, _) => {
                warn!(index, date = %date, "timer points at a missing task; clearing");
                self.reset();
            }
            (Some(_), None) => {
                warn!(
                    timestamp = ?self.state.timer_start_timestamp,
                    "unreadable timer start; clearing"
                );
                self.reset();
            }
        }
    }

    /// Re-point the persisted index at the task carrying `timer_start` after
    /// entries were inserted, deleted or moved.
    pub fn follow_running_task(&mut self, list: &DayList) {
        if !self.tracks_date(list) {
            return;
        }
        let found = list
            .entries
            .iter()
            .position(|e| e.as_task().is_some_and(Task::is_timer_running));
        if let Some(index) = found {
            if self.state.active_task_index != Some(index) {
                self.state.active_task_index = Some(index);
                self.persist();
            }
        }
    }

    /// Whole seconds since the task's timer started (0 if not running)
    pub fn get_elapsed_seconds(task: &Task) -> u64 {
        task.timer_start.map_or(0, |start| {
            Local::now()
                .signed_duration_since(start)
                .num_seconds()
                .max(0) as u64
        })
    }

    /// Add (or with a negative delta, subtract) tracked time, clamped at zero
    pub fn add_manual_time(task: &mut Task, delta_seconds: i64) {
        let total = i128::from(task.actual_seconds) + i128::from(delta_seconds);
        task.actual_seconds = u64::try_from(total.max(0)).unwrap_or(u64::MAX);
    }

    /// `(estimate, actual)` for the group rooted at `index`.
    ///
    /// A leaf reports its own fields. A group sums actual time (including live
    /// elapsed time) over all member tasks, and reports an estimate only when
    /// every member task has one.
    pub fn get_aggregated_time(list: &DayList, index: usize) -> (Option<u64>, u64) {
        if index >= list.len() {
            return (None, 0);
        }
        let (start, end) = get_task_group(&list.entries, index);
        if start == end {
            return list
                .task(index)
                .map_or((None, 0), |t| (t.estimated_seconds, t.actual_seconds));
        }

        let mut estimate = Some(0u64);
        let mut actual = 0u64;
        for task in list.entries[start..=end].iter().filter_map(|e| e.as_task()) {
            estimate = estimate.zip(task.estimated_seconds).map(|(a, b)| a.saturating_add(b));
            actual = actual
                .saturating_add(task.actual_seconds)
                .saturating_add(TimeTracker::get_elapsed_seconds(task));
        }
        (estimate, actual)
    }
}

/// RFC 3339 with offset, or a naive ISO timestamp taken as local time
fn parse_timestamp(s: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;
    use chrono::Duration;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn list_of(names: &[&str]) -> DayList {
        let mut list = DayList::new(date());
        for name in names {
            list.entries.push(Entry::task(*name, 0));
        }
        list
    }

    fn backdate(list: &mut DayList, index: usize, seconds: i64) {
        list.task_mut(index).unwrap().timer_start = Some(Local::now() - Duration::seconds(seconds));
    }

    #[test]
    fn start_and_stop_accumulates() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A"]);
        assert!(tracker.start_timer(&mut list, 0));
        assert!(tracker.is_timer_running(&list, 0));
        assert!(list.task(0).unwrap().is_timer_running());

        backdate(&mut list, 0, 90);
        let added = tracker.stop_timer(&mut list);
        assert!((90..95).contains(&added));
        let task = list.task(0).unwrap();
        assert_eq!(task.actual_seconds, added);
        assert!(task.timer_start.is_none());
        assert!(!tracker.is_running());
    }

    #[test]
    fn start_rejects_bad_index_and_dividers() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A"]);
        list.entries.push(Entry::divider(None, 0));
        assert!(!tracker.start_timer(&mut list, 5));
        assert!(!tracker.start_timer(&mut list, 1));
        assert!(!tracker.is_running());
    }

    #[test]
    fn starting_another_task_stops_the_first() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A", "B"]);
        tracker.start_timer(&mut list, 0);
        backdate(&mut list, 0, 30);

        assert!(tracker.start_timer(&mut list, 1));
        let a = list.task(0).unwrap();
        assert!(a.timer_start.is_none());
        assert!(a.actual_seconds >= 30);
        assert!(list.task(1).unwrap().is_timer_running());
        assert_eq!(tracker.active_index(), Some(1));
    }

    #[test]
    fn stop_when_idle_is_zero() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A"]);
        assert_eq!(tracker.stop_timer(&mut list), 0);
    }

    #[test]
    fn stop_self_heals_missing_timer_start() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A"]);
        tracker.start_timer(&mut list, 0);
        list.task_mut(0).unwrap().timer_start = None;
        assert_eq!(tracker.stop_timer(&mut list), 0);
        assert!(!tracker.is_running());
        assert_eq!(list.task(0).unwrap().actual_seconds, 0);
    }

    #[test]
    fn stop_self_heals_bad_index() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A", "B"]);
        tracker.start_timer(&mut list, 1);
        list.entries.truncate(1);
        assert_eq!(tracker.stop_timer(&mut list), 0);
        assert_eq!(tracker.state(), &TimerState::default());
    }

    #[test]
    fn toggle_starts_then_stops() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A"]);
        assert_eq!(tracker.toggle_timer(&mut list, 0), (true, 0));
        let (running, _) = tracker.toggle_timer(&mut list, 0);
        assert!(!running);
        assert!(!tracker.is_running());
    }

    #[test]
    fn clear_discards_elapsed_time() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A"]);
        assert!(!tracker.clear_timer(&mut list));
        tracker.start_timer(&mut list, 0);
        backdate(&mut list, 0, 120);
        assert!(tracker.clear_timer(&mut list));
        assert_eq!(list.task(0).unwrap().actual_seconds, 0);
        assert!(list.task(0).unwrap().timer_start.is_none());
        assert!(!tracker.is_running());
    }

    #[test]
    fn state_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timer_state.json");
        let mut list = list_of(&["A", "B"]);
        {
            let mut tracker = TimeTracker::load(&path);
            tracker.start_timer(&mut list, 1);
        }

        // Fresh process: a reloaded list knows nothing about the timer
        let mut reloaded = list_of(&["A", "B"]);
        let mut tracker = TimeTracker::load(&path);
        assert_eq!(tracker.active_index(), Some(1));
        assert_eq!(tracker.active_date(), Some(date()));
        tracker.sync_timer_with_task_list(&mut reloaded);
        assert_eq!(
            reloaded.task(1).unwrap().timer_start.map(|t| t.timestamp()),
            list.task(1).unwrap().timer_start.map(|t| t.timestamp())
        );
        assert!(tracker.stop_timer(&mut reloaded) < 5);
        assert!(!TimeTracker::load(&path).is_running());
    }

    #[test]
    fn partial_persisted_state_is_idle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timer_state.json");
        std::fs::write(
            &path,
            r#"{"active_task_index": 0, "active_task_date": null, "timer_start_timestamp": null}"#,
        )
        .unwrap();

        let mut list = list_of(&["A"]);
        let mut tracker = TimeTracker::load(&path);
        tracker.sync_timer_with_task_list(&mut list);
        assert!(!tracker.is_running());
        assert_eq!(tracker.stop_timer(&mut list), 0);
        assert!(!tracker.clear_timer(&mut list));
        assert!(tracker.start_timer(&mut list, 0));
        assert!(tracker.is_running());
    }

    #[test]
    fn partial_in_memory_state_does_not_count_as_running() {
        let mut list = list_of(&["A"]);
        let mut tracker = TimeTracker::in_memory();
        tracker.state.active_task_index = Some(0);
        assert!(!tracker.is_running());
        assert_eq!(tracker.stop_timer(&mut list), 0);
        assert!(!tracker.clear_timer(&mut list));
    }

    #[test]
    fn sync_ignores_other_days() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A"]);
        tracker.start_timer(&mut list, 0);

        let mut other = DayList::new(date().succ_opt().unwrap());
        other.entries.push(Entry::task("X", 0));
        tracker.sync_timer_with_task_list(&mut other);
        assert!(other.task(0).unwrap().timer_start.is_none());
        assert!(tracker.is_running());
        assert_eq!(tracker.stop_timer(&mut other), 0);
        assert!(tracker.is_running());
    }

    #[test]
    fn sync_clears_out_of_range_index() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A", "B"]);
        tracker.start_timer(&mut list, 1);
        let mut shorter = list_of(&["A"]);
        tracker.sync_timer_with_task_list(&mut shorter);
        assert!(!tracker.is_running());
    }

    #[test]
    fn sync_clears_bad_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timer_state.json");
        let state = TimerState {
            active_task_index: Some(0),
            active_task_date: Some("2025-01-15".into()),
            timer_start_timestamp: Some("yesterday-ish".into()),
        };
        write_timer_state(&path, &state).unwrap();

        let mut tracker = TimeTracker::load(&path);
        let mut list = list_of(&["A"]);
        tracker.sync_timer_with_task_list(&mut list);
        assert!(list.task(0).unwrap().timer_start.is_none());
        assert!(!tracker.is_running());
        assert!(!read_timer_state(&path).is_running());
    }

    #[test]
    fn naive_timestamps_are_local() {
        let parsed = parse_timestamp("2025-01-15T09:30:00.123456").unwrap();
        assert_eq!(parsed.naive_local().to_string(), "2025-01-15 09:30:00.123456");
        assert!(parse_timestamp("2025-01-15T09:30:00+00:00").is_some());
        assert!(parse_timestamp("garbage").is_none());
    }

    #[test]
    fn follow_running_task_after_insert() {
        let mut tracker = TimeTracker::in_memory();
        let mut list = list_of(&["A", "B"]);
        tracker.start_timer(&mut list, 1);
        list.entries.insert(0, Entry::task("New", 0));
        tracker.follow_running_task(&list);
        assert_eq!(tracker.active_index(), Some(2));
        assert!(tracker.is_timer_running(&list, 2));
    }

    #[test]
    fn manual_time_clamps_at_zero() {
        let mut task = Task::new("A");
        TimeTracker::add_manual_time(&mut task, 600);
        assert_eq!(task.actual_seconds, 600);
        TimeTracker::add_manual_time(&mut task, -60);
        assert_eq!(task.actual_seconds, 540);
        TimeTracker::add_manual_time(&mut task, -10_000);
        assert_eq!(task.actual_seconds, 0);
    }

    #[test]
    fn aggregated_time_for_leaf_and_group() {
        let mut list = DayList::new(date());
        let mut parent = Task::new("Parent");
        parent.estimated_seconds = Some(600);
        parent.actual_seconds = 60;
        let mut child = Task::new("Child");
        child.estimated_seconds = Some(300);
        child.actual_seconds = 120;
        list.entries.push(Entry::from_task(parent, 0));
        list.entries.push(Entry::from_task(child, 1));
        list.entries.push(Entry::task("Leaf", 0));

        assert_eq!(TimeTracker::get_aggregated_time(&list, 0), (Some(900), 180));
        assert_eq!(TimeTracker::get_aggregated_time(&list, 1), (Some(300), 120));
        assert_eq!(TimeTracker::get_aggregated_time(&list, 2), (None, 0));
        assert_eq!(TimeTracker::get_aggregated_time(&list, 9), (None, 0));

        // One unestimated member makes the group estimate unknown
        list.entries.insert(2, Entry::task("Unestimated", 1));
        assert_eq!(TimeTracker::get_aggregated_time(&list, 0), (None, 180));
    }

    #[test]
    fn aggregated_time_includes_running_timer() {
        let mut list = DayList::new(date());
        list.entries.push(Entry::task("Parent", 0));
        list.entries.push(Entry::task("Child", 1));
        backdate(&mut list, 1, 60);
        let (_, actual) = TimeTracker::get_aggregated_time(&list, 0);
        assert!((60..65).contains(&actual));
    }
}
