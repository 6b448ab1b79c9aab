//! The explicit context a front end drives: one day store, the single global
//! timer and the score history, plus the multi-step operations that have to
//! touch more than one of them in a fixed order.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::io::config_io::load_config;
use crate::io::{JournalError, JournalStore};
use crate::model::{DailyScore, DayList, JournalConfig};
use crate::ops::date_nav::{find_next_open_day, find_prev_open_day};
use crate::ops::hierarchy::get_task_group;
use crate::ops::task_ops::{self, TaskError};
use crate::ops::{ScoringSystem, TimeTracker};

pub struct Journal {
    config: JournalConfig,
    store: JournalStore,
    tracker: TimeTracker,
    scoring: ScoringSystem,
    /// Task texts per day as last loaded or saved here
    last_saved: HashMap<NaiveDate, HashSet<String>>,
}

impl Journal {
    /// Open the journal described by `config`, creating the day directory and
    /// loading the persisted timer and score history.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        let store = JournalStore::open(&config.base_dir)?;
        let tracker = TimeTracker::load(config.timer_state_path());
        let scoring = ScoringSystem::load(config.stats_path());
        info!(base_dir = %config.base_dir.display(), "journal opened");
        Ok(Journal {
            config,
            store,
            tracker,
            scoring,
            last_saved: HashMap::new(),
        })
    }

    /// Open using `~/.taskjournal/config.toml` (or defaults)
    pub fn open_default() -> Result<Self, JournalError> {
        Journal::open(load_config())
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn store(&self) -> &JournalStore {
        &self.store
    }

    pub fn tracker(&self) -> &TimeTracker {
        &self.tracker
    }

    pub fn scoring(&self) -> &ScoringSystem {
        &self.scoring
    }

    // -----------------------------------------------------------------------
    // Days
    // -----------------------------------------------------------------------

    /// Load a day and restore its running timer, if it has one
    pub fn load_day(&mut self, date: NaiveDate) -> DayList {
        let mut list = self.store.load_day(date);
        self.remember(&list);
        self.tracker.sync_timer_with_task_list(&mut list);
        list
    }

    pub fn save_day(&mut self, list: &DayList) -> Result<(), JournalError> {
        self.store.save_day(list)?;
        self.remember(list);
        Ok(())
    }

    fn remember(&mut self, list: &DayList) {
        let contents = list.tasks().map(|t| t.content.clone()).collect();
        self.last_saved.insert(list.date, contents);
    }

    /// Earlier day with an open task
    pub fn find_prev_day(&self, from: NaiveDate) -> Option<NaiveDate> {
        find_prev_open_day(&self.store, from, self.config.max_search_days)
    }

    /// Later day with an open task
    pub fn find_next_day(&self, from: NaiveDate) -> Option<NaiveDate> {
        find_next_open_day(&self.store, from, self.config.max_search_days)
    }

    // -----------------------------------------------------------------------
    // Completion and scoring
    // -----------------------------------------------------------------------

    /// Toggle completion, re-sort, save and re-score the day.
    /// Returns the task's new index.
    pub fn toggle_complete(&mut self, list: &mut DayList, index: usize) -> Result<usize, JournalError> {
        let new_index = task_ops::toggle_complete(list, index)?;
        self.tracker.follow_running_task(list);
        self.save_day(list)?;
        self.scoring.calculate_daily_score(list);
        Ok(new_index)
    }

    pub fn score_day(&mut self, list: &DayList) -> DailyScore {
        self.scoring.calculate_daily_score(list)
    }

    pub fn streak(&self, date: NaiveDate) -> u32 {
        self.scoring.get_streak(date)
    }

    /// Average efficiency over the configured window
    pub fn average_efficiency(&self) -> f64 {
        self.scoring
            .get_average_efficiency(self.config.average_efficiency_days)
    }

    // -----------------------------------------------------------------------
    // Timer
    // -----------------------------------------------------------------------

    /// Stop a timer running on a day other than `list`, saving that day.
    fn stop_elsewhere(&mut self, list: &DayList) -> Result<u64, JournalError> {
        let Some(date) = self.tracker.active_date() else {
            return Ok(0);
        };
        if date == list.date {
            return Ok(0);
        }
        let mut other = self.load_day(date);
        let seconds = self.tracker.stop_timer(&mut other);
        if seconds > 0 {
            self.save_day(&other)?;
        }
        debug!(%date, seconds, "stopped timer on another day");
        Ok(seconds)
    }

    /// Start timing `index`, first stopping the timer wherever it runs.
    /// Returns false for an invalid index or a divider.
    pub fn start_timer(&mut self, list: &mut DayList, index: usize) -> Result<bool, JournalError> {
        if list.task(index).is_none() {
            return Ok(false);
        }
        self.stop_elsewhere(list)?;
        // Stopping a timer on this same day adds time to `list`
        let had_timer_here = self.tracker.active_date() == Some(list.date);
        let started = self.tracker.start_timer(list, index);
        if had_timer_here {
            self.save_day(list)?;
        }
        Ok(started)
    }

    /// Stop the running timer, on whichever day it is, and save that day.
    /// Returns the seconds added.
    pub fn stop_timer(&mut self, list: &mut DayList) -> Result<u64, JournalError> {
        if self.tracker.active_date().is_some_and(|d| d != list.date) {
            return self.stop_elsewhere(list);
        }
        let seconds = self.tracker.stop_timer(list);
        if seconds > 0 {
            self.save_day(list)?;
        }
        Ok(seconds)
    }

    /// Returns `(now_running, seconds_added)`
    pub fn toggle_timer(&mut self, list: &mut DayList, index: usize) -> Result<(bool, u64), JournalError> {
        if self.tracker.is_timer_running(list, index) {
            let seconds = self.stop_timer(list)?;
            return Ok((false, seconds));
        }
        let started = self.start_timer(list, index)?;
        Ok((started, 0))
    }

    /// Cancel the running timer without recording time
    pub fn clear_timer(&mut self, list: &mut DayList) -> bool {
        match self.tracker.active_date() {
            Some(date) if date != list.date => {
                let mut other = self.load_day(date);
                self.tracker.clear_timer(&mut other)
            }
            _ => self.tracker.clear_timer(list),
        }
    }

    /// Adjust a task's tracked time by `delta_seconds` and save
    pub fn add_manual_time(
        &mut self,
        list: &mut DayList,
        index: usize,
        delta_seconds: i64,
    ) -> Result<(), JournalError> {
        if index >= list.len() {
            return Err(TaskError::IndexOutOfRange(index).into());
        }
        let task = list.task_mut(index).ok_or(TaskError::NotATask(index))?;
        TimeTracker::add_manual_time(task, delta_seconds);
        self.save_day(list)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Restructuring across days
    // -----------------------------------------------------------------------

    /// Move the group at `index` to the end of `target`'s list.
    ///
    /// The copies start fresh (open, no tracked time, no timer); any timer
    /// running inside the group is cancelled. The destination is saved before
    /// the group is removed from `list`. Returns the moved group's index in
    /// the destination, or `None` when `target` is `list`'s own date.
    pub fn move_to_date(
        &mut self,
        list: &mut DayList,
        index: usize,
        target: NaiveDate,
    ) -> Result<Option<usize>, JournalError> {
        if target == list.date {
            return Ok(None);
        }
        let copies = task_ops::group_for_other_day(&list.entries, index)?;

        let (start, end) = get_task_group(&list.entries, index);
        let timer_in_group = self.tracker.active_date() == Some(list.date)
            && self
                .tracker
                .active_index()
                .is_some_and(|i| (start..=end).contains(&i));
        if timer_in_group {
            self.tracker.clear_timer(list);
        }

        let mut destination = self.load_day(target);
        let placed_at = destination.len();
        destination.entries.extend(copies);
        self.save_day(&destination)?;

        task_ops::delete_group(list, index)?;
        self.tracker.follow_running_task(list);
        self.save_day(list)?;
        debug!(from = %list.date, to = %target, "moved group to another day");
        Ok(Some(placed_at))
    }

    /// Merge tasks added to the day file by another program into `list`.
    ///
    /// Callers decide when to check (for example by polling
    /// [`JournalStore::modified_time`]). Tasks already present are left
    /// alone, and so are tasks deleted from `list` since this journal last
    /// loaded or saved the day, even when that deletion is not saved yet.
    /// Saves when anything was merged and returns how many tasks were appended.
    pub fn reconcile_external_edit(&mut self, list: &mut DayList) -> Result<usize, JournalError> {
        let on_disk = self.store.load_day(list.date);
        let last_saved = self.last_saved.get(&list.date).cloned().unwrap_or_default();
        let added = task_ops::merge_external(list, &on_disk, &last_saved);
        if added > 0 {
            self.save_day(list)?;
        }
        Ok(added)
    }
}
