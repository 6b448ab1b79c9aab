use chrono::NaiveDate;

use super::task::{Entry, Task};

/// The ordered entries for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayList {
    pub date: NaiveDate,
    pub entries: Vec<Entry>,
}

impl DayList {
    pub fn new(date: NaiveDate) -> Self {
        DayList {
            date,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Task at `index`, or `None` when out of range or a divider
    pub fn task(&self, index: usize) -> Option<&Task> {
        self.entries.get(index).and_then(Entry::as_task)
    }

    pub fn task_mut(&mut self, index: usize) -> Option<&mut Task> {
        self.entries.get_mut(index).and_then(Entry::as_task_mut)
    }

    /// Iterate over the tasks, skipping dividers
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.entries.iter().filter_map(Entry::as_task)
    }

    /// True if at least one task is still open
    pub fn has_incomplete(&self) -> bool {
        self.tasks().any(|t| !t.completed)
    }

    /// ISO `YYYY-MM-DD` form of the date
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
