use chrono::{DateTime, Local};

/// A checkbox task with its time-tracking fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    /// Task text (may be empty)
    pub content: String,
    pub completed: bool,
    /// Hides descendants when set; only meaningful if the task has children
    pub folded: bool,
    /// Estimate in seconds (`None` = no estimate)
    pub estimated_seconds: Option<u64>,
    /// Accumulated tracked time in seconds
    pub actual_seconds: u64,
    /// Set while this task's timer is running. Never written to the day file.
    pub timer_start: Option<DateTime<Local>>,
}

impl Task {
    pub fn new(content: impl Into<String>) -> Self {
        Task {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
    }

    pub fn toggle_fold(&mut self) {
        self.folded = !self.folded;
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer_start.is_some()
    }
}

/// A non-actionable separator line, optionally labelled
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Divider {
    pub label: Option<String>,
}

/// What occupies a slot in a day list
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    Task(Task),
    Divider(Divider),
}

/// One line of a day list: an indentation level plus a task or divider.
///
/// The hierarchy is implicit: the children of an entry are the contiguous run
/// of following entries with a strictly greater `indent_level`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Nesting depth (0 = top-level)
    pub indent_level: usize,
    pub kind: EntryKind,
}

impl Entry {
    pub fn task(content: impl Into<String>, indent_level: usize) -> Self {
        Entry {
            indent_level,
            kind: EntryKind::Task(Task::new(content)),
        }
    }

    pub fn divider(label: Option<String>, indent_level: usize) -> Self {
        Entry {
            indent_level,
            kind: EntryKind::Divider(Divider { label }),
        }
    }

    pub fn from_task(task: Task, indent_level: usize) -> Self {
        Entry {
            indent_level,
            kind: EntryKind::Task(task),
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match &self.kind {
            EntryKind::Task(t) => Some(t),
            EntryKind::Divider(_) => None,
        }
    }

    pub fn as_task_mut(&mut self) -> Option<&mut Task> {
        match &mut self.kind {
            EntryKind::Task(t) => Some(t),
            EntryKind::Divider(_) => None,
        }
    }

    pub fn is_divider(&self) -> bool {
        matches!(self.kind, EntryKind::Divider(_))
    }

    /// Dividers are never completed
    pub fn is_completed(&self) -> bool {
        self.as_task().is_some_and(|t| t.completed)
    }

    /// Dividers are never folded
    pub fn is_folded(&self) -> bool {
        self.as_task().is_some_and(|t| t.folded)
    }

    /// Text shown for the entry: task content or divider label
    pub fn text(&self) -> &str {
        match &self.kind {
            EntryKind::Task(t) => &t.content,
            EntryKind::Divider(d) => d.label.as_deref().unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_has_no_task_state() {
        let d = Entry::divider(Some("Afternoon".into()), 1);
        assert!(d.is_divider());
        assert!(!d.is_completed());
        assert!(!d.is_folded());
        assert!(d.as_task().is_none());
        assert_eq!(d.text(), "Afternoon");
    }

    #[test]
    fn task_toggles() {
        let mut e = Entry::task("Write report", 0);
        let t = e.as_task_mut().unwrap();
        t.toggle_complete();
        t.toggle_fold();
        assert!(e.is_completed());
        assert!(e.is_folded());
        assert_eq!(e.text(), "Write report");
    }
}
