use std::collections::HashSet;

use tracing::debug;

use crate::model::{DayList, Entry, Task};
use crate::ops::hierarchy::{find_next_sibling_group, find_prev_sibling_group, get_task_group, has_children};
use crate::ops::sorter::reorder_task_on_completion;

/// Error type for day list editing
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("no entry at index {0}")]
    IndexOutOfRange(usize),
    #[error("entry {0} is a divider, not a task")]
    NotATask(usize),
    #[error("cannot indent past level {0}")]
    MaxIndent(usize),
    #[error("entry is already at the top level")]
    AlreadyTopLevel,
    #[error("entry has no children to fold")]
    NoChildren,
    #[error("no sibling in that direction")]
    NoSibling,
    #[error("task text cannot be empty")]
    EmptyContent,
}

fn entry_mut(list: &mut DayList, index: usize) -> Result<&mut Entry, TaskError> {
    list.entries
        .get_mut(index)
        .ok_or(TaskError::IndexOutOfRange(index))
}

fn task_mut(list: &mut DayList, index: usize) -> Result<&mut Task, TaskError> {
    entry_mut(list, index)?
        .as_task_mut()
        .ok_or(TaskError::NotATask(index))
}

// ---------------------------------------------------------------------------
// Adding and editing
// ---------------------------------------------------------------------------

/// Where a new task goes given the current selection: directly below a
/// selected child at the same indent, otherwise appended at the top level.
/// Returns `(insert_at, indent)`; `None` means append.
pub fn insert_position_for_new_task(list: &DayList, selected: Option<usize>) -> (Option<usize>, usize) {
    match selected.and_then(|i| list.entries.get(i).map(|e| (i, e.indent_level))) {
        Some((i, indent)) if indent > 0 => (Some(i + 1), indent),
        _ => (None, 0),
    }
}

/// Add a task, returning its index. The indent is clamped to `max_indent`
/// and `at` past the end appends.
pub fn add_task(
    list: &mut DayList,
    content: &str,
    indent: usize,
    at: Option<usize>,
    max_indent: usize,
) -> Result<usize, TaskError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(TaskError::EmptyContent);
    }
    let entry = Entry::task(content, indent.min(max_indent));
    Ok(insert_entry(list, entry, at))
}

/// Add a divider, returning its index. A blank label means none.
pub fn add_divider(
    list: &mut DayList,
    label: Option<&str>,
    indent: usize,
    at: Option<usize>,
    max_indent: usize,
) -> usize {
    let entry = Entry::divider(clean_label(label), indent.min(max_indent));
    insert_entry(list, entry, at)
}

fn insert_entry(list: &mut DayList, entry: Entry, at: Option<usize>) -> usize {
    let index = at.map_or(list.len(), |i| i.min(list.len()));
    list.entries.insert(index, entry);
    index
}

fn clean_label(label: Option<&str>) -> Option<String> {
    label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

/// Replace a task's text, or a divider's label (blank clears the label)
pub fn edit_content(list: &mut DayList, index: usize, content: &str) -> Result<(), TaskError> {
    let entry = entry_mut(list, index)?;
    if entry.is_divider() {
        *entry = Entry::divider(clean_label(Some(content)), entry.indent_level);
        return Ok(());
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(TaskError::EmptyContent);
    }
    task_mut(list, index)?.content = content.to_string();
    Ok(())
}

/// Set or clear a task's estimate. A zero estimate clears it.
pub fn set_estimate(list: &mut DayList, index: usize, seconds: Option<u64>) -> Result<(), TaskError> {
    task_mut(list, index)?.estimated_seconds = seconds.filter(|&s| s > 0);
    Ok(())
}

// ---------------------------------------------------------------------------
// Deleting
// ---------------------------------------------------------------------------

/// Remove a single entry. Its children stay and attach to whatever now
/// precedes them.
pub fn delete_entry(list: &mut DayList, index: usize) -> Result<Entry, TaskError> {
    if index >= list.len() {
        return Err(TaskError::IndexOutOfRange(index));
    }
    Ok(list.entries.remove(index))
}

/// Remove an entry together with all its descendants
pub fn delete_group(list: &mut DayList, index: usize) -> Result<Vec<Entry>, TaskError> {
    if index >= list.len() {
        return Err(TaskError::IndexOutOfRange(index));
    }
    let (start, end) = get_task_group(&list.entries, index);
    debug!(start, end, "deleting group");
    Ok(list.entries.drain(start..=end).collect())
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

pub fn indent(list: &mut DayList, index: usize, max_indent: usize) -> Result<(), TaskError> {
    let entry = entry_mut(list, index)?;
    if entry.indent_level >= max_indent {
        return Err(TaskError::MaxIndent(max_indent));
    }
    entry.indent_level += 1;
    Ok(())
}

pub fn unindent(list: &mut DayList, index: usize) -> Result<(), TaskError> {
    let entry = entry_mut(list, index)?;
    if entry.indent_level == 0 {
        return Err(TaskError::AlreadyTopLevel);
    }
    entry.indent_level -= 1;
    Ok(())
}

/// Fold or unfold a task. Only tasks with children can fold.
pub fn toggle_fold(list: &mut DayList, index: usize) -> Result<bool, TaskError> {
    let children = has_children(&list.entries, index);
    let task = task_mut(list, index)?;
    if !children {
        return Err(TaskError::NoChildren);
    }
    task.toggle_fold();
    Ok(task.folded)
}

/// Flip completion and move the task's group to its sorted place.
/// Returns the group's new index.
pub fn toggle_complete(list: &mut DayList, index: usize) -> Result<usize, TaskError> {
    task_mut(list, index)?.toggle_complete();
    reorder_task_on_completion(&mut list.entries, index).ok_or(TaskError::IndexOutOfRange(index))
}

/// Swap the group at `index` with the previous sibling group.
/// Returns the moved group's new start index.
pub fn move_group_up(list: &mut DayList, index: usize) -> Result<usize, TaskError> {
    if index >= list.len() {
        return Err(TaskError::IndexOutOfRange(index));
    }
    let (prev_start, _) = find_prev_sibling_group(&list.entries, index).ok_or(TaskError::NoSibling)?;
    let (start, end) = get_task_group(&list.entries, index);
    // [prev group][current group] -> [current group][prev group]
    list.entries[prev_start..=end].rotate_left(start - prev_start);
    Ok(prev_start)
}

/// Swap the group at `index` with the next sibling group.
/// Returns the moved group's new start index.
pub fn move_group_down(list: &mut DayList, index: usize) -> Result<usize, TaskError> {
    if index >= list.len() {
        return Err(TaskError::IndexOutOfRange(index));
    }
    let (next_start, next_end) = find_next_sibling_group(&list.entries, index).ok_or(TaskError::NoSibling)?;
    let (start, _) = get_task_group(&list.entries, index);
    let next_len = next_end - next_start + 1;
    list.entries[start..=next_end].rotate_right(next_len);
    Ok(start + next_len)
}

// ---------------------------------------------------------------------------
// Moving between days
// ---------------------------------------------------------------------------

/// Copies of the group at `index` ready to append to another day: the root
/// lands at indent 0 with relative nesting kept, completion and tracked time
/// are reset and no timer is carried. The estimate and fold state survive.
pub fn group_for_other_day(entries: &[Entry], index: usize) -> Result<Vec<Entry>, TaskError> {
    let root = entries.get(index).ok_or(TaskError::IndexOutOfRange(index))?;
    let base = root.indent_level;
    let (start, end) = get_task_group(entries, index);
    Ok(entries[start..=end]
        .iter()
        .map(|entry| {
            let mut copy = entry.clone();
            copy.indent_level -= base;
            if let Some(task) = copy.as_task_mut() {
                task.completed = false;
                task.actual_seconds = 0;
                task.timer_start = None;
            }
            copy
        })
        .collect())
}

// ---------------------------------------------------------------------------
// External edits
// ---------------------------------------------------------------------------

/// Append tasks from `on_disk` whose text matches no task in `list`.
/// Returns how many were appended.
///
/// `last_saved` holds the task texts of the day as it was last loaded or
/// saved. A task in it that is missing from `list` was deleted here, so its
/// copy on disk is stale and is not re-added.
pub fn merge_external(list: &mut DayList, on_disk: &DayList, last_saved: &HashSet<String>) -> usize {
    let known: HashSet<&str> = list.tasks().map(|t| t.content.as_str()).collect();
    let is_new = |t: &Task| !known.contains(t.content.as_str()) && !last_saved.contains(&t.content);
    let additions: Vec<Entry> = on_disk
        .entries
        .iter()
        .filter(|e| e.as_task().is_some_and(is_new))
        .cloned()
        .collect();
    let added = additions.len();
    list.entries.extend(additions);
    if added > 0 {
        debug!(added, date = %list.date, "merged external edits");
    }
    added
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
