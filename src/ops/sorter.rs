//! Keeps open task groups above completed ones within a sibling range.
//!
//! Sorting is local to the nearest parent: a completed subtask sinks below its
//! open siblings but never leaves its parent's child range.

use tracing::debug;

use crate::model::Entry;
use crate::ops::hierarchy::get_task_group;

/// Parent index and the half-open `[start, end)` range of the parent's
/// descendants. Top-level entries (and orphans with no parent) use the whole list.
pub fn find_parent_context(entries: &[Entry], index: usize) -> (Option<usize>, usize, usize) {
    let whole = (None, 0, entries.len());
    let Some(current) = entries.get(index) else {
        return whole;
    };
    if current.indent_level == 0 {
        return whole;
    }

    let Some(parent) = (0..index)
        .rev()
        .find(|&i| entries[i].indent_level < current.indent_level)
    else {
        return whole;
    };

    let parent_indent = entries[parent].indent_level;
    let mut end = parent + 1;
    for (i, entry) in entries.iter().enumerate().skip(parent + 1) {
        if entry.indent_level <= parent_indent {
            break;
        }
        end = i + 1;
    }
    (Some(parent), parent + 1, end)
}

/// First completed entry at exactly `target_indent` in `[start, end)`
pub fn find_completion_boundary(
    entries: &[Entry],
    start: usize,
    end: usize,
    target_indent: usize,
) -> Option<usize> {
    let end = end.min(entries.len());
    (start..end).find(|&i| entries[i].indent_level == target_indent && entries[i].is_completed())
}

/// Where the group at `index` should go after its completion flipped.
///
/// Completing: just past the last other sibling group. Un-completing: right
/// before the first completed sibling, or the end of the range if none.
pub fn find_target_index_for_completion(entries: &[Entry], index: usize, completing: bool) -> usize {
    let Some(current) = entries.get(index) else {
        return index;
    };
    let indent = current.indent_level;
    let (group_start, group_end) = get_task_group(entries, index);
    let (_, sibling_start, sibling_end) = find_parent_context(entries, index);
    let in_own_group = |i: usize| i >= group_start && i <= group_end;

    if completing {
        let mut last_at_indent = None;
        let mut i = sibling_start;
        while i < sibling_end {
            if entries[i].indent_level == indent {
                if in_own_group(i) {
                    i = group_end + 1;
                    continue;
                }
                last_at_indent = Some(i);
                i = get_task_group(entries, i).1 + 1;
            } else {
                i += 1;
            }
        }
        match last_at_indent {
            Some(last) => get_task_group(entries, last).1 + 1,
            None => sibling_end,
        }
    } else {
        let mut i = sibling_start;
        while i < sibling_end {
            if in_own_group(i) {
                i = group_end + 1;
                continue;
            }
            if entries[i].indent_level == indent && entries[i].is_completed() {
                return i;
            }
            i += 1;
        }
        sibling_end
    }
}

/// Move the group at `index` to its place after its completion flag was
/// flipped. Returns the group's new start index (unchanged when no move is
/// needed), or `None` for an out-of-range index.
pub fn reorder_task_on_completion(entries: &mut Vec<Entry>, index: usize) -> Option<usize> {
    let completing = entries.get(index)?.is_completed();
    let mut target = find_target_index_for_completion(entries, index, completing);
    let (group_start, group_end) = get_task_group(entries, index);

    if target >= group_start && target <= group_end + 1 {
        return Some(index);
    }

    let group_len = group_end - group_start + 1;
    let moving: Vec<Entry> = entries.drain(group_start..=group_end).collect();
    if group_start < target {
        target -= group_len;
    }
    entries.splice(target..target, moving);

    debug!(from = index, to = target, len = group_len, "reordered group on completion");
    Some(target)
}
