//! Tree queries over a flat, indentation-tagged entry list.
//!
//! There are no parent pointers: an entry's descendants are the maximal run of
//! following entries with a strictly greater indent. Every query here is a
//! bounded linear scan and tolerates malformed input (indent jumps of more
//! than one level, an indented first entry).

use crate::model::Entry;

/// Inclusive index range of the entry at `start` plus all its descendants.
/// Out of range `start` yields the degenerate `(start, start)`.
pub fn get_task_group(entries: &[Entry], start: usize) -> (usize, usize) {
    let Some(head) = entries.get(start) else {
        return (start, start);
    };
    let end = entries[start + 1..]
        .iter()
        .take_while(|e| e.indent_level > head.indent_level)
        .count();
    (start, start + end)
}

/// Group of the nearest earlier sibling, or `None` when the parent boundary
/// (or the start of the list) is reached first.
pub fn find_prev_sibling_group(entries: &[Entry], index: usize) -> Option<(usize, usize)> {
    let target = entries.get(index)?.indent_level;
    for i in (0..index).rev() {
        let indent = entries[i].indent_level;
        if indent == target {
            return Some(get_task_group(entries, i));
        }
        if indent < target {
            return None;
        }
    }
    None
}

/// Group of the next sibling after this entry's own descendants
pub fn find_next_sibling_group(entries: &[Entry], index: usize) -> Option<(usize, usize)> {
    let target = entries.get(index)?.indent_level;
    let (_, current_end) = get_task_group(entries, index);
    for i in current_end + 1..entries.len() {
        let indent = entries[i].indent_level;
        if indent == target {
            return Some(get_task_group(entries, i));
        }
        if indent < target {
            return None;
        }
    }
    None
}

/// True if the next entry is indented deeper than this one
pub fn has_children(entries: &[Entry], index: usize) -> bool {
    match (entries.get(index), entries.get(index + 1)) {
        (Some(current), Some(next)) => next.indent_level > current.indent_level,
        _ => false,
    }
}

/// False if any ancestor is folded (or `index` is out of range).
pub fn is_task_visible(entries: &[Entry], index: usize) -> bool {
    let Some(target) = entries.get(index) else {
        return false;
    };
    let mut reference = target.indent_level;
    for prev in entries[..index].iter().rev() {
        if prev.indent_level < reference {
            if prev.is_folded() {
                return false;
            }
            reference = prev.indent_level;
        }
        if prev.indent_level == 0 {
            break;
        }
    }
    true
}

/// Indices of the ancestors of `index`, root first
pub fn ancestors(entries: &[Entry], index: usize) -> Vec<usize> {
    let Some(target) = entries.get(index) else {
        return Vec::new();
    };
    let mut reference = target.indent_level;
    let mut found = Vec::new();
    for i in (0..index).rev() {
        if reference == 0 {
            break;
        }
        if entries[i].indent_level < reference {
            reference = entries[i].indent_level;
            found.push(i);
        }
    }
    found.reverse();
    found
}

/// A visible line of a day list, with what a tree renderer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    /// Index into the entry list
    pub index: usize,
    pub depth: usize,
    pub has_children: bool,
    pub is_folded: bool,
    /// No later sibling under the same parent
    pub is_last_sibling: bool,
    /// For each ancestor, root first: whether it has a later sibling, i.e.
    /// whether a vertical guide line continues through this row at its column
    pub ancestors_continue: Vec<bool>,
}

/// Flatten the list into its visible rows, skipping descendants of folded entries
pub fn visible_rows(entries: &[Entry]) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let mut skip_deeper_than: Option<usize> = None;

    for (i, entry) in entries.iter().enumerate() {
        if let Some(limit) = skip_deeper_than {
            if entry.indent_level > limit {
                continue;
            }
            skip_deeper_than = None;
        }

        let children = has_children(entries, i);
        if children && entry.is_folded() {
            skip_deeper_than = Some(entry.indent_level);
        }

        rows.push(VisibleRow {
            index: i,
            depth: entry.indent_level,
            has_children: children,
            is_folded: entry.is_folded(),
            is_last_sibling: find_next_sibling_group(entries, i).is_none(),
            ancestors_continue: ancestors(entries, i)
                .into_iter()
                .map(|a| find_next_sibling_group(entries, a).is_some())
                .collect(),
        });
    }
    rows
}

/// Row number of `index` among the visible rows, `None` if hidden
pub fn visible_position(entries: &[Entry], index: usize) -> Option<usize> {
    if !is_task_visible(entries, index) {
        return None;
    }
    Some((0..index).filter(|&i| is_task_visible(entries, i)).count())
}

/// Move a selection `delta` steps (sign only matters) to the nearest visible
/// entry in that direction. Stays put when nothing visible lies that way.
pub fn step_visible(entries: &[Entry], from: usize, delta: isize) -> usize {
    if entries.is_empty() || delta == 0 {
        return from;
    }
    let mut i = from as isize;
    loop {
        i += delta.signum();
        if i < 0 || i >= entries.len() as isize {
            return from;
        }
        if is_task_visible(entries, i as usize) {
            return i as usize;
        }
    }
}
