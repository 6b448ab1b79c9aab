use crate::model::{DayList, Entry, EntryKind, Task};
use crate::parse::duration::format_duration;

/// Serialize a day list to its markdown file contents: a `# YYYY-MM-DD`
/// heading, a blank line, then one line per entry.
pub fn serialize_day(list: &DayList) -> String {
    let mut out = format!("# {}\n\n", list.date_key());
    for line in serialize_entries(&list.entries) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Serialize entries to lines (no trailing newlines)
pub fn serialize_entries(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(serialize_entry).collect()
}

fn serialize_entry(entry: &Entry) -> String {
    let indent = "  ".repeat(entry.indent_level);
    match &entry.kind {
        EntryKind::Divider(d) => match &d.label {
            Some(label) => format!("{}<!-- divider: {} -->", indent, label),
            None => format!("{}<!-- divider -->", indent),
        },
        EntryKind::Task(task) => format!("{}{}", indent, serialize_task(task)),
    }
}

/// `- [x] ~~content~~ <!-- folded --> <!-- est:10m, actual:8m -->`
fn serialize_task(task: &Task) -> String {
    let mut line = if task.completed {
        format!("- [x] ~~{}~~", task.content)
    } else {
        format!("- [ ] {}", task.content)
    };

    if task.folded {
        line.push_str(" <!-- folded -->");
    }

    let mut times = Vec::new();
    if let Some(est) = task.estimated_seconds {
        times.push(format!("est:{}", format_duration(est)));
    }
    if task.actual_seconds > 0 {
        times.push(format!("actual:{}", format_duration(task.actual_seconds)));
    }
    if !times.is_empty() {
        line.push_str(&format!(" <!-- {} -->", times.join(", ")));
    }

    line
}
