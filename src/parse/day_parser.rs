use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::{DayList, Entry, EntryKind, Task};
use crate::parse::duration::parse_stored_duration;

/// `  - [x] rest`; the checkbox letter is case-insensitive
static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( *)- \[([ xX])\](?: (.*))?$").unwrap());

/// `  <!-- divider -->` or `  <!-- divider: Label -->`
static DIVIDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( *)<!--\s*divider(?:\s*:\s*(.*?))?\s*-->\s*$").unwrap()
});

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--(.*?)-->").unwrap());

/// `est:<dur>` / `actual:<dur>` pairs inside one comment, in any order
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(est|actual)\s*:\s*([0-9][0-9a-z.]*)").unwrap());

/// Parse a day file. Lines that are neither tasks nor dividers (the heading,
/// prose, plain bullets, malformed checkboxes) are skipped.
pub fn parse_day(text: &str, date: NaiveDate) -> DayList {
    let mut list = DayList::new(date);
    for line in text.lines() {
        if let Some(entry) = parse_line(line) {
            list.entries.push(entry);
        }
    }
    list
}

/// Parse a single line into an entry
pub fn parse_line(line: &str) -> Option<Entry> {
    let line = line.trim_end_matches('\r');

    if let Some(caps) = DIVIDER_RE.captures(line) {
        let label = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|l| !l.is_empty());
        return Some(Entry::divider(label, indent_level(&caps[1])));
    }

    let caps = TASK_RE.captures(line)?;
    let completed = caps[2].eq_ignore_ascii_case("x");
    let rest = caps.get(3).map_or("", |m| m.as_str());

    let mut task = Task {
        completed,
        ..Default::default()
    };

    for comment in COMMENT_RE.captures_iter(rest) {
        let body = comment[1].trim();
        if body == "folded" {
            task.folded = true;
            continue;
        }
        for field in TIME_RE.captures_iter(body) {
            let value = parse_stored_duration(&field[2]);
            match &field[1] {
                "est" => task.estimated_seconds = value,
                _ => task.actual_seconds = value.unwrap_or(0),
            }
        }
    }

    let content = COMMENT_RE.replace_all(rest, "");
    let content = content.trim();
    task.content = if completed {
        strip_strikethrough(content)
    } else {
        content
    }
    .to_string();

    Some(Entry {
        indent_level: indent_level(&caps[1]),
        kind: EntryKind::Task(task),
    })
}

/// Two spaces per level
fn indent_level(spaces: &str) -> usize {
    spaces.len() / 2
}

/// Remove the `~~…~~` wrapper written around completed tasks
fn strip_strikethrough(s: &str) -> &str {
    if s.len() >= 4 && s.starts_with("~~") && s.ends_with("~~") {
        s[2..s.len() - 2].trim()
    } else {
        s
    }
}
