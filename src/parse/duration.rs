use std::sync::LazyLock;

use regex::Regex;

static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(\d+(?:\.\d+)?)\s*(?:hours|hour|hrs|hr|h))?\s*(?:(\d+(?:\.\d+)?)\s*(?:minutes|minute|mins|min|m))?\s*(?:(\d+(?:\.\d+)?)\s*(?:seconds|second|secs|sec|s))?$",
    )
    .unwrap()
});

/// Parse a duration string into seconds.
///
/// A bare integer is minutes (`"30"` → 1800). Otherwise hours, minutes and
/// seconds may be combined in that order, with optional spaces and decimals:
/// `"1h30m15s"`, `"1h 30m"`, `"1.5h"`, `"90sec"`. Returns `None` for empty or
/// unrecognised input, for unit forms that add up to zero and for values too
/// large to count in seconds.
pub fn parse_duration(s: &str) -> Option<u64> {
    parse_seconds(s).filter(|&secs| secs > 0 || is_bare_integer(s))
}

/// Parse a duration written into a day file. Same grammar as
/// [`parse_duration`], but a zero such as `"0s"` is a value, not a rejection.
pub fn parse_stored_duration(s: &str) -> Option<u64> {
    parse_seconds(s)
}

fn is_bare_integer(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_seconds(s: &str) -> Option<u64> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    if let Ok(minutes) = s.parse::<u64>() {
        return minutes.checked_mul(60);
    }

    let caps = UNIT_RE.captures(&s)?;
    if caps.iter().skip(1).all(|m| m.is_none()) {
        return None;
    }
    let part = |i: usize, factor: f64| -> f64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map_or(0.0, |v| v * factor)
    };
    let total = part(1, 3600.0) + part(2, 60.0) + part(3, 1.0);
    // u64::MAX as f64 rounds up to 2^64, so `<` excludes it
    if total.is_finite() && total < u64::MAX as f64 {
        Some(total as u64)
    } else {
        None
    }
}

/// Parse a signed duration for manual time adjustment: `"+10m"`, `"-90s"`, `"15"`.
pub fn parse_duration_delta(s: &str) -> Option<i64> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let secs = parse_duration(rest)?;
    i64::try_from(secs).ok().map(|secs| sign * secs)
}

/// Format seconds compactly: `5415` → `"1h30m15s"`, `3600` → `"1h"`, `45` → `"45s"`.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if secs > 0 {
        out.push_str(&format!("{}s", secs));
    }
    out
}
