use std::sync::LazyLock;

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use regex::Regex;

use crate::io::JournalStore;

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+)\s+(\d{1,2})$").unwrap());

// ---------------------------------------------------------------------------
// Open-day navigation
// ---------------------------------------------------------------------------

/// Nearest earlier day (within `max_days`) whose file holds an open task
pub fn find_prev_open_day(store: &JournalStore, from: NaiveDate, max_days: u32) -> Option<NaiveDate> {
    find_open_day(store, from, max_days, |d| d.pred_opt())
}

/// Nearest later day (within `max_days`) whose file holds an open task
pub fn find_next_open_day(store: &JournalStore, from: NaiveDate, max_days: u32) -> Option<NaiveDate> {
    find_open_day(store, from, max_days, |d| d.succ_opt())
}

fn find_open_day(
    store: &JournalStore,
    from: NaiveDate,
    max_days: u32,
    step: impl Fn(NaiveDate) -> Option<NaiveDate>,
) -> Option<NaiveDate> {
    let mut check = step(from)?;
    for _ in 0..max_days {
        if store.day_exists(check) && store.load_day(check).has_incomplete() {
            return Some(check);
        }
        check = step(check)?;
    }
    None
}

// ---------------------------------------------------------------------------
// Natural date input
// ---------------------------------------------------------------------------

/// Parse a date typed by the user, with "today" taken from the local clock.
/// See [`parse_date`].
pub fn parse(input: &str, reference: NaiveDate) -> Option<NaiveDate> {
    parse_date(input, reference, Local::now().date_naive())
}

/// Parse a date typed by the user.
///
/// `+N` / `-N` are days from `reference` (the day being viewed). Everything
/// else is anchored to `today`:
///
/// - `YYYY-MM-DD`
/// - `today`, `tomorrow`, `yesterday`, `next week`, `last week`
/// - weekday names (`monday`, `tue`, ...): the next occurrence, a week out
///   when it names today
/// - `<month> <day>` (`nov 10`, `december 25`): this year, or next year once
///   the date has passed
pub fn parse_date(input: &str, reference: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let input = input.trim().to_lowercase();

    if input.starts_with('+') || input.starts_with('-') {
        if let Ok(days) = input.parse::<i64>() {
            return offset(reference, days);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&input, "%Y-%m-%d") {
        return Some(date);
    }

    match input.as_str() {
        "today" => return Some(today),
        "tomorrow" => return offset(today, 1),
        "yesterday" => return offset(today, -1),
        "next week" => return offset(today, 7),
        "last week" => return offset(today, -7),
        _ => {}
    }

    if let Some(weekday) = weekday_named(&input) {
        let current = today.weekday().num_days_from_monday() as i64;
        let mut ahead = weekday.num_days_from_monday() as i64 - current;
        if ahead <= 0 {
            ahead += 7;
        }
        return offset(today, ahead);
    }

    let caps = MONTH_DAY_RE.captures(&input)?;
    let month = month_named(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if this_year < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(this_year)
    }
}

fn offset(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn weekday_named(name: &str) -> Option<Weekday> {
    let weekday = match name {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

fn month_named(name: &str) -> Option<u32> {
    let month = match name {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}
