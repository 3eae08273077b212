//! Parser for the common subset of the OSM `opening_hours` grammar.
//!
//! Supported: `24/7`, weekday ranges and lists (`Mo-Fr`, `Mo,We,Fr`,
//! wrap-around `Sa-Mo`), several time ranges per rule, `off`/`closed`, and
//! `;`-separated rules where a later rule replaces an earlier one for the same
//! day. Ranges that run past midnight are clamped to midnight. Anything else
//! (public holidays, sunrise, months, comments) is ignored.

use std::sync::LazyLock;

use carefind_core::{DaySchedule, OpeningHours, TimeRange, MINUTES_PER_DAY};
use chrono::Weekday;
use regex::Regex;

const WEEK: [(&str, Weekday); 7] = [
    ("mo", Weekday::Mon),
    ("tu", Weekday::Tue),
    ("we", Weekday::Wed),
    ("th", Weekday::Thu),
    ("fr", Weekday::Fri),
    ("sa", Weekday::Sat),
    ("su", Weekday::Sun),
];

static RULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:((?:mo|tu|we|th|fr|sa|su|ph|sh)(?:\s*[-,]\s*(?:mo|tu|we|th|fr|sa|su|ph|sh))*)\b)?\s*(.*)$",
    )
    .expect("valid rule regex")
});
static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})\+?$").expect("valid time regex")
});

/// Parses an `opening_hours` tag value.
///
/// Returns [`OpeningHours::unknown`] when no rule could be understood, so a
/// garbled tag never claims a facility is open.
#[must_use]
pub fn parse_opening_hours(raw: &str) -> OpeningHours {
    let mut hours = OpeningHours::unknown();

    for rule in raw.split(';').map(str::trim).filter(|r| !r.is_empty()) {
        let Some((days, schedule)) = parse_rule(rule) else {
            tracing::debug!(rule, "ignoring unsupported opening_hours rule");
            continue;
        };
        for day in days {
            *hours.day_mut(day) = schedule.clone();
        }
    }

    hours
}

fn parse_rule(rule: &str) -> Option<(Vec<Weekday>, DaySchedule)> {
    if rule == "24/7" {
        return Some((all_days(), all_day_schedule()));
    }

    let caps = RULE_RE.captures(rule)?;
    let days = match caps.get(1) {
        Some(selector) => parse_day_selector(selector.as_str())?,
        None => all_days(),
    };
    let rest = caps.get(2).map_or("", |m| m.as_str()).trim();

    let schedule = match rest.to_ascii_lowercase().as_str() {
        "off" | "closed" => DaySchedule::closed(),
        "24/7" | "00:00-24:00" => all_day_schedule(),
        _ => parse_time_ranges(rest)?,
    };
    Some((days, schedule))
}

fn all_days() -> Vec<Weekday> {
    WEEK.iter().map(|(_, d)| *d).collect()
}

fn all_day_schedule() -> DaySchedule {
    DaySchedule {
        intervals: vec![TimeRange::all_day()],
    }
}

fn day_index(token: &str) -> Option<usize> {
    let token = token.trim().to_ascii_lowercase();
    WEEK.iter().position(|(name, _)| *name == token)
}

/// `Mo-Fr,Su` → `[Mon..=Fri, Sun]`. Holiday tokens are skipped; a selector
/// made only of holiday tokens yields `None`.
fn parse_day_selector(selector: &str) -> Option<Vec<Weekday>> {
    let mut days = Vec::new();
    for item in selector.split(',') {
        let mut bounds = item.split('-');
        let start = bounds.next().and_then(day_index);
        let end = bounds.next().map(day_index);
        match (start, end) {
            (Some(start), None) => days.push(WEEK[start].1),
            (Some(start), Some(Some(end))) => {
                let span = (end + 7 - start) % 7;
                for offset in 0..=span {
                    days.push(WEEK[(start + offset) % 7].1);
                }
            }
            _ => {}
        }
    }
    days.dedup();
    (!days.is_empty()).then_some(days)
}

fn parse_minute(hours: &str, minutes: &str) -> Option<u16> {
    let h: u16 = hours.parse().ok()?;
    let m: u16 = minutes.parse().ok()?;
    (h <= 24 && m < 60 && h * 60 + m <= MINUTES_PER_DAY).then_some(h * 60 + m)
}

fn parse_time_ranges(spec: &str) -> Option<DaySchedule> {
    let mut intervals = Vec::new();
    for part in spec.split(',').map(str::trim) {
        let caps = TIME_RANGE_RE.captures(part)?;
        let open = parse_minute(&caps[1], &caps[2])?;
        let close = parse_minute(&caps[3], &caps[4])?;
        let close = if close <= open { MINUTES_PER_DAY } else { close };
        intervals.extend(TimeRange::new(open, close));
    }
    if intervals.is_empty() {
        return None;
    }
    intervals.sort_by_key(|r| r.open_minute);
    Some(DaySchedule { intervals })
}
