//! Serde helpers for day-of-week availability sets.
//!
//! Days are written as upper-case full names (`"MONDAY"`) ordered Monday
//! first, and read back with chrono's parser so `"mon"`, `"Monday"` and
//! `"MONDAY"` are all accepted.

use chrono::{ParseWeekdayError, Weekday};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use std::collections::HashSet;

pub fn full_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

pub fn sorted(days: &HashSet<Weekday>) -> Vec<Weekday> {
    let mut ordered: Vec<Weekday> = days.iter().copied().collect();
    ordered.sort_by_key(|day| day.num_days_from_monday());
    ordered
}

/// Parses a comma separated list such as `mon,tue,WEDNESDAY`.
pub fn parse_set(input: &str) -> Result<HashSet<Weekday>, ParseWeekdayError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<Weekday>)
        .collect()
}

pub fn serialize<S>(days: &HashSet<Weekday>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(sorted(days).into_iter().map(full_name))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<HashSet<Weekday>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .iter()
        .map(|name| {
            name.parse::<Weekday>()
                .map_err(|_| D::Error::custom(format!("unknown day of week '{name}'")))
        })
        .collect()
}
