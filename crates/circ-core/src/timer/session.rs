//! Completed-session records and midnight-split accounting.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timer mode. Work completions are recorded; break completions only
/// reset the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Work,
    Break,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Work => "FOCUSING",
            Mode::Break => "RESTING",
        }
    }
}

/// One recorded focus interval, immutable once written.
///
/// The store upserts by `(date, start_time_of_day)`: a later write with
/// the same key replaces the earlier one, which makes restart-safe
/// completion handling and re-import idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSession {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time_of_day: NaiveTime,
    pub duration_minutes: u32,
}

/// Serialize times at minute resolution ("HH:MM"), the store key format.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}

/// Split a just-finished work session into dated records.
///
/// The nominal start is `end - duration_minutes`. A session contained
/// in one calendar day yields a single record. A session that crossed
/// midnight yields up to two: the minutes before midnight attributed to
/// the start day (inclusive of the boundary minute), the remainder to
/// the end day at 00:00. The parts never sum to more than the full
/// duration, so daily aggregation stays exact.
pub fn split_session(end: NaiveDateTime, duration_minutes: u32) -> Vec<CompletedSession> {
    let start = end - chrono::Duration::minutes(i64::from(duration_minutes));

    if start.date() == end.date() {
        return vec![CompletedSession {
            date: start.date(),
            start_time_of_day: truncate_to_minute(start.time()),
            duration_minutes,
        }];
    }

    let end_of_start_day = start
        .date()
        .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default());
    let before_midnight = ((end_of_start_day - start).num_minutes() + 1)
        .clamp(0, i64::from(duration_minutes)) as u32;
    let after_midnight = duration_minutes - before_midnight;

    let mut records = Vec::with_capacity(2);
    if before_midnight > 0 {
        records.push(CompletedSession {
            date: start.date(),
            start_time_of_day: truncate_to_minute(start.time()),
            duration_minutes: before_midnight,
        });
    }
    if after_midnight > 0 {
        records.push(CompletedSession {
            date: end.date(),
            start_time_of_day: NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default(),
            duration_minutes: after_midnight,
        });
    }
    records
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
