//! Derived productivity statistics.
//!
//! Pure functions over session history: hourly buckets for a single
//! day, weekly point logs, rank and shield bank. The store is never
//! mutated here.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use crate::timer::CompletedSession;

/// Weekly rank thresholds, highest first.
pub const RANKS: [Rank; 6] = [
    Rank { name: "CELESTIAL", min_points: 3840 },
    Rank { name: "LEGENDARY", min_points: 3360 },
    Rank { name: "GUARDIAN", min_points: 2880 },
    Rank { name: "ACOLYTE", min_points: 1000 },
    Rank { name: "INITIATE", min_points: 0 },
    Rank { name: "OUTCAST", min_points: -9999 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub name: &'static str,
    pub min_points: i64,
}

/// How a day scored against the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    GoalMet,
    InProgress,
    Deficit,
}

/// One day of the weekly point log.
#[derive(Debug, Clone, Serialize)]
pub struct DailyPoints {
    pub date: NaiveDate,
    pub minutes: i64,
    pub net_points: i64,
    pub status: DayStatus,
}

/// Minutes focused per start hour for one day's sessions.
pub fn hourly_minutes(sessions: &[CompletedSession]) -> [u64; 24] {
    let mut buckets = [0u64; 24];
    for session in sessions {
        let hour = session.start_time_of_day.hour() as usize;
        buckets[hour] += u64::from(session.duration_minutes);
    }
    buckets
}

/// Point log for Monday of the current week through `today`, newest
/// first.
///
/// A day at or over the goal earns its full minutes. The current day
/// under goal earns its minutes with no penalty (the day hasn't closed).
/// A past day under goal earns `minutes - goal/2`; there is no floor,
/// so large deficits go negative.
pub fn weekly_points(
    sessions: &[CompletedSession],
    today: NaiveDate,
    daily_goal_minutes: i64,
) -> Vec<DailyPoints> {
    let monday = today - chrono::Duration::days(i64::from(today.weekday().num_days_from_monday()));

    let mut days = Vec::new();
    let mut current = monday;
    while current <= today {
        let minutes: i64 = sessions
            .iter()
            .filter(|s| s.date == current)
            .map(|s| i64::from(s.duration_minutes))
            .sum();

        let (net_points, status) = if minutes >= daily_goal_minutes {
            (minutes, DayStatus::GoalMet)
        } else if current == today {
            (minutes, DayStatus::InProgress)
        } else {
            (minutes - daily_goal_minutes / 2, DayStatus::Deficit)
        };

        days.push(DailyPoints {
            date: current,
            minutes,
            net_points,
            status,
        });
        current += chrono::Duration::days(1);
    }
    days.reverse();
    days
}

/// Hours of the day whose focused minutes meet the hourly goal.
pub fn hours_at_goal(buckets: &[u64; 24], hourly_goal_minutes: u64) -> Vec<u32> {
    buckets
        .iter()
        .enumerate()
        .filter(|(_, minutes)| **minutes >= hourly_goal_minutes)
        .map(|(hour, _)| hour as u32)
        .collect()
}

/// Net weekly credits: sum of daily net points.
pub fn weekly_credits(log: &[DailyPoints]) -> i64 {
    log.iter().map(|d| d.net_points).sum()
}

/// Shield bank: one shield minute per six focused minutes this week.
pub fn shield_bank(log: &[DailyPoints]) -> i64 {
    log.iter().map(|d| d.minutes).sum::<i64>() / 6
}

/// The highest rank whose threshold the credits meet.
pub fn rank_for(credits: i64) -> Rank {
    RANKS
        .iter()
        .find(|rank| credits >= rank.min_points)
        .copied()
        .unwrap_or(RANKS[RANKS.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn session(date: NaiveDate, hour: u32, minutes: u32) -> CompletedSession {
        CompletedSession {
            date,
            start_time_of_day: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            duration_minutes: minutes,
        }
    }

    fn day(d: u32) -> NaiveDate {
        // June 2026: the 1st is a Monday.
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    #[test]
    fn hourly_buckets_accumulate_by_start_hour() {
        let sessions = vec![
            session(day(1), 9, 30),
            session(day(1), 9, 15),
            session(day(1), 23, 10),
        ];
        let buckets = hourly_minutes(&sessions);
        assert_eq!(buckets[9], 45);
        assert_eq!(buckets[23], 10);
        assert_eq!(buckets[0], 0);
    }

    #[test]
    fn hours_at_goal_flags_buckets_meeting_the_threshold() {
        let sessions = vec![
            session(day(1), 9, 30),
            session(day(1), 9, 15),
            session(day(1), 14, 30),
            session(day(1), 23, 10),
        ];
        let buckets = hourly_minutes(&sessions);
        assert_eq!(hours_at_goal(&buckets, 30), vec![9, 14]);
        assert!(hours_at_goal(&buckets, 60).is_empty());
    }

    #[test]
    fn goal_met_day_earns_full_minutes() {
        let sessions = vec![session(day(1), 9, 480)];
        let log = weekly_points(&sessions, day(2), 480);
        let monday = log.iter().find(|d| d.date == day(1)).unwrap();
        assert_eq!(monday.net_points, 480);
        assert_eq!(monday.status, DayStatus::GoalMet);
    }

    #[test]
    fn past_day_under_goal_pays_half_goal_penalty() {
        let sessions = vec![session(day(1), 9, 100)];
        let log = weekly_points(&sessions, day(3), 480);
        let monday = log.iter().find(|d| d.date == day(1)).unwrap();
        assert_eq!(monday.net_points, 100 - 240);
        assert_eq!(monday.status, DayStatus::Deficit);
    }

    #[test]
    fn current_day_under_goal_has_no_penalty_yet() {
        let sessions = vec![session(day(3), 9, 100)];
        let log = weekly_points(&sessions, day(3), 480);
        assert_eq!(log[0].date, day(3));
        assert_eq!(log[0].net_points, 100);
        assert_eq!(log[0].status, DayStatus::InProgress);
    }

    #[test]
    fn log_runs_newest_first_from_monday() {
        let log = weekly_points(&[], day(4), 480);
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].date, day(4));
        assert_eq!(log[3].date, day(1));
    }

    #[test]
    fn credits_sum_net_points_without_floor() {
        let sessions = vec![session(day(1), 9, 0)];
        let log = weekly_points(&sessions, day(3), 480);
        // Two closed empty days at -240 each, today at 0.
        assert_eq!(weekly_credits(&log), -480);
    }

    #[test]
    fn shield_bank_is_focused_minutes_over_six() {
        let sessions = vec![session(day(1), 9, 480), session(day(2), 9, 125)];
        let log = weekly_points(&sessions, day(2), 480);
        assert_eq!(shield_bank(&log), (480 + 125) / 6);
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(rank_for(4000).name, "CELESTIAL");
        assert_eq!(rank_for(3840).name, "CELESTIAL");
        assert_eq!(rank_for(3000).name, "GUARDIAN");
        assert_eq!(rank_for(1000).name, "ACOLYTE");
        assert_eq!(rank_for(5).name, "INITIATE");
        assert_eq!(rank_for(-100).name, "OUTCAST");
    }
}
