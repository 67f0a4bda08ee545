//! Aggregate playtime statistics over closed sessions.
//!
//! These are pure folds over session rows the store has already filtered,
//! so the grouping logic is unit-testable without a database. Day and
//! hour buckets use the local time of `start_time`.

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

use super::models::PlaySession;

/// Per-game duration totals.
#[derive(Debug, Clone, Serialize)]
pub struct GameTotals {
    pub game_name: String,
    pub total_minutes: i64,
    pub average_minutes: f64,
    pub max_minutes: i64,
    pub session_count: usize,
}

/// Quadrant of the day a session started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    /// 00:00 - 05:59
    Night,
    /// 06:00 - 11:59
    Morning,
    /// 12:00 - 17:59
    Afternoon,
    /// 18:00 - 23:59
    Evening,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => DayPeriod::Night,
            6..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            _ => DayPeriod::Evening,
        }
    }

    pub const ALL: [DayPeriod; 4] = [
        DayPeriod::Night,
        DayPeriod::Morning,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
    ];
}

impl std::fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayPeriod::Night => write!(f, "night"),
            DayPeriod::Morning => write!(f, "morning"),
            DayPeriod::Afternoon => write!(f, "afternoon"),
            DayPeriod::Evening => write!(f, "evening"),
        }
    }
}

fn duration_of(session: &PlaySession) -> i64 {
    session.duration_minutes.unwrap_or(0)
}

/// Groups sessions by game name, computing total, average, and max
/// duration plus the session count. Sorted by total descending.
pub fn playtime_by_game(sessions: &[PlaySession]) -> Vec<GameTotals> {
    let mut groups: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for session in sessions {
        groups
            .entry(session.game_name.as_str())
            .or_default()
            .push(duration_of(session));
    }

    let mut totals: Vec<GameTotals> = groups
        .into_iter()
        .map(|(name, durations)| {
            let total: i64 = durations.iter().sum();
            let max = durations.iter().copied().max().unwrap_or(0);
            GameTotals {
                game_name: name.to_string(),
                total_minutes: total,
                average_minutes: total as f64 / durations.len() as f64,
                max_minutes: max,
                session_count: durations.len(),
            }
        })
        .collect();

    totals.sort_by(|a, b| b.total_minutes.cmp(&a.total_minutes));
    totals
}

/// Total minutes per local calendar date, ascending by date. Dates with
/// no sessions are omitted.
pub fn playtime_by_day(sessions: &[PlaySession]) -> Vec<(NaiveDate, i64)> {
    let mut days: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for session in sessions {
        *days.entry(session.start_time.date_naive()).or_insert(0) += duration_of(session);
    }
    days.into_iter().collect()
}

/// Total minutes per weekday, Monday through Sunday. Every weekday is
/// present, with 0 for days never played.
pub fn playtime_by_weekday(sessions: &[PlaySession]) -> Vec<(Weekday, i64)> {
    let order = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    let mut totals: BTreeMap<u32, i64> = BTreeMap::new();
    for session in sessions {
        let key = session.start_time.weekday().num_days_from_monday();
        *totals.entry(key).or_insert(0) += duration_of(session);
    }
    order
        .into_iter()
        .map(|day| {
            let total = totals
                .get(&day.num_days_from_monday())
                .copied()
                .unwrap_or(0);
            (day, total)
        })
        .collect()
}

/// Total minutes per day quadrant of the start hour. Every quadrant is
/// present, with 0 for quadrants never played.
pub fn playtime_by_period(sessions: &[PlaySession]) -> Vec<(DayPeriod, i64)> {
    let mut totals: BTreeMap<DayPeriod, i64> = BTreeMap::new();
    for session in sessions {
        let period = DayPeriod::from_hour(session.start_time.hour());
        *totals.entry(period).or_insert(0) += duration_of(session);
    }
    DayPeriod::ALL
        .into_iter()
        .map(|period| (period, totals.get(&period).copied().unwrap_or(0)))
        .collect()
}
