//! Insights engine: derived playtime statistics over closed sessions.
//!
//! `compute_insights` is a pure function over a slice of closed play
//! sessions. The caller is responsible for excluding in-progress rows;
//! `Database::closed_sessions` does exactly that and returns rows in
//! chronological order, which matters for the duration-trend metric
//! (see [`Trend`]).

pub mod feedback;

pub use feedback::{create_feedback, Feedback};

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::storage::PlaySession;

/// Errors from insights computation.
#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    /// Several metrics divide by counts derived from the input, so an
    /// empty list is rejected up front instead of poisoning the report
    /// with NaN.
    #[error("no closed sessions to analyze")]
    EmptySessionList,
}

/// Direction of session durations over the supplied ordering.
///
/// Computed as the signed sum of pairwise differences between each
/// session's duration and the previous one, in the order the sessions
/// were supplied (not re-sorted). Feed sessions chronologically for the
/// result to mean anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "Increasing"),
            Trend::Decreasing => write!(f, "Decreasing"),
            Trend::Stable => write!(f, "Stable"),
        }
    }
}

/// The bundle of derived statistics computed from closed sessions.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsReport {
    /// Sum of all session durations, in minutes
    pub total_playtime: i64,
    /// Longest single session, in minutes
    pub longest_session: i64,
    /// Total playtime divided by the number of distinct days played
    pub average_playtime_per_day: f64,
    /// Population variance of session durations, per game
    pub variance_by_game: BTreeMap<String, f64>,
    /// Hour of day (0-23, local) with the most accumulated playtime
    pub peak_play_hour: u32,
    /// Minutes played on Saturdays and Sundays
    pub weekend_playtime: i64,
    /// Minutes played Monday through Friday
    pub weekday_playtime: i64,
    /// Longest run of consecutive calendar days with at least one session
    pub longest_streak: i64,
    /// Duration trend over the supplied session order
    pub session_duration_trend: Trend,
    /// Most frequently played game
    pub next_game_prediction: String,
}

fn duration_of(session: &PlaySession) -> i64 {
    session.duration_minutes.unwrap_or(0)
}

/// Population variance (divisor = n, not n - 1). A single-element group
/// has variance 0.
fn variance(durations: &[i64]) -> f64 {
    let n = durations.len() as f64;
    let mean = durations.iter().sum::<i64>() as f64 / n;
    durations
        .iter()
        .map(|&d| {
            let diff = d as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n
}

/// Longest run of consecutive days in a sorted, de-duplicated date set.
/// A single day counts as a streak of 1.
fn longest_streak(dates: &[NaiveDate]) -> i64 {
    let mut longest = 0i64;
    let mut current = 1i64;
    for pair in dates.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            current += 1;
        } else {
            longest = longest.max(current);
            current = 1;
        }
    }
    longest.max(current)
}

/// Picks the key with the largest value, keeping the first-encountered
/// key on ties. The entries must be in first-seen order.
fn max_by_value_first_wins<K: Copy, V: PartialOrd + Copy>(entries: &[(K, V)]) -> Option<K> {
    let mut best: Option<(K, V)> = None;
    for &(key, value) in entries {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((key, value)),
        }
    }
    best.map(|(key, _)| key)
}

/// Computes the full insights report.
///
/// Every session must be closed; open rows contribute a duration of 0
/// and would skew the metrics, so callers should filter them out first.
pub fn compute_insights(sessions: &[PlaySession]) -> Result<InsightsReport, InsightsError> {
    if sessions.is_empty() {
        return Err(InsightsError::EmptySessionList);
    }

    let mut total_playtime = 0i64;
    let mut longest_session = 0i64;
    let mut weekend_playtime = 0i64;
    let mut weekday_playtime = 0i64;

    // First-seen order preserved for deterministic tie-breaks
    let mut hour_totals: Vec<(u32, i64)> = Vec::new();
    let mut game_counts: Vec<(&str, i64)> = Vec::new();
    let mut durations_by_game: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    let mut days_played: Vec<NaiveDate> = Vec::new();

    for session in sessions {
        let duration = duration_of(session);
        total_playtime += duration;
        longest_session = longest_session.max(duration);

        durations_by_game
            .entry(session.game_name.as_str())
            .or_default()
            .push(duration);
        days_played.push(session.start_time.date_naive());

        let hour = session.start_time.hour();
        match hour_totals.iter_mut().find(|(h, _)| *h == hour) {
            Some((_, total)) => *total += duration,
            None => hour_totals.push((hour, duration)),
        }

        match session.start_time.weekday() {
            Weekday::Sat | Weekday::Sun => weekend_playtime += duration,
            _ => weekday_playtime += duration,
        }

        let name = session.game_name.as_str();
        match game_counts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => game_counts.push((name, 1)),
        }
    }

    days_played.sort();
    days_played.dedup();

    let variance_by_game = durations_by_game
        .into_iter()
        .map(|(name, durations)| (name.to_string(), variance(&durations)))
        .collect();

    // Signed sum of consecutive duration differences, in input order
    let trend = if sessions.len() < 2 {
        Trend::Stable
    } else {
        let total_diff: i64 = sessions
            .windows(2)
            .map(|pair| duration_of(&pair[1]) - duration_of(&pair[0]))
            .sum();
        match total_diff {
            d if d > 0 => Trend::Increasing,
            d if d < 0 => Trend::Decreasing,
            _ => Trend::Stable,
        }
    };

    // Non-empty input guarantees both maxima exist
    let peak_play_hour = max_by_value_first_wins(&hour_totals).unwrap_or(0);
    let next_game_prediction = max_by_value_first_wins(&game_counts)
        .unwrap_or("")
        .to_string();

    Ok(InsightsReport {
        total_playtime,
        longest_session,
        average_playtime_per_day: total_playtime as f64 / days_played.len() as f64,
        variance_by_game,
        peak_play_hour,
        weekend_playtime,
        weekday_playtime,
        longest_streak: longest_streak(&days_played),
        session_duration_trend: trend,
        next_game_prediction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone};
    use crate::storage::PlaySession;

    pub(crate) fn session(game: &str, start: DateTime<Local>, minutes: i64) -> PlaySession {
        PlaySession {
            id: 0,
            game_id: 0,
            game_name: game.to_string(),
            exe_path: format!("/apps/{}.exe", game.to_lowercase()),
            start_time: start,
            end_time: Some(start + chrono::Duration::minutes(minutes)),
            duration_minutes: Some(minutes),
        }
    }

    pub(crate) fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(
            compute_insights(&[]),
            Err(InsightsError::EmptySessionList)
        ));
    }

    #[test]
    fn test_total_and_longest() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 30),
            session("Chess", at(2026, 1, 6, 10), 90),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.total_playtime, 120);
        assert_eq!(report.longest_session, 90);
    }

    #[test]
    fn test_average_playtime_per_day_counts_distinct_dates() {
        // Two sessions on the same day: 30 + 90 over 1 distinct day
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 30),
            session("Chess", at(2026, 1, 5, 20), 90),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.average_playtime_per_day, 120.0);
    }

    #[test]
    fn test_variance_single_session_is_zero() {
        let sessions = vec![session("Chess", at(2026, 1, 5, 10), 45)];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.variance_by_game["Chess"], 0.0);
    }

    #[test]
    fn test_variance_is_population_variance() {
        // Durations 10 and 30: mean 20, squared deviations 100 each,
        // population variance 100 (not 200 as the sample formula gives)
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 10),
            session("Chess", at(2026, 1, 6, 10), 30),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.variance_by_game["Chess"], 100.0);
    }

    #[test]
    fn test_peak_play_hour() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 9), 10),
            session("Chess", at(2026, 1, 6, 21), 60),
            session("Chess", at(2026, 1, 7, 9), 20),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.peak_play_hour, 21);
    }

    #[test]
    fn test_peak_play_hour_tie_keeps_first_encountered() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 14), 30),
            session("Chess", at(2026, 1, 6, 9), 30),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.peak_play_hour, 14);
    }

    #[test]
    fn test_weekend_weekday_partition() {
        // 2026-01-05 Monday, 2026-01-10 Saturday, 2026-01-11 Sunday
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 40),
            session("Chess", at(2026, 1, 10, 10), 25),
            session("Chess", at(2026, 1, 11, 10), 35),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.weekday_playtime, 40);
        assert_eq!(report.weekend_playtime, 60);
    }

    #[test]
    fn test_longest_streak_with_gap() {
        // Jan 1, 2, 3, then a gap, then Jan 5: streak is 3
        let sessions = vec![
            session("Chess", at(2026, 1, 1, 10), 10),
            session("Chess", at(2026, 1, 2, 10), 10),
            session("Chess", at(2026, 1, 3, 10), 10),
            session("Chess", at(2026, 1, 5, 10), 10),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.longest_streak, 3);
    }

    #[test]
    fn test_longest_streak_single_day_is_one() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 10),
            session("Chess", at(2026, 1, 5, 20), 10),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.longest_streak, 1);
    }

    #[test]
    fn test_trend_increasing_from_pairwise_diffs() {
        // Durations 10, 20, 15: diffs (+10, -5) sum to +5
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 10),
            session("Chess", at(2026, 1, 6, 10), 20),
            session("Chess", at(2026, 1, 7, 10), 15),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.session_duration_trend, Trend::Increasing);
    }

    #[test]
    fn test_trend_decreasing() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 60),
            session("Chess", at(2026, 1, 6, 10), 20),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.session_duration_trend, Trend::Decreasing);
    }

    #[test]
    fn test_trend_single_session_is_stable() {
        let sessions = vec![session("Chess", at(2026, 1, 5, 10), 60)];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.session_duration_trend, Trend::Stable);
    }

    #[test]
    fn test_trend_depends_on_input_order() {
        let a = session("Chess", at(2026, 1, 5, 10), 10);
        let b = session("Chess", at(2026, 1, 6, 10), 30);

        let forward = compute_insights(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(forward.session_duration_trend, Trend::Increasing);

        // Same sessions, reversed order: the trend flips
        let backward = compute_insights(&[b, a]).unwrap();
        assert_eq!(backward.session_duration_trend, Trend::Decreasing);
    }

    #[test]
    fn test_next_game_prediction_is_mode() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 10),
            session("Doom", at(2026, 1, 6, 10), 999),
            session("Chess", at(2026, 1, 7, 10), 10),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.next_game_prediction, "Chess");
    }

    #[test]
    fn test_next_game_prediction_tie_keeps_first_encountered() {
        let sessions = vec![
            session("Doom", at(2026, 1, 5, 10), 10),
            session("Chess", at(2026, 1, 6, 10), 10),
        ];
        let report = compute_insights(&sessions).unwrap();
        assert_eq!(report.next_game_prediction, "Doom");
    }
}
