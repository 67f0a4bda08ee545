//! Human-readable feedback strings derived from an insights report.

use serde::Serialize;

use super::{InsightsReport, Trend};

/// One message per metric, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub total_playtime: String,
    pub longest_session: String,
    pub avg_playtime: String,
    pub peak_play_hour: String,
    pub weekend_playtime: String,
    pub weekday_playtime: String,
    pub longest_streak: String,
    pub session_trend: String,
    pub next_game_prediction: String,
}

/// Converts a 0-23 hour to 12-hour clock with AM/PM.
fn to_12_hour(hour: u32) -> String {
    let period = if hour >= 12 { "PM" } else { "AM" };
    let adjusted = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{adjusted} {period}")
}

fn minutes_to_hours(minutes: i64) -> i64 {
    (minutes as f64 / 60.0).round() as i64
}

/// Builds the feedback messages for a report.
///
/// The streak message switches tone at 3 days, and the trend message
/// branches per direction.
pub fn create_feedback(report: &InsightsReport) -> Feedback {
    let longest_streak = if report.longest_streak >= 3 {
        format!(
            "You're on a {}-day streak! Make sure to take breaks between sessions to stay refreshed.",
            report.longest_streak
        )
    } else {
        "You're keeping things balanced with breaks between gaming sessions. Keep it up!"
            .to_string()
    };

    let session_trend = match report.session_duration_trend {
        Trend::Increasing => {
            "Your gaming sessions have been getting longer over time. Try setting a timer to maintain balance."
        }
        Trend::Decreasing => {
            "Your session times have been decreasing. It seems like you're managing your time well!"
        }
        Trend::Stable => {
            "Your gaming session durations have remained stable. Great job maintaining consistency!"
        }
    }
    .to_string();

    Feedback {
        total_playtime: format!(
            "You've spent a total of {} hours gaming.",
            minutes_to_hours(report.total_playtime)
        ),
        longest_session: format!(
            "Your longest session was {} minutes.",
            report.longest_session
        ),
        avg_playtime: format!(
            "On average, you play for {} minutes per day.",
            report.average_playtime_per_day.round() as i64
        ),
        peak_play_hour: format!(
            "You play the most during the hour of {}.",
            to_12_hour(report.peak_play_hour)
        ),
        weekend_playtime: format!(
            "You've spent {} hours gaming on weekends.",
            minutes_to_hours(report.weekend_playtime)
        ),
        weekday_playtime: format!(
            "You've spent {} hours gaming on weekdays.",
            minutes_to_hours(report.weekday_playtime)
        ),
        longest_streak,
        session_trend,
        next_game_prediction: format!(
            "Based on your past playtime, you might want to play: {}. Enjoy!",
            report.next_game_prediction
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::compute_insights;
    use crate::insights::tests::{at, session};

    #[test]
    fn test_to_12_hour() {
        assert_eq!(to_12_hour(0), "12 AM");
        assert_eq!(to_12_hour(9), "9 AM");
        assert_eq!(to_12_hour(12), "12 PM");
        assert_eq!(to_12_hour(21), "9 PM");
        assert_eq!(to_12_hour(23), "11 PM");
    }

    #[test]
    fn test_minutes_to_hours_rounds() {
        assert_eq!(minutes_to_hours(0), 0);
        assert_eq!(minutes_to_hours(29), 0);
        assert_eq!(minutes_to_hours(30), 1);
        assert_eq!(minutes_to_hours(150), 3);
    }

    #[test]
    fn test_feedback_for_short_streak() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 21), 90),
            session("Chess", at(2026, 1, 6, 21), 30),
        ];
        let report = compute_insights(&sessions).unwrap();
        let feedback = create_feedback(&report);

        assert_eq!(feedback.total_playtime, "You've spent a total of 2 hours gaming.");
        assert_eq!(feedback.longest_session, "Your longest session was 90 minutes.");
        assert_eq!(feedback.avg_playtime, "On average, you play for 60 minutes per day.");
        assert_eq!(
            feedback.peak_play_hour,
            "You play the most during the hour of 9 PM."
        );
        assert!(feedback.longest_streak.contains("keeping things balanced"));
        assert!(feedback.session_trend.contains("decreasing"));
        assert!(feedback.next_game_prediction.contains("Chess"));
    }

    #[test]
    fn test_feedback_streak_message_switches_at_three_days() {
        let sessions = vec![
            session("Chess", at(2026, 1, 5, 10), 10),
            session("Chess", at(2026, 1, 6, 10), 10),
            session("Chess", at(2026, 1, 7, 10), 10),
        ];
        let report = compute_insights(&sessions).unwrap();
        let feedback = create_feedback(&report);
        assert!(feedback.longest_streak.contains("3-day streak"));
    }

    #[test]
    fn test_feedback_trend_messages() {
        let increasing = vec![
            session("Chess", at(2026, 1, 5, 10), 10),
            session("Chess", at(2026, 1, 6, 10), 50),
        ];
        let report = compute_insights(&increasing).unwrap();
        assert!(create_feedback(&report)
            .session_trend
            .contains("getting longer"));

        let stable = vec![session("Chess", at(2026, 1, 5, 10), 10)];
        let report = compute_insights(&stable).unwrap();
        assert!(create_feedback(&report)
            .session_trend
            .contains("remained stable"));
    }
}
