//! Streak and adherence over the challenge window.
//!
//! "Today" is the actor's local calendar day (configured UTC offset). With a
//! start date, today's index is the number of calendar days since the start,
//! plus one, capped at the challenge length. Without one, the highest recorded
//! day index stands in for today.

use chrono::NaiveDate;

use crate::challenge::DayRecord;

/// Challenge day index for `today`.
///
/// Returns 0 before the challenge starts or when nothing is recorded yet.
pub fn current_day_index(
    start_date: Option<NaiveDate>,
    today: NaiveDate,
    length_days: u32,
    days: &[DayRecord],
) -> u32 {
    match start_date {
        Some(start) => {
            let elapsed = (today - start).num_days();
            if elapsed < 0 {
                0
            } else {
                u32::try_from(elapsed + 1)
                    .unwrap_or(u32::MAX)
                    .min(length_days)
            }
        }
        None => days.iter().map(|d| d.day).max().unwrap_or(0),
    }
}

fn is_completed(days: &[DayRecord], index: u32) -> bool {
    days.iter().any(|d| d.day == index && d.completed)
}

/// Consecutive completed days ending at `today_index`.
///
/// An unfinished today does not break the streak: counting then starts
/// from yesterday.
pub fn compute_streak(days: &[DayRecord], today_index: u32) -> u32 {
    if today_index == 0 {
        return 0;
    }
    let mut cursor = if is_completed(days, today_index) {
        today_index
    } else {
        today_index - 1
    };
    let mut streak = 0;
    while cursor > 0 && is_completed(days, cursor) {
        streak += 1;
        cursor -= 1;
    }
    streak
}

/// Fraction of the challenge window completed, in `[0, 1]`.
pub fn adherence(days: &[DayRecord], length_days: u32) -> f64 {
    if length_days == 0 {
        return 0.0;
    }
    let completed = days
        .iter()
        .filter(|d| d.completed && d.day >= 1 && d.day <= length_days)
        .count();
    (completed as f64 / f64::from(length_days)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(completed: &[u32], open: &[u32]) -> Vec<DayRecord> {
        let mut out = Vec::new();
        for &d in completed {
            let mut r = DayRecord::new(d);
            r.completed = true;
            out.push(r);
        }
        for &d in open {
            out.push(DayRecord::new(d));
        }
        out
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn index_from_start_date() {
        let start = Some(date(2024, 1, 1));
        assert_eq!(current_day_index(start, date(2024, 1, 1), 30, &[]), 1);
        assert_eq!(current_day_index(start, date(2024, 1, 5), 30, &[]), 5);
        assert_eq!(current_day_index(start, date(2023, 12, 31), 30, &[]), 0);
        assert_eq!(current_day_index(start, date(2024, 6, 1), 30, &[]), 30);
    }

    #[test]
    fn index_without_start_date_uses_latest_record() {
        let d = days(&[1, 2], &[4]);
        assert_eq!(current_day_index(None, date(2024, 1, 1), 30, &d), 4);
        assert_eq!(current_day_index(None, date(2024, 1, 1), 30, &[]), 0);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let d = days(&[1, 2, 3, 5, 6, 7], &[]);
        assert_eq!(compute_streak(&d, 7), 3);
        assert_eq!(compute_streak(&d, 3), 3);
    }

    #[test]
    fn unfinished_today_keeps_yesterdays_streak() {
        let d = days(&[1, 2, 3], &[4]);
        assert_eq!(compute_streak(&d, 4), 3);
    }

    #[test]
    fn missed_yesterday_breaks_streak() {
        let d = days(&[1, 2, 3], &[]);
        assert_eq!(compute_streak(&d, 5), 0);
    }

    #[test]
    fn streak_zero_before_start() {
        let d = days(&[1], &[]);
        assert_eq!(compute_streak(&d, 0), 0);
    }

    #[test]
    fn adherence_ratio() {
        let d = days(&[1, 2, 3], &[4, 5]);
        assert!((adherence(&d, 30) - 0.1).abs() < 1e-9);
        assert_eq!(adherence(&d, 0), 0.0);
        let outside = days(&[40], &[]);
        assert_eq!(adherence(&outside, 30), 0.0);
    }
}
