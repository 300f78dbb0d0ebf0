//! Pure progress metrics derived from the challenge state.

pub mod level;
pub mod streak;

pub use level::{level_for_xp, level_progress, xp_for_level, LevelProgress};
pub use streak::{adherence, compute_streak, current_day_index};

use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeState;

/// Everything a progress screen needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub today_index: u32,
    pub length_days: u32,
    pub completed_days: usize,
    pub streak: u32,
    pub adherence: f64,
    pub total_habit_minutes: u64,
    pub level: LevelProgress,
}

impl ProgressSnapshot {
    /// Derive a snapshot from `state` for the given day index.
    pub fn from_state(state: &ChallengeState, today_index: u32, length_days: u32) -> Self {
        Self {
            today_index,
            length_days,
            completed_days: state.completed_days(),
            streak: compute_streak(&state.days, today_index),
            adherence: adherence(&state.days, length_days),
            total_habit_minutes: state.total_habit_minutes(),
            level: level_progress(state.xp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::DayRecord;

    #[test]
    fn snapshot_from_state() {
        let mut state = ChallengeState::default();
        for d in 1..=3 {
            let mut r = DayRecord::new(d);
            r.completed = true;
            r.habit_minutes = 10;
            state.days.push(r);
        }
        state.xp = 150;

        let snap = ProgressSnapshot::from_state(&state, 3, 30);
        assert_eq!(snap.streak, 3);
        assert_eq!(snap.completed_days, 3);
        assert_eq!(snap.total_habit_minutes, 30);
        assert_eq!(snap.level.level, 1);
        assert!((snap.adherence - 0.1).abs() < 1e-9);
    }
}
