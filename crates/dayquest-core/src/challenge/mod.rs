//! Device-resident challenge record.
//!
//! One [`ChallengeState`] document per user holds every [`DayRecord`], the
//! check-in history and the cached streak/XP. It is owned by a
//! [`ChallengeStore`], which persists it through a
//! [`KeyValueStore`](crate::storage::KeyValueStore) after every mutation.

pub mod checkin;
pub mod days;
pub mod session;
mod store;

pub use checkin::{mood_to_score, Mood};
pub use days::{ensure_day, merge_action_fields};
pub use store::{ChallengeStore, STATE_KEY};

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rewards::XpKind;

/// Free-form per-feature payload attached to a day.
pub type ActionData = serde_json::Map<String, serde_json::Value>;

/// The whole locally persisted challenge document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    /// Day records in creation order; at most one per index.
    #[serde(default)]
    pub days: Vec<DayRecord>,
    /// Consecutive completed days ending at today (cached).
    #[serde(default)]
    pub streak: u32,
    /// Local XP cache. The remote ledger is authoritative.
    #[serde(default)]
    pub xp: i64,
    /// Mood check-in history; several entries per day are allowed.
    #[serde(default)]
    pub checkins: Vec<Checkin>,
    /// Fields written by other app versions, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChallengeState {
    /// Look up a day without creating it.
    pub fn day(&self, index: u32) -> Option<&DayRecord> {
        self.days.iter().find(|d| d.day == index)
    }

    /// Number of completed days.
    pub fn completed_days(&self) -> usize {
        self.days.iter().filter(|d| d.completed).count()
    }

    /// Credit `amount` to the local XP cache once per `(day, kind)`.
    ///
    /// Returns whether XP was credited.
    pub fn credit_local_xp(&mut self, day: u32, kind: XpKind, amount: i64) -> bool {
        let credited = ensure_day(&mut self.days, day).awarded.insert(kind);
        if credited {
            self.xp = self.xp.saturating_add(amount.max(0));
        }
        credited
    }

    /// Sum of focus minutes across all days.
    pub fn total_habit_minutes(&self) -> u64 {
        self.days.iter().map(|d| u64::from(d.habit_minutes)).sum()
    }
}

/// Per-day aggregate of completion, mood, sessions and action data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub day: u32,
    #[serde(default)]
    pub completed: bool,
    /// Mood score 1..=5, see [`mood_to_score`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub habit_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_data: Option<ActionData>,
    /// Reward kinds already credited to the local XP cache for this day.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub awarded: BTreeSet<XpKind>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DayRecord {
    /// A fresh, not yet completed day.
    pub fn new(day: u32) -> Self {
        Self {
            day,
            completed: false,
            mood: None,
            sessions: Vec::new(),
            habit_minutes: 0,
            action_data: None,
            awarded: BTreeSet::new(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A finished timed focus session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub minutes: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One mood check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub day: u32,
    pub mood: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parses_camel_case_document() {
        let json = r#"{
            "days": [{"day": 1, "completed": true, "mood": 4, "sessions": [], "habitMinutes": 20}],
            "streak": 1,
            "xp": 40,
            "checkins": []
        }"#;
        let state: ChallengeState = serde_json::from_str(json).unwrap();
        assert_eq!(state.days[0].habit_minutes, 20);
        assert_eq!(state.days[0].mood, Some(4));
        assert_eq!(state.xp, 40);
    }

    #[test]
    fn unknown_fields_pass_through() {
        let json = r#"{"days": [{"day": 2, "photoUrl": "x.jpg"}], "theme": "dark"}"#;
        let state: ChallengeState = serde_json::from_str(json).unwrap();
        assert_eq!(state.extra["theme"], "dark");
        assert_eq!(state.days[0].extra["photoUrl"], "x.jpg");

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["theme"], "dark");
        assert_eq!(back["days"][0]["photoUrl"], "x.jpg");
    }

    #[test]
    fn missing_checkins_default_to_empty() {
        let state: ChallengeState = serde_json::from_str(r#"{"days": []}"#).unwrap();
        assert!(state.checkins.is_empty());
        assert_eq!(state.streak, 0);
    }

    #[test]
    fn local_xp_credited_once_per_day_and_kind() {
        let mut state = ChallengeState::default();
        assert!(state.credit_local_xp(1, XpKind::DayComplete, 10));
        assert!(!state.credit_local_xp(1, XpKind::DayComplete, 10));
        assert!(state.credit_local_xp(1, XpKind::MoodCheckin, 5));
        assert!(state.credit_local_xp(2, XpKind::DayComplete, 10));
        assert_eq!(state.xp, 25);
        assert_eq!(state.days.len(), 2);
    }

    #[test]
    fn aggregates() {
        let mut state = ChallengeState::default();
        let mut d1 = DayRecord::new(1);
        d1.completed = true;
        d1.habit_minutes = 25;
        let mut d2 = DayRecord::new(2);
        d2.habit_minutes = 40;
        state.days = vec![d1, d2];
        assert_eq!(state.completed_days(), 1);
        assert_eq!(state.total_habit_minutes(), 65);
        assert!(state.day(2).is_some());
        assert!(state.day(3).is_none());
    }
}
