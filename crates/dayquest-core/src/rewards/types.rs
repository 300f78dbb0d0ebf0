//! Reward ledger row types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;
use crate::progress::LevelProgress;

/// Authenticated user identifier, as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Actions that grant XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpKind {
    DayComplete,
    WeeklyRetro,
    MoodCheckin,
    TinyHabit,
    FocusSession,
    FlashcardsPractice,
    TaskComplete,
}

impl XpKind {
    pub const ALL: [XpKind; 7] = [
        XpKind::DayComplete,
        XpKind::WeeklyRetro,
        XpKind::MoodCheckin,
        XpKind::TinyHabit,
        XpKind::FocusSession,
        XpKind::FlashcardsPractice,
        XpKind::TaskComplete,
    ];

    /// Wire name stored in the ledger's `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            XpKind::DayComplete => "day_complete",
            XpKind::WeeklyRetro => "weekly_retro",
            XpKind::MoodCheckin => "mood_checkin",
            XpKind::TinyHabit => "tiny_habit",
            XpKind::FocusSession => "focus_session",
            XpKind::FlashcardsPractice => "flashcards_practice",
            XpKind::TaskComplete => "task_complete",
        }
    }
}

impl fmt::Display for XpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XpKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        XpKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "kind".to_string(),
                message: format!("unknown xp kind '{s}'"),
            })
    }
}

/// Ledger day key for a challenge day index.
///
/// Derived from the index alone, so editing `challenge.start_date` never
/// renames a day that has already been awarded.
pub fn day_key(day: u32) -> String {
    format!("day-{day}")
}

/// Deterministic idempotency key for `(actor, kind, day)`.
///
/// Lowercase hex SHA-256 of `"{actor}:{kind}:{day}"`; every retry of the same
/// action produces the same key.
pub fn dedupe_key(actor: &ActorId, kind: XpKind, day: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(actor.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(day.as_bytes());
    hex::encode(hasher.finalize())
}

/// One XP grant as stored in the remote ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpEvent {
    #[serde(rename = "user_id")]
    pub actor_id: ActorId,
    pub kind: XpKind,
    pub day: String,
    pub amount: i64,
    pub dedupe_key: String,
}

impl XpEvent {
    pub fn new(actor_id: ActorId, kind: XpKind, day: impl Into<String>, amount: i64) -> Self {
        let day = day.into();
        let dedupe_key = dedupe_key(&actor_id, kind, &day);
        Self {
            actor_id,
            kind,
            day,
            amount,
            dedupe_key,
        }
    }
}

/// Authoritative XP total for an actor with its level breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpSummary {
    pub actor_id: ActorId,
    pub total_xp: i64,
    pub progress: LevelProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names_roundtrip() {
        for kind in XpKind::ALL {
            assert_eq!(kind.as_str().parse::<XpKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("streak_bonus".parse::<XpKind>().is_err());
    }

    #[test]
    fn dedupe_key_is_stable_per_tuple() {
        let actor = ActorId::new("user-1");
        let a = dedupe_key(&actor, XpKind::DayComplete, "2024-01-05");
        let b = dedupe_key(&actor, XpKind::DayComplete, "2024-01-05");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, dedupe_key(&actor, XpKind::DayComplete, "2024-01-06"));
        assert_ne!(a, dedupe_key(&actor, XpKind::MoodCheckin, "2024-01-05"));
        assert_ne!(
            a,
            dedupe_key(&ActorId::new("user-2"), XpKind::DayComplete, "2024-01-05")
        );
    }

    #[test]
    fn event_serializes_ledger_columns() {
        let event = XpEvent::new(ActorId::new("u"), XpKind::FocusSession, "day-3", 10);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["user_id"], "u");
        assert_eq!(json["kind"], "focus_session");
        assert_eq!(json["day"], "day-3");
        assert_eq!(json["amount"], 10);
        assert_eq!(json["dedupe_key"], event.dedupe_key.as_str());
    }
}
