//! Daily mood check-ins.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{ensure_day, ChallengeStore, Checkin};
use crate::error::{Result, ValidationError};
use crate::storage::KeyValueStore;

/// Ordinal mood levels offered at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Terrible,
    Bad,
    Normal,
    Good,
    Super,
}

impl Mood {
    /// Score on the 1..=5 scale stored on day records.
    pub fn score(self) -> u8 {
        match self {
            Mood::Terrible => 1,
            Mood::Bad => 2,
            Mood::Normal => 3,
            Mood::Good => 4,
            Mood::Super => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Terrible => "terrible",
            Mood::Bad => "bad",
            Mood::Normal => "normal",
            Mood::Good => "good",
            Mood::Super => "super",
        }
    }
}

impl FromStr for Mood {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terrible" => Ok(Mood::Terrible),
            "bad" => Ok(Mood::Bad),
            "normal" => Ok(Mood::Normal),
            "good" => Ok(Mood::Good),
            "super" => Ok(Mood::Super),
            other => Err(ValidationError::InvalidValue {
                field: "mood".to_string(),
                message: format!("unknown mood '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a mood name to its score. Unrecognized names score 3 (neutral).
pub fn mood_to_score(mood: &str) -> u8 {
    mood.parse::<Mood>().map(Mood::score).unwrap_or(3)
}

impl<S: KeyValueStore> ChallengeStore<S> {
    /// Record a mood check-in for `day`.
    ///
    /// The score lands on the day record (latest check-in wins) and the entry
    /// is appended to the check-in history.
    pub fn save_daily_checkin(
        &mut self,
        day: u32,
        mood: &str,
        note: Option<String>,
    ) -> Result<Checkin> {
        self.check_day(day)?;
        let score = mood_to_score(mood);
        let checkin = self.update(|state| {
            ensure_day(&mut state.days, day).mood = Some(score);
            let entry = Checkin {
                day,
                mood: score,
                note,
                created_at: Utc::now(),
            };
            state.checkins.push(entry.clone());
            entry
        })?;
        Ok(checkin)
    }

    /// Whether any check-in exists for `day`.
    pub fn has_checkin_for(&mut self, day: u32) -> Result<bool> {
        let found = self.read(|state| state.checkins.iter().any(|c| c.day == day))?;
        Ok(found)
    }

    /// Every check-in recorded for `day`, oldest first.
    pub fn checkins_for(&mut self, day: u32) -> Result<Vec<Checkin>> {
        let entries = self.read(|state| {
            state
                .checkins
                .iter()
                .filter(|c| c.day == day)
                .cloned()
                .collect()
        })?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ChallengeConfig, MemoryKvStore};

    fn store() -> ChallengeStore<MemoryKvStore> {
        ChallengeStore::open(MemoryKvStore::new(), ChallengeConfig::default()).unwrap()
    }

    #[test]
    fn mood_scores() {
        assert_eq!(mood_to_score("terrible"), 1);
        assert_eq!(mood_to_score("bad"), 2);
        assert_eq!(mood_to_score("normal"), 3);
        assert_eq!(mood_to_score("good"), 4);
        assert_eq!(mood_to_score("super"), 5);
        assert_eq!(mood_to_score("Super"), 5);
        assert_eq!(mood_to_score("ecstatic"), 3);
        assert_eq!(mood_to_score(""), 3);
    }

    #[test]
    fn mood_parse_and_display() {
        assert_eq!("good".parse::<Mood>().unwrap(), Mood::Good);
        assert!("meh".parse::<Mood>().is_err());
        assert_eq!(Mood::Terrible.to_string(), "terrible");
    }

    #[test]
    fn checkin_sets_day_mood_and_appends_history() {
        let mut store = store();
        assert!(!store.has_checkin_for(3).unwrap());

        store.save_daily_checkin(3, "bad", None).unwrap();
        store
            .save_daily_checkin(3, "super", Some("better after a walk".into()))
            .unwrap();

        assert!(store.has_checkin_for(3).unwrap());
        assert!(!store.has_checkin_for(4).unwrap());
        assert_eq!(store.day(3).unwrap().unwrap().mood, Some(5));

        let history = store.checkins_for(3).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].mood, 2);
        assert_eq!(history[1].note.as_deref(), Some("better after a walk"));
        assert_eq!(store.state().days.len(), 1);
    }

    #[test]
    fn unknown_mood_is_neutral() {
        let mut store = store();
        let entry = store.save_daily_checkin(1, "confused", None).unwrap();
        assert_eq!(entry.mood, 3);
    }
}
