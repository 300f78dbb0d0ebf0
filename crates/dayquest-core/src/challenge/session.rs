//! Timed focus session log.

use chrono::Utc;
use uuid::Uuid;

use super::{ensure_day, ChallengeStore, Session};
use crate::error::Result;
use crate::storage::KeyValueStore;

/// Minutes credited to a day after its session list changed.
///
/// The sum over sessions, or `fallback` when that sum is zero.
pub fn recompute_habit_minutes(sessions: &[Session], fallback: u32) -> u32 {
    let total = sessions
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.minutes));
    if total == 0 {
        fallback
    } else {
        total
    }
}

impl<S: KeyValueStore> ChallengeStore<S> {
    /// Append a finished session of `minutes` to `day`.
    ///
    /// Duration is caller-supplied; start and end are both stamped now.
    /// `habit_minutes` is recomputed from the full session list, overwriting
    /// any direct assignment.
    pub fn save_completed_session(
        &mut self,
        day: u32,
        minutes: u32,
        note: Option<String>,
    ) -> Result<Session> {
        self.check_day(day)?;
        let session = self.update(|state| {
            let record = ensure_day(&mut state.days, day);
            let now = Utc::now();
            let session = Session {
                id: Uuid::new_v4().to_string(),
                minutes,
                started_at: now,
                ended_at: now,
                note,
            };
            record.sessions.push(session.clone());
            record.habit_minutes = recompute_habit_minutes(&record.sessions, minutes);
            session
        })?;
        Ok(session)
    }

    /// Directly assign `habit_minutes` for `day`.
    pub fn set_habit_minutes(&mut self, day: u32, minutes: u32) -> Result<()> {
        self.check_day(day)?;
        self.update(|state| ensure_day(&mut state.days, day).habit_minutes = minutes)?;
        Ok(())
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
    fn habit_minutes_is_sum_of_sessions() {
        let mut store = store();
        store.save_completed_session(3, 10, None).unwrap();
        store.save_completed_session(3, 15, None).unwrap();
        assert_eq!(store.day(3).unwrap().unwrap().habit_minutes, 25);

        store.save_completed_session(3, 5, None).unwrap();
        let day = store.day(3).unwrap().unwrap();
        assert_eq!(day.habit_minutes, 30);
        assert_eq!(day.sessions.len(), 3);
    }

    #[test]
    fn session_ids_are_unique_and_stamped() {
        let mut store = store();
        let a = store.save_completed_session(1, 25, Some("deep work".into())).unwrap();
        let b = store.save_completed_session(1, 25, None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.started_at, a.ended_at);
        assert_eq!(a.note.as_deref(), Some("deep work"));
    }

    #[test]
    fn direct_override_is_clobbered_by_next_session() {
        let mut store = store();
        store.save_completed_session(2, 20, None).unwrap();
        store.set_habit_minutes(2, 90).unwrap();
        assert_eq!(store.day(2).unwrap().unwrap().habit_minutes, 90);

        store.save_completed_session(2, 10, None).unwrap();
        assert_eq!(store.day(2).unwrap().unwrap().habit_minutes, 30);
    }

    #[test]
    fn recompute_is_deterministic() {
        let now = Utc::now();
        let sessions: Vec<Session> = [10, 0, 7]
            .iter()
            .map(|&m| Session {
                id: format!("s-{m}"),
                minutes: m,
                started_at: now,
                ended_at: now,
                note: None,
            })
            .collect();
        assert_eq!(recompute_habit_minutes(&sessions, 99), 17);
        assert_eq!(recompute_habit_minutes(&sessions, 99), 17);
    }

    #[test]
    fn zero_sum_falls_back_to_argument() {
        assert_eq!(recompute_habit_minutes(&[], 12), 12);
    }
}
