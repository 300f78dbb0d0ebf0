//! Owner of the persisted challenge document.

use chrono::NaiveDate;

use super::ChallengeState;
use crate::error::{StoreError, ValidationError};
use crate::progress::{compute_streak, current_day_index};
use crate::storage::{ChallengeConfig, KeyValueStore};

/// Key the serialized [`ChallengeState`] lives under.
pub const STATE_KEY: &str = "challenge_state";

/// Owns the single in-memory copy of the challenge state.
///
/// Every mutation goes through [`ChallengeStore::update`], which reloads the
/// document, applies the change, refreshes the cached streak and persists
/// before returning. Callers only ever receive owned snapshots, so nothing can
/// outlive a persist boundary. One writer per device session is assumed.
pub struct ChallengeStore<S: KeyValueStore> {
    kv: S,
    challenge: ChallengeConfig,
    current: ChallengeState,
}

impl<S: KeyValueStore> ChallengeStore<S> {
    /// Wrap a key-value backend and read whatever state it already holds.
    pub fn open(kv: S, challenge: ChallengeConfig) -> Result<Self, StoreError> {
        let mut store = Self {
            kv,
            challenge,
            current: ChallengeState::default(),
        };
        store.current = store.load()?.unwrap_or_default();
        Ok(store)
    }

    /// Read the persisted document.
    ///
    /// Returns `None` on first run. A document that fails to parse is
    /// replaced by an empty default state rather than reported.
    pub fn load(&self) -> Result<Option<ChallengeState>, StoreError> {
        let Some(raw) = self.kv.get(STATE_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<ChallengeState>(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                tracing::warn!(error = %e, "challenge state unreadable, resetting to default");
                Ok(Some(ChallengeState::default()))
            }
        }
    }

    /// Persist `state` wholesale and make it the in-memory copy.
    pub fn save(&mut self, state: ChallengeState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&state)?;
        self.kv.set(STATE_KEY, &raw)?;
        self.current = state;
        Ok(())
    }

    /// Load, mutate and persist in one step.
    pub fn update<R>(
        &mut self,
        mutate: impl FnOnce(&mut ChallengeState) -> R,
    ) -> Result<R, StoreError> {
        let mut state = self.load()?.unwrap_or_default();
        let out = mutate(&mut state);
        state.streak = compute_streak(&state.days, self.today_index(&state));
        self.save(state)?;
        Ok(out)
    }

    /// Read-only access to the freshly loaded state.
    ///
    /// Absent state reads as an empty default; nothing is written.
    pub fn read<R>(&mut self, f: impl FnOnce(&ChallengeState) -> R) -> Result<R, StoreError> {
        self.current = self.load()?.unwrap_or_default();
        Ok(f(&self.current))
    }

    /// The last loaded or persisted copy.
    pub fn state(&self) -> &ChallengeState {
        &self.current
    }

    pub fn challenge(&self) -> &ChallengeConfig {
        &self.challenge
    }

    pub fn backend(&self) -> &S {
        &self.kv
    }

    /// Reject day indices outside `1..=length_days`.
    pub fn check_day(&self, day: u32) -> Result<(), ValidationError> {
        if day == 0 || day > self.challenge.length_days {
            return Err(ValidationError::DayOutOfRange {
                day,
                length: self.challenge.length_days,
            });
        }
        Ok(())
    }

    /// Challenge day index of the actor's local "today".
    pub(crate) fn today_index(&self, state: &ChallengeState) -> u32 {
        self.today_index_on(state, self.challenge.local_today())
    }

    pub(crate) fn today_index_on(&self, state: &ChallengeState, today: NaiveDate) -> u32 {
        current_day_index(
            self.challenge.start_date,
            today,
            self.challenge.length_days,
            &state.days,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;

    fn store() -> ChallengeStore<MemoryKvStore> {
        ChallengeStore::open(MemoryKvStore::new(), ChallengeConfig::default()).unwrap()
    }

    #[test]
    fn load_is_none_on_first_run() {
        let store = store();
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.state(), &ChallengeState::default());
    }

    #[test]
    fn corrupt_document_resets_to_default() {
        let kv = MemoryKvStore::new();
        kv.set(STATE_KEY, "{not json").unwrap();
        let store = ChallengeStore::open(kv, ChallengeConfig::default()).unwrap();
        assert_eq!(store.load().unwrap(), Some(ChallengeState::default()));
    }

    #[test]
    fn update_persists_before_returning() {
        let mut store = store();
        store.update(|s| s.xp = 42).unwrap();
        let raw = store.backend().get(STATE_KEY).unwrap().unwrap();
        let persisted: ChallengeState = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.xp, 42);
        assert_eq!(store.state().xp, 42);
    }

    #[test]
    fn update_sees_external_writes() {
        let mut store = store();
        store.update(|s| s.xp = 1).unwrap();
        let mut other = store.state().clone();
        other.xp = 99;
        store
            .backend()
            .set(STATE_KEY, &serde_json::to_string(&other).unwrap())
            .unwrap();
        let seen = store.update(|s| s.xp).unwrap();
        assert_eq!(seen, 99);
    }

    #[test]
    fn check_day_bounds() {
        let store = store();
        assert!(store.check_day(1).is_ok());
        assert!(store.check_day(30).is_ok());
        assert_eq!(
            store.check_day(0),
            Err(ValidationError::DayOutOfRange { day: 0, length: 30 })
        );
        assert!(store.check_day(31).is_err());
    }
}
