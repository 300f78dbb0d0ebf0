//! Remote ledger seam and an in-memory implementation.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{ActorId, XpEvent};
use crate::achievements::{default_catalog, Achievement, Unlock};
use crate::error::LedgerError;

/// Constraint name reported when an XP tuple collides.
pub const XP_UNIQUE_CONSTRAINT: &str = "xp_events_user_kind_day_key";

/// Authoritative store of XP events and unlocks.
///
/// Implementations enforce uniqueness of `(actor, kind, day)` for XP events
/// and report a collision as [`LedgerError::ConflictAlreadyExists`].
#[async_trait]
pub trait RewardLedger: Send + Sync {
    /// Insert one XP event; a duplicate tuple is a conflict, not a second row.
    async fn insert_xp_event(&self, event: &XpEvent) -> Result<(), LedgerError>;

    /// Insert the unlock keys the actor does not have yet. Returns how many
    /// rows were actually added.
    async fn insert_missing_unlocks(
        &self,
        actor: &ActorId,
        keys: &[String],
    ) -> Result<usize, LedgerError>;

    /// Sum of XP awarded to `actor`.
    async fn total_xp(&self, actor: &ActorId) -> Result<i64, LedgerError>;

    /// Unlocks recorded for `actor`.
    async fn unlocks(&self, actor: &ActorId) -> Result<Vec<Unlock>, LedgerError>;

    /// Achievement catalog, ordered by `sort`.
    async fn achievements(&self) -> Result<Vec<Achievement>, LedgerError>;
}

#[derive(Default)]
struct MemoryInner {
    events: Vec<XpEvent>,
    unlocks: Vec<(ActorId, Unlock)>,
    failure: Option<LedgerError>,
}

/// Ledger kept in process memory.
///
/// Useful offline and in tests; `fail_with` makes every call fail until
/// cleared.
pub struct MemoryLedger {
    inner: Mutex<MemoryInner>,
    catalog: Vec<Achievement>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::default(),
            catalog: default_catalog(),
        }
    }

    /// Make every subsequent call fail with `err` (`None` restores service).
    pub fn fail_with(&self, err: Option<LedgerError>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failure = err;
        }
    }

    /// All stored XP events.
    pub fn events(&self) -> Vec<XpEvent> {
        self.inner
            .lock()
            .map(|inner| inner.events.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, LedgerError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| LedgerError::Transient("memory ledger poisoned".into()))?;
        if let Some(err) = inner.failure.clone() {
            return Err(err);
        }
        Ok(inner)
    }
}

#[async_trait]
impl RewardLedger for MemoryLedger {
    async fn insert_xp_event(&self, event: &XpEvent) -> Result<(), LedgerError> {
        let mut inner = self.lock()?;
        let exists = inner.events.iter().any(|e| {
            (e.actor_id == event.actor_id && e.kind == event.kind && e.day == event.day)
                || e.dedupe_key == event.dedupe_key
        });
        if exists {
            return Err(LedgerError::ConflictAlreadyExists {
                constraint: XP_UNIQUE_CONSTRAINT.to_string(),
            });
        }
        inner.events.push(event.clone());
        Ok(())
    }

    async fn insert_missing_unlocks(
        &self,
        actor: &ActorId,
        keys: &[String],
    ) -> Result<usize, LedgerError> {
        let mut inner = self.lock()?;
        let mut inserted = 0;
        for key in keys {
            let present = inner
                .unlocks
                .iter()
                .any(|(a, u)| a == actor && &u.key == key);
            if !present {
                inner.unlocks.push((
                    actor.clone(),
                    Unlock {
                        key: key.clone(),
                        unlocked_at: Utc::now(),
                    },
                ));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn total_xp(&self, actor: &ActorId) -> Result<i64, LedgerError> {
        let inner = self.lock()?;
        Ok(inner
            .events
            .iter()
            .filter(|e| &e.actor_id == actor)
            .fold(0i64, |acc, e| acc.saturating_add(e.amount)))
    }

    async fn unlocks(&self, actor: &ActorId) -> Result<Vec<Unlock>, LedgerError> {
        let inner = self.lock()?;
        Ok(inner
            .unlocks
            .iter()
            .filter(|(a, _)| a == actor)
            .map(|(_, u)| u.clone())
            .collect())
    }

    async fn achievements(&self) -> Result<Vec<Achievement>, LedgerError> {
        let _inner = self.lock()?;
        let mut catalog = self.catalog.clone();
        catalog.sort_by_key(|a| a.sort);
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::XpKind;

    #[tokio::test]
    async fn duplicate_tuple_is_conflict() {
        let ledger = MemoryLedger::new();
        let actor = ActorId::new("u1");
        let event = XpEvent::new(actor.clone(), XpKind::DayComplete, "2024-01-05", 10);

        ledger.insert_xp_event(&event).await.unwrap();
        let err = ledger.insert_xp_event(&event).await.unwrap_err();
        assert!(matches!(err, LedgerError::ConflictAlreadyExists { .. }));
        assert_eq!(ledger.events().len(), 1);
        assert_eq!(ledger.total_xp(&actor).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn totals_are_per_actor() {
        let ledger = MemoryLedger::new();
        let a = ActorId::new("a");
        let b = ActorId::new("b");
        ledger
            .insert_xp_event(&XpEvent::new(a.clone(), XpKind::DayComplete, "d1", 10))
            .await
            .unwrap();
        ledger
            .insert_xp_event(&XpEvent::new(b.clone(), XpKind::DayComplete, "d1", 7))
            .await
            .unwrap();
        assert_eq!(ledger.total_xp(&a).await.unwrap(), 10);
        assert_eq!(ledger.total_xp(&b).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn total_saturates_instead_of_wrapping() {
        let ledger = MemoryLedger::new();
        let actor = ActorId::new("u1");
        ledger
            .insert_xp_event(&XpEvent::new(actor.clone(), XpKind::DayComplete, "day-1", i64::MAX))
            .await
            .unwrap();
        ledger
            .insert_xp_event(&XpEvent::new(actor.clone(), XpKind::DayComplete, "day-2", 10))
            .await
            .unwrap();
        assert_eq!(ledger.total_xp(&actor).await.unwrap(), i64::MAX);
    }

    #[tokio::test]
    async fn unlock_inserts_only_missing() {
        let ledger = MemoryLedger::new();
        let actor = ActorId::new("u1");
        let first = vec!["first_day".to_string(), "streak_3".to_string()];
        assert_eq!(ledger.insert_missing_unlocks(&actor, &first).await.unwrap(), 2);
        let second = vec!["streak_3".to_string(), "streak_7".to_string()];
        assert_eq!(ledger.insert_missing_unlocks(&actor, &second).await.unwrap(), 1);
        assert_eq!(ledger.unlocks(&actor).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn injected_failure_applies_to_every_call() {
        let ledger = MemoryLedger::new();
        ledger.fail_with(Some(LedgerError::Transient("offline".into())));
        assert!(ledger.total_xp(&ActorId::new("u")).await.is_err());
        assert!(ledger.achievements().await.is_err());
        ledger.fail_with(None);
        assert!(ledger.achievements().await.is_ok());
    }
}
