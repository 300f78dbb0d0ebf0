//! Challenge engine: local record first, remote rewards second.
//!
//! Each user action is persisted locally and becomes visible before its
//! reward is submitted. The remote outcome is reported alongside the local
//! result and never rolls the local change back.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::achievements::compute_unlocks_from_state;
use crate::challenge::{ensure_day, ChallengeStore, Checkin, Session};
use crate::error::{RewardError, Result};
use crate::progress::ProgressSnapshot;
use crate::rewards::{day_key, RewardSync, XpKind, XpSummary};
use crate::storage::{Config, KeyValueStore, RewardsConfig};

/// Result of one user action.
#[derive(Debug, Clone)]
pub struct ActionReport<T> {
    /// What was persisted locally.
    pub local: T,
    /// XP credited to the local cache by this action (0 on repeats).
    pub local_xp: i64,
    /// Outcome of the reward submission. A repeat award is `Ok(())`.
    pub remote: Result<(), RewardError>,
}

impl<T: Serialize> ActionReport<T> {
    /// JSON view with the remote outcome flattened to a status string.
    pub fn to_json(&self) -> serde_json::Value {
        let reward = match &self.remote {
            Ok(()) => "ok".to_string(),
            Err(RewardError::NotSignedIn) => "not_signed_in".to_string(),
            Err(err) => format!("failed: {err}"),
        };
        serde_json::json!({
            "local": self.local,
            "local_xp": self.local_xp,
            "reward": reward,
        })
    }
}

pub struct ChallengeEngine<S: KeyValueStore> {
    store: ChallengeStore<S>,
    rewards: RewardsConfig,
    sync: RewardSync,
}

impl<S: KeyValueStore> ChallengeEngine<S> {
    pub fn new(store: ChallengeStore<S>, rewards: RewardsConfig, sync: RewardSync) -> Self {
        Self {
            store,
            rewards,
            sync,
        }
    }

    /// Open the local store described by `config` and wire it to `sync`.
    pub fn from_config(kv: S, config: &Config, sync: RewardSync) -> Result<Self> {
        let store = ChallengeStore::open(kv, config.challenge.clone())?;
        Ok(Self::new(store, config.rewards.clone(), sync))
    }

    pub fn store(&self) -> &ChallengeStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ChallengeStore<S> {
        &mut self.store
    }

    pub fn sync(&self) -> &RewardSync {
        &self.sync
    }

    async fn submit(&self, kind: XpKind, day: u32) -> Result<(), RewardError> {
        let amount = self.rewards.amount_for(kind);
        self.sync.award_xp(kind, &day_key(day), amount).await
    }

    /// Mark `day` completed, award `day_complete` and push new unlocks.
    pub async fn complete_day(&mut self, day: u32) -> Result<ActionReport<bool>> {
        self.store.check_day(day)?;
        let amount = self.rewards.amount_for(XpKind::DayComplete);
        let (newly_completed, credited) = self.store.update(|state| {
            let record = ensure_day(&mut state.days, day);
            let newly_completed = !record.completed;
            record.completed = true;
            let credited = state.credit_local_xp(day, XpKind::DayComplete, amount);
            (newly_completed, credited)
        })?;

        let remote = self.submit(XpKind::DayComplete, day).await;
        self.sync_unlocks().await?;
        Ok(ActionReport {
            local: newly_completed,
            local_xp: if credited { amount } else { 0 },
            remote,
        })
    }

    /// Clear the completion flag. XP already earned is kept.
    pub fn uncomplete_day(&mut self, day: u32) -> Result<bool> {
        self.store.set_day_completed(day, false)
    }

    /// Record a mood check-in and award `mood_checkin`.
    pub async fn checkin(
        &mut self,
        day: u32,
        mood: &str,
        note: Option<String>,
    ) -> Result<ActionReport<Checkin>> {
        let checkin = self.store.save_daily_checkin(day, mood, note)?;
        let local_xp = self.credit(day, XpKind::MoodCheckin)?;
        let remote = self.submit(XpKind::MoodCheckin, day).await;
        self.sync_unlocks().await?;
        Ok(ActionReport {
            local: checkin,
            local_xp,
            remote,
        })
    }

    /// Record a finished focus session and award `focus_session`.
    pub async fn complete_session(
        &mut self,
        day: u32,
        minutes: u32,
        note: Option<String>,
    ) -> Result<ActionReport<Session>> {
        let session = self.store.save_completed_session(day, minutes, note)?;
        let local_xp = self.credit(day, XpKind::FocusSession)?;
        let remote = self.submit(XpKind::FocusSession, day).await;
        self.sync_unlocks().await?;
        Ok(ActionReport {
            local: session,
            local_xp,
            remote,
        })
    }

    /// Award any other activity kind (tiny habit, task, flashcards, weekly
    /// retro) for `day`.
    pub async fn award_activity(&mut self, kind: XpKind, day: u32) -> Result<ActionReport<XpKind>> {
        self.store.check_day(day)?;
        let local_xp = self.credit(day, kind)?;
        let remote = self.submit(kind, day).await;
        self.sync_unlocks().await?;
        Ok(ActionReport {
            local: kind,
            local_xp,
            remote,
        })
    }

    fn credit(&mut self, day: u32, kind: XpKind) -> Result<i64> {
        let amount = self.rewards.amount_for(kind);
        let credited = self
            .store
            .update(|state| state.credit_local_xp(day, kind, amount))?;
        Ok(if credited { amount } else { 0 })
    }

    /// Evaluate unlocks against the current state and submit new ones.
    ///
    /// Returns the evaluated key set. Submission is best effort.
    pub async fn sync_unlocks(&mut self) -> Result<BTreeSet<String>> {
        let keys = self.store.read(compute_unlocks_from_state)?;
        self.sync.unlock_on_server(&keys).await;
        Ok(keys)
    }

    /// Replace the local XP cache with the ledger's authoritative total.
    pub async fn resync_xp(&mut self) -> Result<XpSummary> {
        let summary = self.sync.load_aggregate_xp().await?;
        let previous = self.store.update(|state| {
            let previous = state.xp;
            state.xp = summary.total_xp;
            previous
        })?;
        if previous != summary.total_xp {
            tracing::info!(
                local = previous,
                remote = summary.total_xp,
                "local xp resynced from ledger"
            );
        }
        Ok(summary)
    }

    /// Progress metrics as of the actor's local today.
    pub fn progress(&mut self) -> Result<ProgressSnapshot> {
        let today = self.store.challenge().local_today();
        self.progress_on(today)
    }

    /// Progress metrics as of `today`.
    pub fn progress_on(&mut self, today: NaiveDate) -> Result<ProgressSnapshot> {
        let length = self.store.challenge().length_days;
        let state = self.store.read(|state| state.clone())?;
        let today_index = self.store.today_index_on(&state, today);
        Ok(ProgressSnapshot::from_state(&state, today_index, length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, LedgerError};
    use crate::rewards::{ActorId, MemoryLedger, RewardLedger, StaticAuth};
    use crate::storage::{ChallengeConfig, MemoryKvStore};
    use std::sync::Arc;

    struct Harness {
        ledger: Arc<MemoryLedger>,
        auth: Arc<StaticAuth>,
        engine: ChallengeEngine<MemoryKvStore>,
    }

    fn harness(challenge: ChallengeConfig) -> Harness {
        let ledger = Arc::new(MemoryLedger::new());
        let auth = Arc::new(StaticAuth::signed_in(ActorId::new("user-1")));
        let sync = RewardSync::new(ledger.clone(), auth.clone());
        let store = ChallengeStore::open(MemoryKvStore::new(), challenge).unwrap();
        let engine = ChallengeEngine::new(store, RewardsConfig::default(), sync);
        Harness {
            ledger,
            auth,
            engine,
        }
    }

    fn start_2024() -> ChallengeConfig {
        ChallengeConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..ChallengeConfig::default()
        }
    }

    #[tokio::test]
    async fn complete_day_is_local_then_remote() {
        let mut h = harness(start_2024());
        let report = h.engine.complete_day(5).await.unwrap();
        assert!(report.local);
        assert_eq!(report.local_xp, 10);
        assert!(report.remote.is_ok());

        let events = h.ledger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].day, "day-5");
        assert_eq!(events[0].kind, XpKind::DayComplete);
    }

    #[tokio::test]
    async fn repeating_complete_day_does_not_double_award() {
        let mut h = harness(start_2024());
        h.engine.complete_day(5).await.unwrap();
        let again = h.engine.complete_day(5).await.unwrap();
        assert!(!again.local);
        assert_eq!(again.local_xp, 0);
        assert!(again.remote.is_ok());
        assert_eq!(h.ledger.events().len(), 1);
        assert_eq!(h.engine.store().state().xp, 10);
    }

    #[tokio::test]
    async fn local_change_survives_remote_failure() {
        let mut h = harness(ChallengeConfig::default());
        h.ledger
            .fail_with(Some(LedgerError::Transient("offline".into())));
        let report = h.engine.complete_day(1).await.unwrap();
        assert!(matches!(report.remote, Err(RewardError::Remote(_))));
        assert!(h.engine.store_mut().get_day_completed(1).unwrap());

        h.ledger.fail_with(None);
        let replay = h.engine.complete_day(1).await.unwrap();
        assert!(replay.remote.is_ok());
        assert_eq!(h.ledger.events().len(), 1);
    }

    #[tokio::test]
    async fn signed_out_actions_still_persist() {
        let mut h = harness(ChallengeConfig::default());
        h.auth.sign_out();
        let report = h.engine.checkin(2, "good", None).await.unwrap();
        assert_eq!(report.remote, Err(RewardError::NotSignedIn));
        assert_eq!(report.local.mood, 4);
        assert!(h.engine.store_mut().has_checkin_for(2).unwrap());
        assert!(h.ledger.events().is_empty());
    }

    #[tokio::test]
    async fn sessions_award_once_per_day() {
        let mut h = harness(ChallengeConfig::default());
        let first = h.engine.complete_session(3, 25, None).await.unwrap();
        let second = h.engine.complete_session(3, 25, None).await.unwrap();
        assert_eq!(first.local_xp, 10);
        assert_eq!(second.local_xp, 0);
        assert_eq!(h.ledger.events().len(), 1);
        assert_eq!(
            h.engine.store_mut().day(3).unwrap().unwrap().habit_minutes,
            50
        );
    }

    #[tokio::test]
    async fn activity_kinds_use_configured_amounts() {
        let mut h = harness(ChallengeConfig::default());
        let report = h
            .engine
            .award_activity(XpKind::WeeklyRetro, 7)
            .await
            .unwrap();
        assert_eq!(report.local_xp, 25);
        assert_eq!(h.ledger.events()[0].day, "day-7");
    }

    #[tokio::test]
    async fn out_of_range_day_is_rejected_before_any_write() {
        let mut h = harness(ChallengeConfig::default());
        let err = h.engine.complete_day(31).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(h.ledger.events().is_empty());
        assert!(h.engine.store().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn unlocks_follow_progress() {
        let mut h = harness(ChallengeConfig::default());
        for day in 1..=3 {
            h.engine.complete_day(day).await.unwrap();
        }
        let keys = h.engine.sync_unlocks().await.unwrap();
        assert!(keys.contains("first_day"));
        assert!(keys.contains("streak_3"));
        let remote = h
            .ledger
            .unlocks(&ActorId::new("user-1"))
            .await
            .unwrap();
        assert_eq!(remote.len(), keys.len());
    }

    #[tokio::test]
    async fn resync_overwrites_local_cache() {
        let mut h = harness(ChallengeConfig::default());
        h.engine.complete_day(1).await.unwrap();
        h.engine.store_mut().update(|s| s.xp = 999).unwrap();

        let summary = h.engine.resync_xp().await.unwrap();
        assert_eq!(summary.total_xp, 10);
        assert_eq!(h.engine.store().state().xp, 10);
    }

    #[tokio::test]
    async fn resync_failure_leaves_cache_alone() {
        let mut h = harness(ChallengeConfig::default());
        h.engine.store_mut().update(|s| s.xp = 42).unwrap();
        h.auth.sign_out();
        assert!(h.engine.resync_xp().await.is_err());
        assert_eq!(h.engine.store().state().xp, 42);
    }

    #[tokio::test]
    async fn progress_uses_calendar_today() {
        let mut h = harness(start_2024());
        for day in 1..=4 {
            h.engine.complete_day(day).await.unwrap();
        }
        let on_day_5 = h
            .engine
            .progress_on(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .unwrap();
        assert_eq!(on_day_5.today_index, 5);
        assert_eq!(on_day_5.streak, 4);

        let on_day_7 = h
            .engine
            .progress_on(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap())
            .unwrap();
        assert_eq!(on_day_7.streak, 0);
        assert_eq!(on_day_7.completed_days, 4);
        assert_eq!(on_day_7.level.xp, 40);
    }
}
