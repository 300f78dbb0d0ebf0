//! Idempotent reward submission.
//!
//! Exactly-once semantics come from the ledger's uniqueness constraint on
//! `(actor, kind, day)`: a repeated submission collides and the collision is
//! reported to callers as success. There is no client-side dedupe, queue or
//! retry; a transient failure is returned once.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::auth::AuthProvider;
use super::ledger::RewardLedger;
use super::{ActorId, XpEvent, XpKind, XpSummary};
use crate::achievements::{catalog_view, Achievement, AchievementStatus, Unlock};
use crate::error::{LedgerError, RewardError};
use crate::progress::level_progress;

pub struct RewardSync {
    ledger: Arc<dyn RewardLedger>,
    auth: Arc<dyn AuthProvider>,
}

impl RewardSync {
    pub fn new(ledger: Arc<dyn RewardLedger>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { ledger, auth }
    }

    fn actor(&self) -> Result<ActorId, RewardError> {
        self.auth.current_actor().ok_or(RewardError::NotSignedIn)
    }

    /// Grant `amount` XP for `kind` on `day` to the signed-in actor.
    ///
    /// A first award and a repeat of an existing one both return `Ok(())`.
    ///
    /// # Errors
    /// [`RewardError::NotSignedIn`] without an actor (nothing is sent);
    /// [`RewardError::Remote`] for any other ledger failure.
    pub async fn award_xp(&self, kind: XpKind, day: &str, amount: i64) -> Result<(), RewardError> {
        let actor = self.actor()?;
        let event = XpEvent::new(actor, kind, day, amount);
        match self.ledger.insert_xp_event(&event).await {
            Ok(()) => {
                tracing::debug!(kind = %kind, day, amount, "xp awarded");
                Ok(())
            }
            Err(LedgerError::ConflictAlreadyExists { constraint }) => {
                tracing::debug!(kind = %kind, day, %constraint, "xp already awarded");
                Ok(())
            }
            Err(err) => Err(RewardError::Remote(err)),
        }
    }

    /// Record unlocks for keys the actor does not have yet.
    ///
    /// Best effort: an empty set or a signed-out actor is a no-op, and ledger
    /// failures are logged rather than returned. Returns how many unlocks were
    /// newly recorded.
    pub async fn unlock_on_server(&self, keys: &BTreeSet<String>) -> usize {
        if keys.is_empty() {
            return 0;
        }
        let Ok(actor) = self.actor() else {
            tracing::debug!("skipping unlock submission: not signed in");
            return 0;
        };

        let missing: Vec<String> = match self.ledger.unlocks(&actor).await {
            Ok(existing) => keys
                .iter()
                .filter(|k| !existing.iter().any(|u| &u.key == *k))
                .cloned()
                .collect(),
            Err(err) => {
                tracing::debug!(error = %err, "could not read unlocks, submitting all");
                keys.iter().cloned().collect()
            }
        };
        if missing.is_empty() {
            return 0;
        }

        match self.ledger.insert_missing_unlocks(&actor, &missing).await {
            Ok(inserted) => inserted,
            Err(err) => {
                tracing::warn!(error = %err, "unlock submission failed");
                0
            }
        }
    }

    /// Authoritative XP total with its level breakdown.
    pub async fn load_aggregate_xp(&self) -> Result<XpSummary, RewardError> {
        let actor = self.actor()?;
        let total_xp = self.ledger.total_xp(&actor).await?;
        Ok(XpSummary {
            actor_id: actor,
            total_xp,
            progress: level_progress(total_xp),
        })
    }

    /// Unlocks recorded for the signed-in actor.
    pub async fn load_unlocks(&self) -> Result<Vec<Unlock>, RewardError> {
        let actor = self.actor()?;
        Ok(self.ledger.unlocks(&actor).await?)
    }

    /// Achievement catalog ordered by `sort`.
    pub async fn load_catalog(&self) -> Result<Vec<Achievement>, RewardError> {
        Ok(self.ledger.achievements().await?)
    }

    /// Catalog merged with the actor's unlocks.
    pub async fn load_achievement_status(&self) -> Result<Vec<AchievementStatus>, RewardError> {
        let unlocks = self.load_unlocks().await?;
        let catalog = self.load_catalog().await?;
        Ok(catalog_view(&catalog, &unlocks))
    }
}
