//! Reward sync against the authoritative remote ledger.
//!
//! XP grants and achievement unlocks are submitted asynchronously and
//! independently of local persistence. Idempotency is the ledger's job:
//! `(actor, kind, day)` is unique, and a collision counts as success.

pub mod auth;
pub mod ledger;
pub mod rest_ledger;
pub mod sqlite_ledger;
pub mod sync;
pub mod types;

pub use auth::{AuthProvider, StaticAuth};
pub use ledger::{MemoryLedger, RewardLedger};
pub use rest_ledger::RestLedger;
pub use sqlite_ledger::SqliteLedger;
pub use sync::RewardSync;
pub use types::{day_key, dedupe_key, ActorId, XpEvent, XpKind, XpSummary};
