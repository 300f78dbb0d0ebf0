//! # Dayquest Core Library
//!
//! This library provides the core logic for the Dayquest day-by-day habit
//! challenge. It follows a CLI-first philosophy: every operation is available
//! through the standalone CLI binary, and any richer client is a thin layer
//! over the same library.
//!
//! ## Architecture
//!
//! - **Challenge**: A single locally persisted document holding day records,
//!   mood check-ins and focus sessions. Every mutation is persisted before it
//!   returns.
//! - **Progress**: Pure functions for streaks, adherence and XP levels
//! - **Achievements**: Threshold rules evaluated against the local state
//! - **Rewards**: Idempotent XP grants and unlocks against a remote ledger,
//!   submitted after the local write and never rolled back on failure
//! - **Storage**: Key-value persistence for the challenge document and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ChallengeEngine`]: Local-first orchestration of user actions
//! - [`ChallengeStore`]: Owner of the persisted challenge state
//! - [`RewardSync`]: Exactly-once reward submission
//! - [`Config`]: Application configuration management

pub mod achievements;
pub mod challenge;
pub mod engine;
pub mod error;
pub mod progress;
pub mod rewards;
pub mod storage;

pub use achievements::{Achievement, AchievementStatus, Unlock};
pub use challenge::{ChallengeState, ChallengeStore, Checkin, DayRecord, Mood, Session};
pub use engine::{ActionReport, ChallengeEngine};
pub use error::{ConfigError, CoreError, LedgerError, RewardError, StoreError, ValidationError};
pub use progress::{LevelProgress, ProgressSnapshot};
pub use rewards::{ActorId, RewardLedger, RewardSync, XpKind, XpSummary};
pub use storage::{Config, KeyValueStore, SqliteKvStore};
