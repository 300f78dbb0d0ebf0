//! SQLite ledger.
//!
//! Mirrors the remote schema locally: `UNIQUE(user_id, kind, day)` on
//! `xp_events` and a composite primary key on `user_achievements`, so the
//! same idempotency rules hold without a network.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::ledger::RewardLedger;
use super::{ActorId, XpEvent};
use crate::achievements::{default_catalog, Achievement, Unlock};
use crate::error::LedgerError;

pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open_at(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.migrate()?;
        Ok(ledger)
    }

    /// Open an in-memory ledger.
    pub fn open_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.migrate()?;
        Ok(ledger)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Transient("ledger connection poisoned".into()))
    }

    fn migrate(&self) -> Result<(), LedgerError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS xp_events (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL,
                kind        TEXT NOT NULL,
                day         TEXT NOT NULL,
                amount      INTEGER NOT NULL,
                dedupe_key  TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL,
                UNIQUE (user_id, kind, day)
            );

            CREATE TABLE IF NOT EXISTS user_achievements (
                user_id         TEXT NOT NULL,
                achievement_key TEXT NOT NULL,
                unlocked_at     TEXT NOT NULL,
                PRIMARY KEY (user_id, achievement_key)
            );

            CREATE TABLE IF NOT EXISTS achievements (
                key         TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT,
                tier        TEXT,
                icon        TEXT,
                target      INTEGER,
                sort        INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_xp_events_user ON xp_events(user_id);",
        )?;

        for a in default_catalog() {
            conn.execute(
                "INSERT OR IGNORE INTO achievements (key, title, description, tier, icon, target, sort)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![a.key, a.title, a.description, a.tier, a.icon, a.target, a.sort],
            )?;
        }
        Ok(())
    }
}

fn parse_time(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl RewardLedger for SqliteLedger {
    async fn insert_xp_event(&self, event: &XpEvent) -> Result<(), LedgerError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO xp_events (user_id, kind, day, amount, dedupe_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.actor_id.as_str(),
                event.kind.as_str(),
                event.day,
                event.amount,
                event.dedupe_key,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn insert_missing_unlocks(
        &self,
        actor: &ActorId,
        keys: &[String],
    ) -> Result<usize, LedgerError> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;
        for key in keys {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO user_achievements (user_id, achievement_key, unlocked_at)
                 VALUES (?1, ?2, ?3)",
                params![actor.as_str(), key, now],
            )?;
        }
        Ok(inserted)
    }

    async fn total_xp(&self, actor: &ActorId) -> Result<i64, LedgerError> {
        let conn = self.conn()?;
        let total = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM xp_events WHERE user_id = ?1",
            params![actor.as_str()],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(total)
    }

    async fn unlocks(&self, actor: &ActorId) -> Result<Vec<Unlock>, LedgerError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT achievement_key, unlocked_at FROM user_achievements
             WHERE user_id = ?1 ORDER BY unlocked_at, achievement_key",
        )?;
        let rows = stmt.query_map(params![actor.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut unlocks = Vec::new();
        for row in rows {
            let (key, unlocked_at) = row?;
            unlocks.push(Unlock {
                key,
                unlocked_at: parse_time(&unlocked_at),
            });
        }
        Ok(unlocks)
    }

    async fn achievements(&self) -> Result<Vec<Achievement>, LedgerError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, title, description, tier, icon, target, sort
             FROM achievements ORDER BY sort, key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Achievement {
                key: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                tier: row.get(3)?,
                icon: row.get(4)?,
                target: row.get(5)?,
                sort: row.get(6)?,
            })
        })?;
        let catalog = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(catalog)
    }
}
