//! PostgREST-compatible HTTP ledger.
//!
//! Tables: `xp_events` (unique on `user_id, kind, day`), `user_achievements`
//! (unique on `user_id, achievement_key`) and `achievements`. Failures are
//! classified by HTTP status and the SQLSTATE `code` field of the error body.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::ledger::RewardLedger;
use super::{ActorId, XpEvent};
use crate::achievements::{Achievement, Unlock};
use crate::error::LedgerError;

/// PostgreSQL SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Rows requested per page when summing XP.
const TOTAL_PAGE_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AmountRow {
    amount: i64,
}

#[derive(Debug, Serialize)]
struct UnlockInsert<'a> {
    user_id: &'a str,
    achievement_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct UnlockRow {
    achievement_key: String,
    unlocked_at: DateTime<Utc>,
}

/// Map a failed response to a ledger error kind.
fn classify(status: StatusCode, body: &str) -> LedgerError {
    let code = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.code);

    if status == StatusCode::CONFLICT || code.as_deref() == Some(UNIQUE_VIOLATION) {
        return LedgerError::ConflictAlreadyExists {
            constraint: code.unwrap_or_else(|| UNIQUE_VIOLATION.to_string()),
        };
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return LedgerError::Unauthorized;
    }
    LedgerError::Transient(format!("HTTP {status}"))
}

pub struct RestLedger {
    client: Client,
    base: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RestLedger {
    /// Create a ledger client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, LedgerError> {
        let mut normalized = base_url.trim_end_matches('/').to_string();
        normalized.push('/');
        let base = Url::parse(&normalized)
            .map_err(|e| LedgerError::Transient(format!("invalid ledger url: {e}")))?;
        Ok(Self {
            client: Client::new(),
            base,
            api_key: api_key.into(),
            access_token: None,
        })
    }

    /// Send a user access token instead of the bare API key as bearer.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn endpoint(&self, table: &str) -> Result<Url, LedgerError> {
        self.base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| LedgerError::Transient(format!("invalid ledger url: {e}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    async fn check(response: Response) -> Result<Response, LedgerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body))
    }
}

#[async_trait]
impl RewardLedger for RestLedger {
    async fn insert_xp_event(&self, event: &XpEvent) -> Result<(), LedgerError> {
        let url = self.endpoint("xp_events")?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(&[event])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn insert_missing_unlocks(
        &self,
        actor: &ActorId,
        keys: &[String],
    ) -> Result<usize, LedgerError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut url = self.endpoint("user_achievements")?;
        url.query_pairs_mut()
            .append_pair("on_conflict", "user_id,achievement_key");
        let rows: Vec<UnlockInsert<'_>> = keys
            .iter()
            .map(|key| UnlockInsert {
                user_id: actor.as_str(),
                achievement_key: key,
            })
            .collect();

        let response = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=ignore-duplicates,return=representation")
            .json(&rows)
            .send()
            .await?;
        let inserted: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
        Ok(inserted.len())
    }

    /// Sums every row, paging with a stable order.
    ///
    /// The offset advances by the rows actually returned, so a server-side
    /// row cap smaller than the page size still visits every row.
    async fn total_xp(&self, actor: &ActorId) -> Result<i64, LedgerError> {
        let mut total: i64 = 0;
        let mut offset = 0usize;
        loop {
            let mut url = self.endpoint("xp_events")?;
            url.query_pairs_mut()
                .append_pair("select", "amount")
                .append_pair("user_id", &format!("eq.{}", actor.as_str()))
                .append_pair("order", "dedupe_key.asc")
                .append_pair("limit", &TOTAL_PAGE_SIZE.to_string())
                .append_pair("offset", &offset.to_string());
            let response = self.request(Method::GET, url).send().await?;
            let rows: Vec<AmountRow> = Self::check(response).await?.json().await?;
            if rows.is_empty() {
                return Ok(total);
            }
            for row in &rows {
                total = total.checked_add(row.amount).ok_or_else(|| {
                    LedgerError::Transient("xp total overflows i64".to_string())
                })?;
            }
            offset += rows.len();
        }
    }

    async fn unlocks(&self, actor: &ActorId) -> Result<Vec<Unlock>, LedgerError> {
        let mut url = self.endpoint("user_achievements")?;
        url.query_pairs_mut()
            .append_pair("select", "achievement_key,unlocked_at")
            .append_pair("user_id", &format!("eq.{}", actor.as_str()));
        let response = self.request(Method::GET, url).send().await?;
        let rows: Vec<UnlockRow> = Self::check(response).await?.json().await?;
        Ok(rows
            .into_iter()
            .map(|r| Unlock {
                key: r.achievement_key,
                unlocked_at: r.unlocked_at,
            })
            .collect())
    }

    async fn achievements(&self) -> Result<Vec<Achievement>, LedgerError> {
        let mut url = self.endpoint("achievements")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "sort.asc");
        let response = self.request(Method::GET, url).send().await?;
        let catalog: Vec<Achievement> = Self::check(response).await?.json().await?;
        Ok(catalog)
    }
}
