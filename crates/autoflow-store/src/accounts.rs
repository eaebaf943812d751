//! Connected-account storage.
//!
//! A [`CredentialRecord`] is the OAuth token pair a user granted for one
//! provider.  Records are deposited by the (external) authorization flow and
//! read, and occasionally refreshed, by the credential resolver.  There is at
//! most one record per `(user_id, provider)`: every write is an upsert.

use std::collections::HashMap;

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One stored OAuth grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub user_id: String,
    /// Provider name as used by the OAuth table (`google`, `slack`, ...).
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Expiry in epoch milliseconds; `None` means the token does not expire.
    pub expires_at: Option<i64>,
    /// Last write in epoch milliseconds.
    pub updated_at: i64,
}

impl CredentialRecord {
    /// Build a fresh record with a generated id.
    pub fn new(
        user_id: impl Into<String>,
        provider: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            provider: provider.into(),
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            updated_at: now_millis(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the access token is past its expiry at `now` (epoch millis).
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if now > expires_at)
    }
}

/// New token material produced by a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdate {
    pub access_token: String,
    /// `None` keeps the stored refresh token.
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Get/upsert access to connected accounts keyed by `(user_id, provider)`.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch the record for a user and provider, if any.
    async fn get(&self, user_id: &str, provider: &str) -> StoreResult<Option<CredentialRecord>>;

    /// Insert the record, replacing any existing one for the same pair.
    async fn upsert(&self, record: CredentialRecord) -> StoreResult<()>;

    /// Overwrite the token fields of an existing record and return it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the pair has no record.
    async fn update_tokens(
        &self,
        user_id: &str,
        provider: &str,
        update: TokenUpdate,
    ) -> StoreResult<CredentialRecord>;

    /// Providers the user has connected, sorted by name.
    async fn list_providers(&self, user_id: &str) -> StoreResult<Vec<String>>;

    /// Remove the record; returns whether one existed.
    async fn delete(&self, user_id: &str, provider: &str) -> StoreResult<bool>;
}

fn not_found(user_id: &str, provider: &str) -> StoreError {
    StoreError::NotFound {
        entity: "connected account",
        id: format!("{user_id}/{provider}"),
    }
}

// ---------------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------------

/// [`AccountStore`] backed by the `connected_accounts` table.
#[derive(Clone)]
pub struct SqliteAccountStore {
    db: Database,
}

impl SqliteAccountStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

const SELECT_RECORD: &str = "SELECT id, user_id, provider, access_token, refresh_token, expires_at, updated_at
     FROM connected_accounts WHERE user_id = ?1 AND provider = ?2";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
    Ok(CredentialRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        provider: row.get(2)?,
        access_token: row.get(3)?,
        refresh_token: row.get(4)?,
        expires_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn get(&self, user_id: &str, provider: &str) -> StoreResult<Option<CredentialRecord>> {
        let (user_id, provider) = (user_id.to_owned(), provider.to_owned());
        self.db
            .execute(move |conn| {
                let record = conn
                    .query_row(SELECT_RECORD, params![user_id, provider], row_to_record)
                    .optional()?;
                Ok(record)
            })
            .await
    }

    async fn upsert(&self, record: CredentialRecord) -> StoreResult<()> {
        if record.user_id.is_empty() || record.provider.is_empty() {
            return Err(StoreError::InvalidArgument(
                "user_id and provider must be non-empty".into(),
            ));
        }
        let provider = record.provider.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO connected_accounts
                        (id, user_id, provider, access_token, refresh_token, expires_at, updated_at, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                     ON CONFLICT (user_id, provider) DO UPDATE SET
                        access_token  = excluded.access_token,
                        refresh_token = excluded.refresh_token,
                        expires_at    = excluded.expires_at,
                        updated_at    = excluded.updated_at",
                    params![
                        record.id,
                        record.user_id,
                        record.provider,
                        record.access_token,
                        record.refresh_token,
                        record.expires_at,
                        record.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await?;
        info!(provider = %provider, "connected account stored");
        Ok(())
    }

    async fn update_tokens(
        &self,
        user_id: &str,
        provider: &str,
        update: TokenUpdate,
    ) -> StoreResult<CredentialRecord> {
        let (user_id, provider) = (user_id.to_owned(), provider.to_owned());
        self.db
            .execute(move |conn| {
                let rows = conn.execute(
                    "UPDATE connected_accounts
                     SET access_token = ?1,
                         refresh_token = COALESCE(?2, refresh_token),
                         expires_at = ?3,
                         updated_at = ?4
                     WHERE user_id = ?5 AND provider = ?6",
                    params![
                        update.access_token,
                        update.refresh_token,
                        update.expires_at,
                        now_millis(),
                        user_id,
                        provider,
                    ],
                )?;
                if rows == 0 {
                    return Err(not_found(&user_id, &provider));
                }
                debug!(provider = %provider, "connected account tokens updated");
                Ok(conn.query_row(SELECT_RECORD, params![user_id, provider], row_to_record)?)
            })
            .await
    }

    async fn list_providers(&self, user_id: &str) -> StoreResult<Vec<String>> {
        let user_id = user_id.to_owned();
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT provider FROM connected_accounts WHERE user_id = ?1 ORDER BY provider",
                )?;
                let providers = stmt
                    .query_map(params![user_id], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(providers)
            })
            .await
    }

    async fn delete(&self, user_id: &str, provider: &str) -> StoreResult<bool> {
        let (user_id, provider) = (user_id.to_owned(), provider.to_owned());
        self.db
            .execute(move |conn| {
                let rows = conn.execute(
                    "DELETE FROM connected_accounts WHERE user_id = ?1 AND provider = ?2",
                    params![user_id, provider],
                )?;
                Ok(rows > 0)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Process-local [`AccountStore`], for tests and single-binary demos.
#[derive(Default)]
pub struct MemoryAccountStore {
    records: RwLock<HashMap<(String, String), CredentialRecord>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, user_id: &str, provider: &str) -> StoreResult<Option<CredentialRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(user_id.to_owned(), provider.to_owned()))
            .cloned())
    }

    async fn upsert(&self, record: CredentialRecord) -> StoreResult<()> {
        let key = (record.user_id.clone(), record.provider.clone());
        let mut records = self.records.write().await;
        match records.get_mut(&key) {
            // Keep the original id on conflict, like the SQL upsert does.
            Some(existing) => {
                existing.access_token = record.access_token;
                existing.refresh_token = record.refresh_token;
                existing.expires_at = record.expires_at;
                existing.updated_at = record.updated_at;
            }
            None => {
                records.insert(key, record);
            }
        }
        Ok(())
    }

    async fn update_tokens(
        &self,
        user_id: &str,
        provider: &str,
        update: TokenUpdate,
    ) -> StoreResult<CredentialRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(user_id.to_owned(), provider.to_owned()))
            .ok_or_else(|| not_found(user_id, provider))?;

        record.access_token = update.access_token;
        if let Some(refresh_token) = update.refresh_token {
            record.refresh_token = Some(refresh_token);
        }
        record.expires_at = update.expires_at;
        record.updated_at = now_millis();
        Ok(record.clone())
    }

    async fn list_providers(&self, user_id: &str) -> StoreResult<Vec<String>> {
        let records = self.records.read().await;
        let mut providers: Vec<String> = records
            .keys()
            .filter(|(uid, _)| uid == user_id)
            .map(|(_, provider)| provider.clone())
            .collect();
        providers.sort();
        Ok(providers)
    }

    async fn delete(&self, user_id: &str, provider: &str) -> StoreResult<bool> {
        let mut records = self.records.write().await;
        Ok(records
            .remove(&(user_id.to_owned(), provider.to_owned()))
            .is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
