//! Tiered credential resolution.
//!
//! A logical key (`SLACK_BOT_TOKEN`, `GOOGLE_ACCESS_TOKEN`, ...) is resolved
//! by asking an ordered chain of [`CredentialTier`]s.  The first tier that
//! returns [`TierOutcome::Found`] wins; a tier that returns an error stops
//! the chain.  The standard chain is:
//!
//! 1. [`OverrideTier`]: caller-supplied per-request values.
//! 2. [`EnvironmentTier`]: process (or fixed) environment variables.
//! 3. [`StoredAccountTier`]: the user's connected account, refreshed
//!    through the provider's token endpoint when expired.
//!
//! Token values are never logged.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use autoflow_store::{AccountStore, CredentialRecord, TokenUpdate, now_millis};

use crate::error::{CredentialError, Result};
use crate::oauth::TokenRefresher;
use crate::providers::{ProviderTable, provider_for_key};

/// Per-request credential overrides, keyed by logical credential key.
pub type CredentialOverrides = HashMap<String, String>;

/// One credential lookup.
#[derive(Debug, Clone, Copy)]
pub struct CredentialRequest<'a> {
    /// Logical credential key.
    pub key: &'a str,
    /// Overrides supplied with the request, if any.
    pub overrides: Option<&'a CredentialOverrides>,
    /// Identity of the requesting user, if known.
    pub user_id: Option<&'a str>,
}

/// Result of asking a single tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    /// The tier produced a value.
    Found(String),
    /// The tier has nothing for this key; ask the next one.
    NotFound,
}

/// A source of credential values.
#[async_trait]
pub trait CredentialTier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Look up the requested key.
    ///
    /// Return `Ok(NotFound)` to defer to the next tier; return `Err` only
    /// when the key definitely belongs to this tier but cannot be produced
    /// (e.g. an expired grant that cannot be refreshed).
    async fn lookup(&self, request: &CredentialRequest<'_>) -> Result<TierOutcome>;
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Walks a chain of tiers to produce a credential value.
pub struct CredentialResolver {
    tiers: Vec<Box<dyn CredentialTier>>,
}

impl CredentialResolver {
    /// Resolver over an explicit tier chain, consulted in order.
    pub fn new(tiers: Vec<Box<dyn CredentialTier>>) -> Self {
        Self { tiers }
    }

    /// The standard override → environment → stored-account chain.
    pub fn standard(
        environment: EnvironmentTier,
        accounts: Arc<dyn AccountStore>,
        providers: ProviderTable,
    ) -> Self {
        Self::new(vec![
            Box::new(OverrideTier),
            Box::new(environment),
            Box::new(StoredAccountTier::new(
                accounts,
                TokenRefresher::new(providers),
            )),
        ])
    }

    /// Override and environment tiers only; nothing is read from storage.
    pub fn without_accounts(environment: EnvironmentTier) -> Self {
        Self::new(vec![Box::new(OverrideTier), Box::new(environment)])
    }

    /// Resolve `key` to a credential value.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::MissingCredential`] when no tier has a value.
    /// - [`CredentialError::CredentialExpiredNoRefresh`] or
    ///   [`CredentialError::CredentialRefreshFailed`] when the stored grant
    ///   is expired and cannot be renewed.
    pub async fn resolve(
        &self,
        key: &str,
        overrides: Option<&CredentialOverrides>,
        user_id: Option<&str>,
    ) -> Result<String> {
        let request = CredentialRequest {
            key,
            overrides,
            user_id,
        };

        for tier in &self.tiers {
            match tier.lookup(&request).await? {
                TierOutcome::Found(value) => {
                    tracing::debug!(key, tier = tier.name(), "credential resolved");
                    return Ok(value);
                }
                TierOutcome::NotFound => continue,
            }
        }

        tracing::debug!(key, "credential not found in any tier");
        Err(CredentialError::MissingCredential {
            key: key.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tier: overrides
// ---------------------------------------------------------------------------

/// Per-request overrides.  Empty strings count as absent.
pub struct OverrideTier;

#[async_trait]
impl CredentialTier for OverrideTier {
    fn name(&self) -> &'static str {
        "override"
    }

    async fn lookup(&self, request: &CredentialRequest<'_>) -> Result<TierOutcome> {
        Ok(request
            .overrides
            .and_then(|o| o.get(request.key))
            .filter(|v| !v.is_empty())
            .map_or(TierOutcome::NotFound, |v| TierOutcome::Found(v.clone())))
    }
}

// ---------------------------------------------------------------------------
// Tier: environment
// ---------------------------------------------------------------------------

/// Environment variables named exactly like the logical key.
pub struct EnvironmentTier {
    fixed: Option<HashMap<String, String>>,
}

impl EnvironmentTier {
    /// Read from the live process environment.
    pub fn from_process() -> Self {
        Self { fixed: None }
    }

    /// Read from a fixed map instead of the process environment.
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self { fixed: Some(vars) }
    }

    fn get(&self, key: &str) -> Option<String> {
        match &self.fixed {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }
}

#[async_trait]
impl CredentialTier for EnvironmentTier {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn lookup(&self, request: &CredentialRequest<'_>) -> Result<TierOutcome> {
        Ok(self
            .get(request.key)
            .filter(|v| !v.is_empty())
            .map_or(TierOutcome::NotFound, TierOutcome::Found))
    }
}

// ---------------------------------------------------------------------------
// Tier: stored accounts
// ---------------------------------------------------------------------------

/// What a stored record means for the caller, at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredToken {
    /// The access token is usable as-is.
    Valid(String),
    /// Expired; renew with this refresh token.
    NeedsRefresh(String),
    /// Expired and nothing to renew with.
    ExpiredNoRefresh,
}

/// Classify `record` at `now` (epoch millis).  Pure.
pub fn classify(record: &CredentialRecord, now: i64) -> StoredToken {
    if !record.is_expired_at(now) {
        return StoredToken::Valid(record.access_token.clone());
    }
    match record.refresh_token.as_deref() {
        Some(rt) if !rt.is_empty() => StoredToken::NeedsRefresh(rt.to_string()),
        _ => StoredToken::ExpiredNoRefresh,
    }
}

/// The user's connected accounts, refreshed on demand.
///
/// Refreshes for the same `(user, provider)` pair are serialized: the second
/// caller waits on the first and then re-reads the record, so a burst of
/// concurrent lookups hits the token endpoint once.
pub struct StoredAccountTier {
    accounts: Arc<dyn AccountStore>,
    refresher: TokenRefresher,
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl StoredAccountTier {
    pub fn new(accounts: Arc<dyn AccountStore>, refresher: TokenRefresher) -> Self {
        Self {
            accounts,
            refresher,
            locks: DashMap::new(),
        }
    }

    /// Refresh the pair's grant and write the new tokens back.
    ///
    /// Returns the access token to use.  If another task refreshed the pair
    /// while we waited for the lock, its result is used instead.
    ///
    /// The pair's lock entry is dropped again once no other caller holds it,
    /// so the lock map only holds pairs with a refresh in flight.
    pub async fn refresh_and_persist(&self, user_id: &str, provider: &str) -> Result<String> {
        let key = (user_id.to_string(), provider.to_string());
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.refresh_locked(user_id, provider).await
        };
        // One reference is the map's, one is ours.
        self.locks.remove_if(&key, |_, held| Arc::strong_count(held) == 2);
        result
    }

    async fn refresh_locked(&self, user_id: &str, provider: &str) -> Result<String> {
        let Some(record) = self.accounts.get(user_id, provider).await? else {
            return Err(CredentialError::CredentialExpiredNoRefresh {
                provider: provider.to_string(),
            });
        };

        let refresh_token = match classify(&record, now_millis()) {
            StoredToken::Valid(token) => {
                tracing::debug!(user_id, provider, "token already refreshed by another task");
                return Ok(token);
            }
            StoredToken::NeedsRefresh(rt) => rt,
            StoredToken::ExpiredNoRefresh => {
                return Err(CredentialError::CredentialExpiredNoRefresh {
                    provider: provider.to_string(),
                });
            }
        };

        tracing::debug!(user_id, provider, "access token expired, attempting refresh");

        let tokens = self
            .refresher
            .refresh(provider, &refresh_token)
            .await
            .map_err(|e| match e {
                CredentialError::UnknownProvider { .. } => {
                    CredentialError::CredentialRefreshFailed {
                        provider: provider.to_string(),
                        reason: e.to_string(),
                    }
                }
                other => other,
            })?;

        let access_token = tokens.access_token.clone();
        self.accounts
            .update_tokens(
                user_id,
                provider,
                TokenUpdate {
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token,
                    expires_at: tokens.expires_at,
                },
            )
            .await?;

        tracing::info!(user_id, provider, "token refreshed successfully");
        Ok(access_token)
    }
}

#[async_trait]
impl CredentialTier for StoredAccountTier {
    fn name(&self) -> &'static str {
        "stored-account"
    }

    async fn lookup(&self, request: &CredentialRequest<'_>) -> Result<TierOutcome> {
        let Some(user_id) = request.user_id.filter(|u| !u.is_empty()) else {
            return Ok(TierOutcome::NotFound);
        };
        let Some(provider) = provider_for_key(request.key) else {
            return Ok(TierOutcome::NotFound);
        };
        let Some(record) = self.accounts.get(user_id, provider).await? else {
            return Ok(TierOutcome::NotFound);
        };

        match classify(&record, now_millis()) {
            StoredToken::Valid(token) => Ok(TierOutcome::Found(token)),
            StoredToken::ExpiredNoRefresh => Err(CredentialError::CredentialExpiredNoRefresh {
                provider: provider.to_string(),
            }),
            StoredToken::NeedsRefresh(_) => self
                .refresh_and_persist(user_id, provider)
                .await
                .map(TierOutcome::Found),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_store::MemoryAccountStore;

    fn overrides(pairs: &[(&str, &str)]) -> CredentialOverrides {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn env(pairs: &[(&str, &str)]) -> EnvironmentTier {
        EnvironmentTier::from_map(overrides(pairs))
    }

    #[test]
    fn classify_distinguishes_states() {
        let now = 10_000;
        let fresh = CredentialRecord::new("u", "google", "tok").with_expires_at(now + 1);
        assert_eq!(classify(&fresh, now), StoredToken::Valid("tok".into()));

        let at_boundary = CredentialRecord::new("u", "google", "tok").with_expires_at(now);
        assert_eq!(classify(&at_boundary, now), StoredToken::Valid("tok".into()));

        let expired = CredentialRecord::new("u", "google", "tok")
            .with_expires_at(now - 1)
            .with_refresh_token("rt");
        assert_eq!(classify(&expired, now), StoredToken::NeedsRefresh("rt".into()));

        let dead = CredentialRecord::new("u", "google", "tok").with_expires_at(now - 1);
        assert_eq!(classify(&dead, now), StoredToken::ExpiredNoRefresh);

        let forever = CredentialRecord::new("u", "google", "tok");
        assert_eq!(classify(&forever, i64::MAX), StoredToken::Valid("tok".into()));
    }

    #[tokio::test]
    async fn override_beats_environment() {
        let resolver = CredentialResolver::without_accounts(env(&[("SLACK_BOT_TOKEN", "from-env")]));
        let o = overrides(&[("SLACK_BOT_TOKEN", "from-override")]);

        let value = resolver
            .resolve("SLACK_BOT_TOKEN", Some(&o), None)
            .await
            .unwrap();
        assert_eq!(value, "from-override");

        let value = resolver.resolve("SLACK_BOT_TOKEN", None, None).await.unwrap();
        assert_eq!(value, "from-env");
    }

    #[tokio::test]
    async fn empty_values_fall_through() {
        let resolver = CredentialResolver::without_accounts(env(&[("NOTION_API_KEY", "")]));
        let o = overrides(&[("NOTION_API_KEY", "")]);

        let err = resolver
            .resolve("NOTION_API_KEY", Some(&o), Some("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::MissingCredential { ref key } if key == "NOTION_API_KEY"));
    }

    #[tokio::test]
    async fn stored_account_is_used_after_environment() {
        let accounts = Arc::new(MemoryAccountStore::new());
        accounts
            .upsert(CredentialRecord::new("u1", "google", "stored-google"))
            .await
            .unwrap();
        let resolver = CredentialResolver::standard(env(&[]), accounts, ProviderTable::empty());

        let value = resolver
            .resolve("GOOGLE_ACCESS_TOKEN", None, Some("u1"))
            .await
            .unwrap();
        assert_eq!(value, "stored-google");

        // No identity, no stored lookup.
        let err = resolver
            .resolve("GOOGLE_ACCESS_TOKEN", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::MissingCredential { .. }));

        // Unmapped keys never reach storage.
        let err = resolver
            .resolve("OPENAI_API_KEY", None, Some("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn expired_without_refresh_is_distinct_from_missing() {
        let accounts = Arc::new(MemoryAccountStore::new());
        accounts
            .upsert(
                CredentialRecord::new("u1", "slack", "old").with_expires_at(now_millis() - 60_000),
            )
            .await
            .unwrap();
        let resolver = CredentialResolver::standard(env(&[]), accounts, ProviderTable::empty());

        let err = resolver
            .resolve("SLACK_BOT_TOKEN", None, Some("u1"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, CredentialError::CredentialExpiredNoRefresh { ref provider } if provider == "slack")
        );
    }

    #[tokio::test]
    async fn refresh_without_client_config_fails() {
        let accounts = Arc::new(MemoryAccountStore::new());
        accounts
            .upsert(
                CredentialRecord::new("u1", "notion", "old")
                    .with_refresh_token("rt")
                    .with_expires_at(now_millis() - 60_000),
            )
            .await
            .unwrap();
        let resolver = CredentialResolver::standard(env(&[]), accounts, ProviderTable::empty());

        let err = resolver
            .resolve("NOTION_API_KEY", None, Some("u1"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, CredentialError::CredentialRefreshFailed { ref provider, .. } if provider == "notion")
        );
    }

    #[tokio::test]
    async fn refresh_lock_entries_are_released() {
        let accounts = Arc::new(MemoryAccountStore::new());
        accounts
            .upsert(
                CredentialRecord::new("u1", "notion", "old")
                    .with_refresh_token("rt")
                    .with_expires_at(now_millis() - 60_000),
            )
            .await
            .unwrap();
        accounts
            .upsert(CredentialRecord::new("u2", "notion", "current"))
            .await
            .unwrap();
        let tier = StoredAccountTier::new(accounts, TokenRefresher::new(ProviderTable::empty()));

        assert!(tier.refresh_and_persist("u1", "notion").await.is_err());
        assert_eq!(tier.refresh_and_persist("u2", "notion").await.unwrap(), "current");
        assert!(tier.locks.is_empty());
    }
}
