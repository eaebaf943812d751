//! Credential resolution for Autoflow.
//!
//! Actions ask for credentials by logical key (`SLACK_BOT_TOKEN`,
//! `GOOGLE_ACCESS_TOKEN`, ...).  The [`CredentialResolver`] answers from the
//! first tier that has a value:
//!
//! ```text
//! CredentialResolver
//! ├── OverrideTier       (per-request values)
//! ├── EnvironmentTier    (process environment)
//! └── StoredAccountTier  (connected accounts + OAuth refresh)
//!     ├── AccountStore   (autoflow-store)
//!     └── TokenRefresher (refresh_token grant, ProviderTable)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autoflow_auth::{CredentialResolver, EnvironmentTier, ProviderTable};
//! use autoflow_store::{Database, SqliteAccountStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open_and_migrate("data/autoflow.db").await?;
//! let resolver = CredentialResolver::standard(
//!     EnvironmentTier::from_process(),
//!     Arc::new(SqliteAccountStore::new(db)),
//!     ProviderTable::from_env(),
//! );
//! let token = resolver.resolve("SLACK_BOT_TOKEN", None, Some("user_1")).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod oauth;
pub mod providers;
pub mod resolver;

pub use error::{CredentialError, Result};
pub use oauth::{RefreshedTokens, TokenRefresher};
pub use providers::{ProviderConfig, ProviderTable, provider_for_key};
pub use resolver::{
    CredentialOverrides, CredentialRequest, CredentialResolver, CredentialTier, EnvironmentTier,
    OverrideTier, StoredAccountTier, StoredToken, TierOutcome, classify,
};
