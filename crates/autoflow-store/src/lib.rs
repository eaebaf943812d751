//! # autoflow-store
//!
//! Account storage for Autoflow.
//!
//! Holds the per-user OAuth [`CredentialRecord`]s that the credential
//! resolver reads and refreshes.  The record table enforces at most one row
//! per `(user_id, provider)`; writes are upserts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  AccountStore (trait)                   │
//! │   ├── SqliteAccountStore                │
//! │   └── MemoryAccountStore  (tests, dev)  │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL)                │
//! │  Migrations (versioned, transactional)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use autoflow_store::{AccountStore, Database, SqliteAccountStore};
//!
//! let db = Database::open_and_migrate("data/autoflow.db").await?;
//! let accounts = SqliteAccountStore::new(db);
//! let record = accounts.get("user_1", "google").await?;
//! ```

pub mod accounts;
pub mod db;
pub mod error;
pub mod migration;

// ── re-exports ───────────────────────────────────────────────────────

pub use accounts::{
    AccountStore, CredentialRecord, MemoryAccountStore, SqliteAccountStore, TokenUpdate, now_millis,
};
pub use db::Database;
pub use error::{StoreError, StoreResult};
