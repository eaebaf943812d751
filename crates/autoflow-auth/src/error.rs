//! Error types for the auth crate.
//!
//! Credential failures are never retried; their messages are shown to the
//! user, so each one says what to do next (configure vs. reconnect).

use autoflow_store::StoreError;

/// Unified error type for credential resolution.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No tier produced a value for the logical key.
    #[error("Missing credential: {key}. Please configure it in settings or environment variables.")]
    MissingCredential {
        /// The logical credential key that was requested.
        key: String,
    },

    /// The stored token has expired and there is no refresh token to renew it.
    #[error("Token for {provider} expired and no refresh token available. Please reconnect.")]
    CredentialExpiredNoRefresh {
        /// The provider whose grant needs re-authorization.
        provider: String,
    },

    /// The provider rejected, or we could not complete, the refresh grant.
    #[error("Token for {provider} expired and refresh failed: {reason}")]
    CredentialRefreshFailed {
        /// The provider whose refresh failed.
        provider: String,
        /// Explanation from the token endpoint or transport.
        reason: String,
    },

    /// The OAuth client table has no entry for the provider.
    #[error("no OAuth client configured for provider {provider}")]
    UnknownProvider {
        /// The provider name that was looked up.
        provider: String,
    },

    /// The account store failed.
    #[error("account store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, CredentialError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
