//! OAuth 2.0 refresh-token grant.
//!
//! Stored provider grants are renewed here when the credential resolver
//! finds an expired access token.  The request is the standard form POST
//! (`grant_type=refresh_token`, `refresh_token`, `client_id`,
//! `client_secret`) against the provider's token endpoint.
//!
//! Providers disagree on how they report errors: most use a non-2xx status
//! with `{error, error_description}`, but some (Slack, GitHub) answer `200`
//! with an `error` field in the body.  Both count as failure.

use serde::Deserialize;

use crate::error::{CredentialError, Result};
use crate::providers::{ProviderConfig, ProviderTable};

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// Tokens returned by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    /// The new access token.
    pub access_token: String,

    /// A rotated refresh token, if the provider issued one.
    pub refresh_token: Option<String>,

    /// Absolute expiry in Unix milliseconds, when the provider reported
    /// `expires_in`.
    pub expires_at: Option<i64>,
}

/// Raw token response from the authorization server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    ok: Option<bool>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    /// Convert into [`RefreshedTokens`], computing `expires_at` from
    /// `expires_in` relative to `now_ms`.
    fn into_tokens(self, now_ms: i64) -> std::result::Result<RefreshedTokens, String> {
        if let Some(error) = self.error {
            return Err(self.error_description.unwrap_or(error));
        }
        if self.ok == Some(false) {
            return Err("provider reported ok=false".to_string());
        }
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "response did not include an access_token".to_string())?;

        Ok(RefreshedTokens {
            access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at: self
                .expires_in
                .map(|secs| now_ms.saturating_add(secs.saturating_mul(1_000))),
        })
    }
}

/// Raw error response from the authorization server.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

// ---------------------------------------------------------------------------
// Refresh client
// ---------------------------------------------------------------------------

/// Performs refresh-token grants against the configured providers.
pub struct TokenRefresher {
    providers: ProviderTable,
    client: reqwest::Client,
}

impl TokenRefresher {
    /// Create a refresher over the given provider table.
    pub fn new(providers: ProviderTable) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("autoflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { providers, client }
    }

    /// The provider table this refresher uses.
    pub fn providers(&self) -> &ProviderTable {
        &self.providers
    }

    /// Exchange `refresh_token` for a new access token at `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::UnknownProvider`] if no client is
    /// configured for the provider, and
    /// [`CredentialError::CredentialRefreshFailed`] on any transport or
    /// provider-side failure.
    pub async fn refresh(&self, provider: &str, refresh_token: &str) -> Result<RefreshedTokens> {
        let config = self
            .providers
            .get(provider)
            .ok_or_else(|| CredentialError::UnknownProvider {
                provider: provider.to_string(),
            })?;

        tracing::debug!(provider, token_url = %config.token_url, "refreshing access token");

        self.request(config, refresh_token)
            .await
            .map_err(|reason| CredentialError::CredentialRefreshFailed {
                provider: provider.to_string(),
                reason,
            })
    }

    async fn request(
        &self,
        config: &ProviderConfig,
        refresh_token: &str,
    ) -> std::result::Result<RefreshedTokens, String> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&config.token_url)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(
                match serde_json::from_str::<TokenErrorResponse>(&body) {
                    Ok(err) => err.error_description.unwrap_or(err.error),
                    Err(_) => format!("HTTP {status}: {body}"),
                },
            );
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| format!("invalid token response: {e}"))?;
        parsed.into_tokens(autoflow_store::now_millis())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> std::result::Result<RefreshedTokens, String> {
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        parsed.into_tokens(1_000_000)
    }

    #[test]
    fn expires_in_is_converted_to_absolute_millis() {
        let tokens = parse(r#"{"access_token":"new","expires_in":3600}"#).unwrap();
        assert_eq!(tokens.access_token, "new");
        assert_eq!(tokens.expires_at, Some(1_000_000 + 3_600_000));
        assert!(tokens.refresh_token.is_none());
    }

    #[test]
    fn rotated_refresh_token_is_kept() {
        let tokens =
            parse(r#"{"access_token":"a","refresh_token":"r2","token_type":"Bearer"}"#).unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("r2"));
        assert_eq!(tokens.expires_at, None);
    }

    #[test]
    fn body_error_on_success_status_is_failure() {
        let err = parse(r#"{"error":"bad_refresh_token"}"#).unwrap_err();
        assert_eq!(err, "bad_refresh_token");

        let err = parse(r#"{"error":"invalid_grant","error_description":"Token revoked"}"#)
            .unwrap_err();
        assert_eq!(err, "Token revoked");
    }

    #[test]
    fn huge_expires_in_saturates() {
        let tokens = parse(r#"{"access_token":"a","expires_in":9223372036854775807}"#).unwrap();
        assert_eq!(tokens.expires_at, Some(i64::MAX));
    }

    #[test]
    fn ok_false_is_failure() {
        assert!(parse(r#"{"ok":false,"access_token":"x"}"#).is_err());
    }

    #[test]
    fn missing_access_token_is_failure() {
        assert!(parse(r#"{"expires_in":10}"#).is_err());
        assert!(parse(r#"{"access_token":""}"#).is_err());
    }

    #[tokio::test]
    async fn unknown_provider_is_reported() {
        let refresher = TokenRefresher::new(ProviderTable::empty());
        let err = refresher.refresh("nowhere", "r").await.unwrap_err();
        assert!(matches!(err, CredentialError::UnknownProvider { .. }));
    }
}
