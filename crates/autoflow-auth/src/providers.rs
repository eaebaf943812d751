//! OAuth provider table and logical-key mapping.
//!
//! Two static tables live here.  [`KNOWN_PROVIDERS`] lists each provider's
//! token endpoint and the environment prefix its client credentials are read
//! from (`<PREFIX>_CLIENT_ID`, `<PREFIX>_CLIENT_SECRET`).  [`KEY_PROVIDERS`]
//! maps logical credential keys (`GOOGLE_ACCESS_TOKEN`, ...) to the provider
//! whose stored grant can satisfy them.

use std::collections::HashMap;

/// Static description of a known OAuth provider.
#[derive(Debug, Clone, Copy)]
pub struct KnownProvider {
    /// Provider name as stored in `connected_accounts.provider`.
    pub name: &'static str,
    /// Prefix of the client credential environment variables.
    pub env_prefix: &'static str,
    /// Token endpoint used for the refresh grant.
    pub token_url: &'static str,
}

/// Every provider the refresh grant knows how to reach.
pub const KNOWN_PROVIDERS: &[KnownProvider] = &[
    KnownProvider {
        name: "google",
        env_prefix: "GOOGLE",
        token_url: "https://oauth2.googleapis.com/token",
    },
    KnownProvider {
        name: "youtube",
        env_prefix: "GOOGLE",
        token_url: "https://oauth2.googleapis.com/token",
    },
    KnownProvider {
        name: "slack",
        env_prefix: "SLACK",
        token_url: "https://slack.com/api/oauth.v2.access",
    },
    KnownProvider {
        name: "notion",
        env_prefix: "NOTION",
        token_url: "https://api.notion.com/v1/oauth/token",
    },
    KnownProvider {
        name: "x",
        env_prefix: "X",
        token_url: "https://api.twitter.com/2/oauth2/token",
    },
    KnownProvider {
        name: "instagram",
        env_prefix: "INSTAGRAM",
        token_url: "https://api.instagram.com/oauth/access_token",
    },
    KnownProvider {
        name: "linkedin",
        env_prefix: "LINKEDIN",
        token_url: "https://www.linkedin.com/oauth/v2/accessToken",
    },
    KnownProvider {
        name: "github",
        env_prefix: "GITHUB",
        token_url: "https://github.com/login/oauth/access_token",
    },
    KnownProvider {
        name: "vercel",
        env_prefix: "VERCEL",
        token_url: "https://api.vercel.com/v2/oauth/access_token",
    },
    KnownProvider {
        name: "jira",
        env_prefix: "JIRA",
        token_url: "https://auth.atlassian.com/oauth/token",
    },
    KnownProvider {
        name: "microsoft",
        env_prefix: "MICROSOFT",
        token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
    },
    KnownProvider {
        name: "meta",
        env_prefix: "META",
        token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
    },
];

/// Logical credential keys that a stored provider grant can satisfy.
///
/// Keys not listed here (e.g. `OPENAI_API_KEY`) only resolve from the
/// override and environment tiers.
pub const KEY_PROVIDERS: &[(&str, &str)] = &[
    ("GOOGLE_ACCESS_TOKEN", "google"),
    ("SLACK_BOT_TOKEN", "slack"),
    ("NOTION_API_KEY", "notion"),
    ("GITHUB_TOKEN", "github"),
    ("LINKEDIN_ACCESS_TOKEN", "linkedin"),
    ("X_ACCESS_TOKEN", "x"),
    ("VERCEL_TOKEN", "vercel"),
    ("JIRA_ACCESS_TOKEN", "jira"),
    ("MICROSOFT_ACCESS_TOKEN", "microsoft"),
    ("WHATSAPP_ACCESS_TOKEN", "meta"),
];

/// Provider whose stored grant satisfies `key`, if any.
pub fn provider_for_key(key: &str) -> Option<&'static str> {
    KEY_PROVIDERS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, provider)| *provider)
}

// ---------------------------------------------------------------------------
// Runtime table
// ---------------------------------------------------------------------------

/// Client credentials and token endpoint for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Token endpoint for the refresh grant.
    pub token_url: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

/// The set of providers a refresh can be performed against.
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    entries: HashMap<String, ProviderConfig>,
}

impl ProviderTable {
    /// A table with no providers; every refresh fails with
    /// `UnknownProvider`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the table from process environment variables.
    ///
    /// A provider is included only when both its client ID and secret are
    /// set and non-empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the table from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut table = Self::empty();
        for known in KNOWN_PROVIDERS {
            let id = lookup(&format!("{}_CLIENT_ID", known.env_prefix));
            let secret = lookup(&format!("{}_CLIENT_SECRET", known.env_prefix));
            if let (Some(client_id), Some(client_secret)) = (id, secret)
                && !client_id.is_empty()
                && !client_secret.is_empty()
            {
                table.insert(
                    known.name,
                    ProviderConfig {
                        token_url: known.token_url.to_string(),
                        client_id,
                        client_secret,
                    },
                );
            }
        }
        tracing::debug!(providers = ?table.names(), "OAuth provider table loaded");
        table
    }

    /// Add or replace a provider entry.
    pub fn insert(&mut self, provider: impl Into<String>, config: ProviderConfig) {
        self.entries.insert(provider.into(), config);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_provider(mut self, provider: impl Into<String>, config: ProviderConfig) -> Self {
        self.insert(provider, config);
        self
    }

    /// Look up a provider's configuration.
    pub fn get(&self, provider: &str) -> Option<&ProviderConfig> {
        self.entries.get(provider)
    }

    /// Configured provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mapping_covers_oauth_backed_keys() {
        assert_eq!(provider_for_key("GOOGLE_ACCESS_TOKEN"), Some("google"));
        assert_eq!(provider_for_key("SLACK_BOT_TOKEN"), Some("slack"));
        assert_eq!(provider_for_key("NOTION_API_KEY"), Some("notion"));
        assert_eq!(provider_for_key("WHATSAPP_ACCESS_TOKEN"), Some("meta"));
        assert_eq!(provider_for_key("OPENAI_API_KEY"), None);
    }

    #[test]
    fn mapped_providers_have_token_endpoints() {
        for (key, provider) in KEY_PROVIDERS {
            assert!(
                KNOWN_PROVIDERS.iter().any(|p| p.name == *provider),
                "{key} maps to {provider}, which has no token endpoint"
            );
        }
    }

    #[test]
    fn table_requires_both_id_and_secret() {
        let vars: HashMap<String, String> = [
            ("GOOGLE_CLIENT_ID", "gid"),
            ("GOOGLE_CLIENT_SECRET", "gsecret"),
            ("SLACK_CLIENT_ID", "sid"),
            ("NOTION_CLIENT_ID", "nid"),
            ("NOTION_CLIENT_SECRET", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let table = ProviderTable::from_vars(&vars);
        // youtube shares Google's OAuth client.
        assert_eq!(table.names(), vec!["google", "youtube"]);

        let google = table.get("google").unwrap();
        assert_eq!(google.client_id, "gid");
        assert_eq!(google.token_url, "https://oauth2.googleapis.com/token");
        assert!(table.get("slack").is_none());
        assert!(table.get("notion").is_none());
    }
}
