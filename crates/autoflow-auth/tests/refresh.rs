//! Refresh-grant behaviour against a mock token endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use autoflow_auth::{
    CredentialError, CredentialResolver, EnvironmentTier, ProviderConfig, ProviderTable,
};
use autoflow_store::{AccountStore, CredentialRecord, Database, SqliteAccountStore, now_millis};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOUR_MS: i64 = 3_600_000;

fn providers_for(server: &MockServer, provider: &str) -> ProviderTable {
    ProviderTable::empty().with_provider(
        provider,
        ProviderConfig {
            token_url: format!("{}/token", server.uri()),
            client_id: "cid".into(),
            client_secret: "csecret".into(),
        },
    )
}

async fn store_with(record: CredentialRecord) -> Arc<SqliteAccountStore> {
    let db = Database::in_memory_migrated().await.unwrap();
    let store = Arc::new(SqliteAccountStore::new(db));
    store.upsert(record).await.unwrap();
    store
}

fn no_env() -> EnvironmentTier {
    EnvironmentTier::from_map(HashMap::new())
}

#[tokio::test]
async fn expired_token_is_refreshed_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=r1"))
        .and(body_string_contains("client_id=cid"))
        .and(body_string_contains("client_secret=csecret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "new", "expires_in": 3600})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with(
        CredentialRecord::new("u1", "google", "old")
            .with_refresh_token("r1")
            .with_expires_at(now_millis() - HOUR_MS),
    )
    .await;
    let resolver =
        CredentialResolver::standard(no_env(), store.clone(), providers_for(&server, "google"));

    let before = now_millis();
    let token = resolver
        .resolve("GOOGLE_ACCESS_TOKEN", None, Some("u1"))
        .await
        .unwrap();
    assert_eq!(token, "new");

    let record = store.get("u1", "google").await.unwrap().unwrap();
    assert_eq!(record.access_token, "new");
    // Provider did not rotate the refresh token, so the old one is kept.
    assert_eq!(record.refresh_token.as_deref(), Some("r1"));
    let expires_at = record.expires_at.unwrap();
    assert!(expires_at >= before + HOUR_MS);
    assert!(expires_at <= now_millis() + HOUR_MS);

    // Second lookup uses the stored token; the mock's expect(1) verifies no
    // second refresh on drop.
    let again = resolver
        .resolve("GOOGLE_ACCESS_TOKEN", None, Some("u1"))
        .await
        .unwrap();
    assert_eq!(again, "new");
}

#[tokio::test]
async fn rotated_refresh_token_replaces_stored_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "new",
            "refresh_token": "r2",
            "expires_in": 60
        })))
        .mount(&server)
        .await;

    let store = store_with(
        CredentialRecord::new("u1", "slack", "old")
            .with_refresh_token("r1")
            .with_expires_at(now_millis() - 1_000),
    )
    .await;
    let resolver =
        CredentialResolver::standard(no_env(), store.clone(), providers_for(&server, "slack"));

    resolver
        .resolve("SLACK_BOT_TOKEN", None, Some("u1"))
        .await
        .unwrap();

    let record = store.get("u1", "slack").await.unwrap().unwrap();
    assert_eq!(record.refresh_token.as_deref(), Some("r2"));
}

#[tokio::test]
async fn rejected_refresh_surfaces_provider_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let store = store_with(
        CredentialRecord::new("u1", "google", "old")
            .with_refresh_token("r1")
            .with_expires_at(now_millis() - HOUR_MS),
    )
    .await;
    let resolver =
        CredentialResolver::standard(no_env(), store.clone(), providers_for(&server, "google"));

    let err = resolver
        .resolve("GOOGLE_ACCESS_TOKEN", None, Some("u1"))
        .await
        .unwrap_err();
    match err {
        CredentialError::CredentialRefreshFailed { provider, reason } => {
            assert_eq!(provider, "google");
            assert_eq!(reason, "Token has been expired or revoked.");
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing was written back.
    let record = store.get("u1", "google").await.unwrap().unwrap();
    assert_eq!(record.access_token, "old");
}

#[tokio::test]
async fn error_body_with_success_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "invalid_refresh_token"})),
        )
        .mount(&server)
        .await;

    let store = store_with(
        CredentialRecord::new("u1", "slack", "old")
            .with_refresh_token("r1")
            .with_expires_at(now_millis() - 1_000),
    )
    .await;
    let resolver =
        CredentialResolver::standard(no_env(), store, providers_for(&server, "slack"));

    let err = resolver
        .resolve("SLACK_BOT_TOKEN", None, Some("u1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid_refresh_token"));
}

#[tokio::test]
async fn concurrent_lookups_refresh_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "new", "expires_in": 3600}))
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with(
        CredentialRecord::new("u1", "google", "old")
            .with_refresh_token("r1")
            .with_expires_at(now_millis() - HOUR_MS),
    )
    .await;
    let resolver = Arc::new(CredentialResolver::standard(
        no_env(),
        store,
        providers_for(&server, "google"),
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move {
                resolver
                    .resolve("GOOGLE_ACCESS_TOKEN", None, Some("u1"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "new");
    }
}
