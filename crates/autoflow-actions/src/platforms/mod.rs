//! Per-platform action handlers.
//!
//! Each handler is a typed config struct implementing [`Handler`]: `parse`
//! reads its fields from the node config, `run` performs the remote call and
//! returns an [`Outcome`] (output value plus one summary log line).

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::action::ActionId;
use crate::config::Fields;
use crate::error::Result;
use crate::http::{Endpoints, ProviderHttp, Reply};

pub mod calendar;
pub mod discord;
pub mod docs;
pub mod excel;
pub mod github;
pub mod gmail;
pub mod http_request;
pub mod jira;
pub mod kubernetes;
pub mod linkedin;
pub mod notion;
pub mod sheets;
pub mod slack;
pub mod supabase;
pub mod telegram;
pub mod twilio;
pub mod vercel;
pub mod whatsapp;
pub mod x;

/// A typed action handler.
#[async_trait]
pub trait Handler: Sized + Send + Sync {
    /// The action this handler implements.
    const ID: ActionId;

    /// Build the typed config.  Required-field presence has already been
    /// checked against the registry; this validates types and shapes.
    fn parse(fields: &Fields<'_>) -> Result<Self>;

    /// Perform the remote call(s).
    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome>;
}

/// Successful handler result.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub output: Value,
    pub summary: String,
}

impl Outcome {
    pub fn new(output: Value, summary: impl Into<String>) -> Self {
        Self {
            output,
            summary: summary.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Credential values resolved for one invocation, keyed by logical key.
#[derive(Clone, Default)]
pub struct Credentials {
    values: HashMap<&'static str, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: String) {
        self.values.insert(key, value);
    }

    /// The resolved value for `key`.
    ///
    /// Handlers only ask for keys their registry entry declares, which the
    /// executor resolves up front; a miss here is reported like any other
    /// missing credential.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.values.get(key).map(String::as_str).ok_or_else(|| {
            autoflow_auth::CredentialError::MissingCredential {
                key: key.to_string(),
            }
            .into()
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Credentials").field("keys", &keys).finish()
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a handler may use while running.
pub struct HandlerContext<'a> {
    pub http: &'a ProviderHttp,
    pub endpoints: &'a Endpoints,
    pub credentials: &'a Credentials,
}

impl HandlerContext<'_> {
    pub fn client(&self) -> &reqwest::Client {
        self.http.client()
    }

    pub fn credential(&self, key: &str) -> Result<&str> {
        self.credentials.get(key)
    }

    pub async fn send(&self, action: ActionId, request: reqwest::RequestBuilder) -> Result<Reply> {
        self.http.send(action, request).await
    }
}

/// Length of a JSON array, 0 for anything else.
pub(crate) fn count(value: &Value) -> usize {
    value.as_array().map_or(0, Vec::len)
}

/// `body[key]`, or an empty array when absent.
pub(crate) fn take_list(body: &mut Value, key: &str) -> Value {
    match body.get_mut(key) {
        Some(v) if v.is_array() => v.take(),
        _ => Value::Array(Vec::new()),
    }
}
