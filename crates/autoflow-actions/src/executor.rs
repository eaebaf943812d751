//! The action executor.
//!
//! Turns `(action_id, config)` into an [`ExecutionResult`]:
//!
//! 1. parse the id (unknown or planner-only ids are not implemented),
//! 2. flatten the config and interpolate `{{node.output.path}}` references,
//! 3. check the registry's required fields,
//! 4. build the typed [`Action`],
//! 5. resolve every credential key the action declares,
//! 6. run the handler.
//!
//! Failures at any step become a failed result rather than an error; a
//! panicking handler is caught and reported the same way.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{info, warn};

use autoflow_auth::{CredentialOverrides, CredentialResolver};

use crate::action::{Action, ActionId};
use crate::config::ActionConfig;
use crate::context::interpolate;
use crate::error::{ActionError, Result};
use crate::http::{Endpoints, ProviderHttp};
use crate::platforms::{Credentials, HandlerContext, Outcome};
use crate::registry;
use crate::result::ExecutionResult;

/// Config keys whose values never reach the logs.
const REDACTED_KEYS: &[&str] = &[
    "headers",
    "token",
    "password",
    "authorization",
    "api_key",
    "secret",
];

/// Executes single actions against provider APIs.
pub struct ActionExecutor {
    resolver: Arc<CredentialResolver>,
    http: ProviderHttp,
    endpoints: Endpoints,
}

impl ActionExecutor {
    /// Executor talking to the production provider endpoints.
    pub fn new(resolver: Arc<CredentialResolver>) -> Self {
        Self::with_endpoints(resolver, Endpoints::default())
    }

    /// Executor with explicit provider base URLs.
    pub fn with_endpoints(resolver: Arc<CredentialResolver>, endpoints: Endpoints) -> Self {
        Self {
            resolver,
            http: ProviderHttp::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Execute one action with no prior-node context.
    pub async fn execute(
        &self,
        action_id: &str,
        config: Value,
        overrides: Option<&CredentialOverrides>,
        user_id: Option<&str>,
    ) -> ExecutionResult {
        self.execute_with_context(action_id, config, &Value::Null, overrides, user_id)
            .await
    }

    /// Execute one action, interpolating placeholders from `context`
    /// (a map of node id to that node's result).
    pub async fn execute_with_context(
        &self,
        action_id: &str,
        config: Value,
        context: &Value,
        overrides: Option<&CredentialOverrides>,
        user_id: Option<&str>,
    ) -> ExecutionResult {
        info!(
            action = action_id,
            user = user_id.unwrap_or("-"),
            config = %redact(&config),
            "executing action"
        );

        let attempt = AssertUnwindSafe(self.dispatch(action_id, config, context, overrides, user_id))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok(outcome)) => {
                info!(action = action_id, "action succeeded");
                ExecutionResult::success(outcome.output, vec![outcome.summary])
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                let log = match &e {
                    ActionError::NotImplemented { action } => {
                        format!("Action {action} not implemented.")
                    }
                    _ => format!("Execution failed: {message}"),
                };
                warn!(action = action_id, error = %message, "action failed");
                ExecutionResult::failure(message, vec![log])
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                let message = format!("handler panicked: {detail}");
                warn!(action = action_id, error = %message, "action panicked");
                ExecutionResult::failure(message.clone(), vec![format!("Execution failed: {message}")])
            }
        }
    }

    async fn dispatch(
        &self,
        action_id: &str,
        config: Value,
        context: &Value,
        overrides: Option<&CredentialOverrides>,
        user_id: Option<&str>,
    ) -> Result<Outcome> {
        let id: ActionId = action_id.parse()?;
        if !id.is_executable() {
            return Err(ActionError::NotImplemented {
                action: id.to_string(),
            });
        }
        let definition = registry::definition(id).ok_or_else(|| ActionError::NotImplemented {
            action: id.to_string(),
        })?;

        let mut config = ActionConfig::from_value(config);
        interpolate(&mut config, context);

        let missing = definition.missing_fields(&config);
        if !missing.is_empty() {
            return Err(ActionError::MissingFields {
                action: id,
                fields: missing,
            });
        }

        let action = Action::parse(id, &config)?;

        let mut credentials = Credentials::new();
        for key in definition.credential_keys {
            let value = self.resolver.resolve(key, overrides, user_id).await?;
            credentials.insert(*key, value);
        }

        let ctx = HandlerContext {
            http: &self.http,
            endpoints: &self.endpoints,
            credentials: &credentials,
        };
        action.run(&ctx).await
    }
}

/// Copy of `config` with sensitive values masked, for logging.
fn redact(config: &Value) -> Value {
    match config {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let masked = REDACTED_KEYS
                        .iter()
                        .any(|r| k.to_ascii_lowercase().contains(r));
                    let v = if masked {
                        Value::String("***".into())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redaction_masks_sensitive_keys_at_any_depth() {
        let config = json!({
            "url": "https://example.com",
            "headers": {"Authorization": "Bearer x"},
            "nested": {"api_key": "k", "keep": 1},
            "list": [{"password": "p"}]
        });
        assert_eq!(
            redact(&config),
            json!({
                "url": "https://example.com",
                "headers": "***",
                "nested": {"api_key": "***", "keep": 1},
                "list": [{"password": "***"}]
            })
        );
    }
}
