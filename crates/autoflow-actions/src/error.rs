//! Action error types.
//!
//! Every handler failure surfaces as an [`ActionError`].  The executor folds
//! each one into a failed [`ExecutionResult`](crate::ExecutionResult); none
//! of them cross the executor boundary.

use autoflow_auth::CredentialError;

use crate::action::ActionId;

/// Unified error type for action execution.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The action id has no handler (unknown, or planner-only).
    #[error("Implementation for {action} is not yet fully configured.")]
    NotImplemented { action: String },

    /// Required configuration fields were absent or empty.
    #[error("`{action}` is missing required field(s): {}", fields.join(", "))]
    MissingFields {
        action: ActionId,
        fields: Vec<String>,
    },

    /// A configuration value was present but unusable.
    #[error("invalid configuration for `{action}`: {reason}")]
    InvalidConfig { action: ActionId, reason: String },

    /// A credential could not be resolved.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The provider answered with a non-success status.
    #[error("HTTP {status} from `{action}`: {message}")]
    Http {
        action: ActionId,
        status: u16,
        message: String,
    },

    /// The provider answered 2xx but flagged an error in the body.
    #[error("{message}")]
    ProviderError { action: ActionId, message: String },

    /// The request never completed.
    #[error("request for `{action}` failed: {reason}")]
    Transport { action: ActionId, reason: String },

    /// The provider's response did not have the expected shape.
    #[error("unexpected response for `{action}`: {reason}")]
    Decode { action: ActionId, reason: String },
}

impl ActionError {
    pub(crate) fn invalid(action: ActionId, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            action,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(action: ActionId, field: &str) -> Self {
        Self::MissingFields {
            action,
            fields: vec![field.to_string()],
        }
    }
}

/// Convenience alias used throughout the actions crate.
pub type Result<T> = std::result::Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_field() {
        let err = ActionError::MissingFields {
            action: ActionId::SlackSendMessage,
            fields: vec!["channel".into(), "text".into()],
        };
        assert_eq!(
            err.to_string(),
            "`slack_send_message` is missing required field(s): channel, text"
        );
    }

    #[test]
    fn credential_errors_pass_through_verbatim() {
        let err: ActionError = CredentialError::MissingCredential {
            key: "NOTION_API_KEY".into(),
        }
        .into();
        assert!(err.to_string().starts_with("Missing credential: NOTION_API_KEY."));
    }

    #[test]
    fn not_implemented_names_the_action() {
        let err = ActionError::NotImplemented {
            action: "docker_container".into(),
        };
        assert_eq!(
            err.to_string(),
            "Implementation for docker_container is not yet fully configured."
        );
    }
}
