//! Action execution for Autoflow.
//!
//! An action is one call to a third-party provider (`slack_send_message`,
//! `github_create_issue`, ...).  The [`registry`] describes every action the
//! planner may emit; the [`ActionExecutor`] validates a node's config against
//! it, resolves credentials through `autoflow-auth`, and dispatches to the
//! typed handler in [`platforms`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autoflow_actions::ActionExecutor;
//! use autoflow_auth::{CredentialResolver, EnvironmentTier};
//! use serde_json::json;
//!
//! # async fn example() {
//! let resolver = Arc::new(CredentialResolver::without_accounts(EnvironmentTier::from_process()));
//! let executor = ActionExecutor::new(resolver);
//! let result = executor
//!     .execute("slack_send_message", json!({"channel": "C1", "text": "hi"}), None, None)
//!     .await;
//! println!("{}", result.success);
//! # }
//! ```

pub mod action;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod http;
pub mod platforms;
pub mod registry;
pub mod result;

pub use action::{Action, ActionId};
pub use config::{ActionConfig, Fields};
pub use context::{interpolate, interpolate_str};
pub use error::{ActionError, Result};
pub use executor::ActionExecutor;
pub use http::{Endpoints, ProviderHttp, Reply};
pub use platforms::{Credentials, Handler, HandlerContext, Outcome};
pub use registry::{ActionDefinition, FieldSpec, FieldType};
pub use result::ExecutionResult;
