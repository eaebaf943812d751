//! HTTP API for Autoflow.
//!
//! Exposes the executor and the workflow runner to the chat front end:
//!
//! - `POST /api/execute/task`: run one action.
//! - `POST /api/execute/workflow`: run a node graph.
//! - `GET /api/actions`: the action catalog, for the planner.
//! - `GET /api/integrations/status`: the caller's connected providers.
//! - `GET /api/health`
//!
//! The caller's identity arrives in the `x-user-id` header, set by the
//! authenticating proxy in front of this server.

pub mod api;
pub mod error;
pub mod server;
pub mod state;

pub use error::{ApiError, Result};
pub use server::{WebServer, router};
pub use state::AppState;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: 3000,
        }
    }
}
