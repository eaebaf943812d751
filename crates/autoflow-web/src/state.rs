//! Shared application state for the web server.

use std::sync::Arc;

use autoflow_actions::ActionExecutor;
use autoflow_engine::{RunOptions, WorkflowRunner};
use autoflow_store::AccountStore;

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Single-action executor.
    pub executor: Arc<ActionExecutor>,
    /// Runner over the same executor.
    pub runner: Arc<WorkflowRunner>,
    /// Connected accounts, for the integrations status endpoint.
    pub accounts: Arc<dyn AccountStore>,
}

impl AppState {
    pub fn new(
        executor: Arc<ActionExecutor>,
        accounts: Arc<dyn AccountStore>,
        options: RunOptions,
    ) -> Self {
        let runner = WorkflowRunner::new(executor.clone()).with_options(options);
        Self {
            executor,
            runner: Arc::new(runner),
            accounts,
        }
    }
}
