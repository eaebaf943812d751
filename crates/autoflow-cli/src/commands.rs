//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use autoflow_actions::{ActionExecutor, registry};
use autoflow_auth::{CredentialOverrides, CredentialResolver, EnvironmentTier, ProviderTable};
use autoflow_engine::{Ordering, RunOptions, WorkflowGraph, WorkflowRunner};
use autoflow_store::{AccountStore, Database, SqliteAccountStore};
use autoflow_web::{AppState, WebConfig, WebServer};

use crate::config::AppConfig;

/// Open the account database, creating its directory if needed.
async fn open_accounts(config: &AppConfig) -> Result<Arc<dyn AccountStore>> {
    let path = config.store.path.clone();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = Database::open_and_migrate(path.clone())
        .await
        .with_context(|| format!("failed to open database {}", path.display()))?;
    info!(path = %path.display(), "account store ready");
    Ok(Arc::new(SqliteAccountStore::new(db)))
}

fn executor(accounts: Arc<dyn AccountStore>) -> Arc<ActionExecutor> {
    let providers = ProviderTable::from_env();
    info!(providers = ?providers.names(), "oauth refresh configured");
    let resolver =
        CredentialResolver::standard(EnvironmentTier::from_process(), accounts, providers);
    Arc::new(ActionExecutor::new(Arc::new(resolver)))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

pub async fn serve(config: AppConfig, bind: Option<String>, port: Option<u16>) -> Result<ExitCode> {
    let accounts = open_accounts(&config).await?;
    let state = AppState::new(executor(accounts.clone()), accounts, RunOptions::default());

    let web = WebConfig {
        bind_addr: bind.unwrap_or(config.server.bind),
        port: port.unwrap_or(config.server.port),
    };
    WebServer::new(web, state)
        .start()
        .await
        .context("web server failed")?;
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub struct RunArgs {
    pub workflow: PathBuf,
    pub credentials: Option<PathBuf>,
    pub user: Option<String>,
    pub stop_on_failure: bool,
    pub by_sequence: bool,
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Accept a bare graph or a request body wrapping one.
fn unwrap_workflow(mut value: Value) -> Value {
    match value.get_mut("workflow") {
        Some(inner) if inner.get("nodes").is_some() => inner.take(),
        _ => value,
    }
}

pub async fn run(config: AppConfig, args: RunArgs) -> Result<ExitCode> {
    let graph = WorkflowGraph::from_value(unwrap_workflow(read_json(&args.workflow)?))
        .with_context(|| format!("invalid workflow in {}", args.workflow.display()))?;
    let overrides: Option<CredentialOverrides> = args
        .credentials
        .as_deref()
        .map(|path| {
            serde_json::from_value(read_json(path)?)
                .with_context(|| format!("{} must be an object of strings", path.display()))
        })
        .transpose()?;

    let accounts = open_accounts(&config).await?;
    let options = RunOptions {
        ordering: if args.by_sequence {
            Ordering::Sequence
        } else {
            Ordering::LayoutX
        },
        stop_on_failure: args.stop_on_failure,
    };
    let runner = WorkflowRunner::new(executor(accounts)).with_options(options);

    let report = runner
        .run(&graph, overrides.as_ref(), args.user.as_deref())
        .await?;
    print_json(&report)?;

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ---------------------------------------------------------------------------
// exec
// ---------------------------------------------------------------------------

pub async fn exec(
    config: AppConfig,
    action_id: &str,
    action_config: &str,
    user: Option<&str>,
) -> Result<ExitCode> {
    let action_config: Value =
        serde_json::from_str(action_config).context("--config must be a JSON object")?;
    let accounts = open_accounts(&config).await?;

    let result = executor(accounts)
        .execute(action_id, action_config, None, user)
        .await;
    print_json(&result)?;

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ---------------------------------------------------------------------------
// actions
// ---------------------------------------------------------------------------

pub fn actions(platform: Option<&str>) -> Result<ExitCode> {
    let definitions: Vec<_> = match platform {
        Some(p) => registry::by_platform(p).collect(),
        None => registry::all().iter().collect(),
    };
    if definitions.is_empty() {
        println!("No actions found.");
        return Ok(ExitCode::SUCCESS);
    }

    for def in definitions {
        let required: Vec<&str> = def
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key)
            .collect();
        println!(
            "{:<30} {:<16} {}",
            def.id.as_str(),
            def.platform,
            def.display_name
        );
        if !required.is_empty() {
            println!("{:<30} requires: {}", "", required.join(", "));
        }
        if !def.credential_keys.is_empty() {
            println!("{:<30} credentials: {}", "", def.credential_keys.join(", "));
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_and_bare_workflows_are_accepted() {
        let bare = json!({"nodes": [], "edges": []});
        assert_eq!(unwrap_workflow(bare.clone()), bare);
        assert_eq!(unwrap_workflow(json!({"workflow": bare.clone()})), bare);
    }
}
