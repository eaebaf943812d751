//! Vercel deployment actions.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Handler, HandlerContext, Outcome, count, take_list};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "VERCEL_TOKEN";

#[derive(Debug, Clone)]
pub struct ListDeployments {
    pub project_id: Option<String>,
    pub team_id: Option<String>,
    pub limit: u64,
}

#[async_trait]
impl Handler for ListDeployments {
    const ID: ActionId = ActionId::VercelListDeployments;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            project_id: fields.optional("project_id"),
            team_id: fields.optional("team_id"),
            limit: fields.optional_u64("limit")?.unwrap_or(10),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.vercel, &["v6", "deployments"])?;
        let mut query = vec![("limit", self.limit.to_string())];
        if let Some(project) = &self.project_id {
            query.push(("projectId", project.clone()));
        }
        if let Some(team) = &self.team_id {
            query.push(("teamId", team.clone()));
        }

        let request = ctx
            .client()
            .get(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .query(&query);
        let mut reply = ctx.send(Self::ID, request).await?;

        let deployments = take_list(&mut reply.body, "deployments");
        let summary = format!("Retrieved {} Vercel deployments", count(&deployments));
        Ok(Outcome::new(deployments, summary))
    }
}

/// Create a new deployment from an existing one's source.
#[derive(Debug, Clone)]
pub struct Redeploy {
    pub project_name: String,
    pub deployment_id: String,
    pub target: Option<String>,
    pub team_id: Option<String>,
}

#[async_trait]
impl Handler for Redeploy {
    const ID: ActionId = ActionId::VercelRedeploy;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let target = fields.optional("target");
        if let Some(t) = &target
            && !matches!(t.as_str(), "production" | "preview")
        {
            return Err(ActionError::invalid(
                Self::ID,
                format!("`target` must be production or preview, got `{t}`"),
            ));
        }
        Ok(Self {
            project_name: fields.required("project_name")?,
            deployment_id: fields.required("deployment_id")?,
            target,
            team_id: fields.optional("team_id"),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.vercel, &["v13", "deployments"])?;

        let mut body = Map::new();
        body.insert("name".into(), Value::String(self.project_name.clone()));
        body.insert("deploymentId".into(), Value::String(self.deployment_id.clone()));
        if let Some(target) = &self.target {
            body.insert("target".into(), Value::String(target.clone()));
        }

        let mut request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .json(&body);
        if let Some(team) = &self.team_id {
            request = request.query(&[("teamId", team)]);
        }
        let reply = ctx.send(Self::ID, request).await?;

        let id = reply
            .body
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        Ok(Outcome::new(
            reply.body,
            format!("Triggered Vercel redeploy {id} for {}", self.project_name),
        ))
    }
}
