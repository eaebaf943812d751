//! Kubernetes deployment scaling via the `scale` subresource.

use async_trait::async_trait;
use serde_json::json;

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::Result;
use crate::http::endpoint;

const API_URL: &str = "KUBERNETES_API_URL";
const TOKEN: &str = "KUBERNETES_TOKEN";

#[derive(Debug, Clone)]
pub struct ScaleDeployment {
    pub deployment: String,
    pub namespace: String,
    pub replicas: u64,
}

#[async_trait]
impl Handler for ScaleDeployment {
    const ID: ActionId = ActionId::KubernetesScaleDeployment;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            deployment: fields.required("deployment")?,
            namespace: fields.optional_or("namespace", "default"),
            replicas: fields.required_u64("replicas")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let base = ctx.credential(API_URL)?.trim_end_matches('/');
        let url = endpoint(
            Self::ID,
            base,
            &[
                "apis",
                "apps",
                "v1",
                "namespaces",
                &self.namespace,
                "deployments",
                &self.deployment,
                "scale",
            ],
        )?;
        let request = ctx
            .client()
            .patch(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .header("Content-Type", "application/merge-patch+json")
            .body(json!({ "spec": { "replicas": self.replicas } }).to_string());
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!(
                "Scaled {}/{} to {} replica(s)",
                self.namespace, self.deployment, self.replicas
            ),
        ))
    }
}
