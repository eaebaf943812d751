//! Jira Cloud issue creation through the Atlassian API gateway
//! (`/ex/jira/{cloud_id}/rest/api/3`), as required for OAuth 2.0 (3LO)
//! tokens.

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::Result;
use crate::http::endpoint;

const TOKEN: &str = "JIRA_ACCESS_TOKEN";
const CLOUD_ID: &str = "JIRA_CLOUD_ID";

#[derive(Debug, Clone)]
pub struct CreateIssue {
    pub project_key: String,
    pub summary: String,
    pub description: Option<String>,
    pub issue_type: String,
}

/// Plain text as an Atlassian Document Format document, one paragraph per
/// line.
fn adf(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            json!({
                "type": "paragraph",
                "content": [{ "type": "text", "text": line }]
            })
        })
        .collect();
    json!({ "type": "doc", "version": 1, "content": paragraphs })
}

#[async_trait]
impl Handler for CreateIssue {
    const ID: ActionId = ActionId::JiraCreateIssue;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            project_key: fields.required("project_key")?,
            summary: fields.required("summary")?,
            description: fields.optional("description"),
            issue_type: fields.optional_or("issue_type", "Task"),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.jira,
            &["ex", "jira", ctx.credential(CLOUD_ID)?, "rest", "api", "3", "issue"],
        )?;

        let mut issue_fields = Map::new();
        issue_fields.insert("project".into(), json!({ "key": self.project_key }));
        issue_fields.insert("summary".into(), Value::String(self.summary.clone()));
        issue_fields.insert("issuetype".into(), json!({ "name": self.issue_type }));
        if let Some(description) = &self.description {
            issue_fields.insert("description".into(), adf(description));
        }

        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .header("Accept", "application/json")
            .json(&json!({ "fields": issue_fields }));
        let reply = ctx.send(Self::ID, request).await?;

        let key = reply
            .body
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        Ok(Outcome::new(reply.body, format!("Created Jira issue {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_becomes_adf_paragraphs() {
        let doc = adf("Steps:\n\n1. open app\n");
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["content"].as_array().unwrap().len(), 2);
        assert_eq!(doc["content"][1]["content"][0]["text"], "1. open app");
    }
}
