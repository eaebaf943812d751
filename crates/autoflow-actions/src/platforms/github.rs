//! GitHub REST API issue actions.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Handler, HandlerContext, Outcome, count};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "GITHUB_TOKEN";

/// `owner/repo`, split and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub name: String,
}

impl Repo {
    fn parse(action: ActionId, fields: &Fields<'_>) -> Result<Self> {
        let full = fields.required("repo")?;
        match full.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ActionError::invalid(
                action,
                format!("`repo` must look like owner/repo, got `{full}`"),
            )),
        }
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Build a request with standard GitHub headers.
fn github_request(
    ctx: &HandlerContext<'_>,
    method: reqwest::Method,
    url: url::Url,
) -> Result<reqwest::RequestBuilder> {
    Ok(ctx
        .client()
        .request(method, url)
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .bearer_auth(ctx.credential(TOKEN)?))
}

/// Open an issue.
#[derive(Debug, Clone)]
pub struct CreateIssue {
    pub repo: Repo,
    pub title: String,
    pub body: Option<String>,
    pub labels: Vec<String>,
}

#[async_trait]
impl Handler for CreateIssue {
    const ID: ActionId = ActionId::GithubCreateIssue;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            repo: Repo::parse(Self::ID, fields)?,
            title: fields.required("title")?,
            body: fields.optional("body"),
            labels: fields.list("labels")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.github,
            &["repos", &self.repo.owner, &self.repo.name, "issues"],
        )?;

        let mut payload = Map::new();
        payload.insert("title".into(), Value::String(self.title.clone()));
        if let Some(body) = &self.body {
            payload.insert("body".into(), Value::String(body.clone()));
        }
        if !self.labels.is_empty() {
            payload.insert(
                "labels".into(),
                Value::Array(self.labels.iter().cloned().map(Value::String).collect()),
            );
        }

        let request = github_request(ctx, reqwest::Method::POST, url)?.json(&payload);
        let reply = ctx.send(Self::ID, request).await?;

        let number = reply.body.get("number").and_then(Value::as_u64).unwrap_or(0);
        Ok(Outcome::new(
            reply.body,
            format!("Created GitHub issue #{number} in {}", self.repo),
        ))
    }
}

/// Comment on an issue or pull request.
#[derive(Debug, Clone)]
pub struct CommentIssue {
    pub repo: Repo,
    pub issue_number: u64,
    pub body: String,
}

#[async_trait]
impl Handler for CommentIssue {
    const ID: ActionId = ActionId::GithubCommentIssue;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            repo: Repo::parse(Self::ID, fields)?,
            issue_number: fields.required_u64("issue_number")?,
            body: fields.required("body")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let number = self.issue_number.to_string();
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.github,
            &["repos", &self.repo.owner, &self.repo.name, "issues", &number, "comments"],
        )?;
        let mut payload = Map::new();
        payload.insert("body".into(), Value::String(self.body.clone()));

        let request = github_request(ctx, reqwest::Method::POST, url)?.json(&payload);
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!("Commented on {}#{}", self.repo, self.issue_number),
        ))
    }
}

/// List issues (GitHub includes pull requests in this listing).
#[derive(Debug, Clone)]
pub struct ListIssues {
    pub repo: Repo,
    pub state: String,
    pub per_page: u64,
}

#[async_trait]
impl Handler for ListIssues {
    const ID: ActionId = ActionId::GithubListIssues;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let state = fields.optional_or("state", "open");
        if !matches!(state.as_str(), "open" | "closed" | "all") {
            return Err(ActionError::invalid(
                Self::ID,
                format!("`state` must be open, closed or all, got `{state}`"),
            ));
        }
        Ok(Self {
            repo: Repo::parse(Self::ID, fields)?,
            state,
            per_page: fields.optional_u64("per_page")?.unwrap_or(30).min(100),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.github,
            &["repos", &self.repo.owner, &self.repo.name, "issues"],
        )?;
        let request = github_request(ctx, reqwest::Method::GET, url)?.query(&[
            ("state", self.state.clone()),
            ("per_page", self.per_page.to_string()),
        ]);
        let reply = ctx.send(Self::ID, request).await?;

        let summary = format!(
            "Retrieved {} issues from {}",
            count(&reply.body),
            self.repo
        );
        Ok(Outcome::new(reply.body, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionConfig;
    use serde_json::json;

    #[test]
    fn repo_must_be_owner_slash_name() {
        for bad in ["justname", "/repo", "owner/", "a/b/c"] {
            let config = ActionConfig::from_value(json!({"repo": bad, "title": "t"}));
            assert!(
                CreateIssue::parse(&config.fields(ActionId::GithubCreateIssue)).is_err(),
                "{bad} should be rejected"
            );
        }

        let config = ActionConfig::from_value(json!({
            "repo": "octo/hello",
            "title": "t",
            "labels": "bug, triage"
        }));
        let issue = CreateIssue::parse(&config.fields(ActionId::GithubCreateIssue)).unwrap();
        assert_eq!(issue.repo.to_string(), "octo/hello");
        assert_eq!(issue.labels, vec!["bug", "triage"]);
    }

    #[test]
    fn list_issues_clamps_page_size() {
        let config = ActionConfig::from_value(json!({"repo": "a/b", "per_page": 500}));
        let list = ListIssues::parse(&config.fields(ActionId::GithubListIssues)).unwrap();
        assert_eq!(list.per_page, 100);
        assert_eq!(list.state, "open");
    }
}
