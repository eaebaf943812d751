//! LinkedIn UGC text posts.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "LINKEDIN_ACCESS_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Connections,
}

impl Visibility {
    fn as_wire(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Connections => "CONNECTIONS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePost {
    pub author: String,
    pub content: String,
    pub visibility: Visibility,
}

#[async_trait]
impl Handler for CreatePost {
    const ID: ActionId = ActionId::LinkedinCreatePost;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let author = fields.required("author")?;
        if !author.starts_with("urn:li:") {
            return Err(ActionError::invalid(
                Self::ID,
                "`author` must be a LinkedIn URN such as urn:li:person:<id>",
            ));
        }
        let visibility = match fields.optional_or("visibility", "public").to_lowercase().as_str() {
            "public" => Visibility::Public,
            "connections" => Visibility::Connections,
            other => {
                return Err(ActionError::invalid(
                    Self::ID,
                    format!("`visibility` must be public or connections, got `{other}`"),
                ));
            }
        };
        Ok(Self {
            author,
            content: fields.required("content")?,
            visibility,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.linkedin, &["ugcPosts"])?;
        let body = json!({
            "author": self.author,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": self.content },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": self.visibility.as_wire()
            }
        });
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body);
        let reply = ctx.send(Self::ID, request).await?;

        // The post URN comes back in a header; the body may be empty.
        let id = reply
            .headers
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .or_else(|| reply.body.get("id").and_then(Value::as_str).map(String::from));
        let output = match (&reply.body, &id) {
            (Value::Null, Some(id)) => json!({ "id": id }),
            _ => reply.body.clone(),
        };

        let summary = match &id {
            Some(id) => format!("Published LinkedIn post {id}"),
            None => "Published LinkedIn post".to_string(),
        };
        Ok(Outcome::new(output, summary))
    }
}
