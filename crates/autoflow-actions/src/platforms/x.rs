//! X (Twitter) API v2 posts.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "X_ACCESS_TOKEN";
const MAX_CHARS: usize = 280;

#[derive(Debug, Clone)]
pub struct PostTweet {
    pub text: String,
}

#[async_trait]
impl Handler for PostTweet {
    const ID: ActionId = ActionId::XPostTweet;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let text = fields.required("text")?;
        let len = text.chars().count();
        if len > MAX_CHARS {
            return Err(ActionError::invalid(
                Self::ID,
                format!("`text` is {len} characters; the limit is {MAX_CHARS}"),
            ));
        }
        Ok(Self { text })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.x, &["tweets"])?;
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .json(&json!({ "text": self.text }));
        let mut reply = ctx.send(Self::ID, request).await?;

        let data = reply.body.get_mut("data").map(Value::take).unwrap_or(Value::Null);
        let id = data.get("id").and_then(Value::as_str).unwrap_or("?").to_string();
        Ok(Outcome::new(data, format!("Posted tweet {id}")))
    }
}
