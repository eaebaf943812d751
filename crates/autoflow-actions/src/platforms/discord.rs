//! Discord webhook messages.
//!
//! The webhook URL itself is the credential.  `?wait=true` makes Discord
//! return the created message instead of `204 No Content`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};

const WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";

/// Discord caps message content at 2000 characters.
const MAX_CONTENT_CHARS: usize = 2_000;

#[derive(Debug, Clone)]
pub struct SendMessage {
    pub content: String,
    pub username: Option<String>,
}

#[async_trait]
impl Handler for SendMessage {
    const ID: ActionId = ActionId::DiscordSendMessage;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let content = fields.required("content")?;
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(ActionError::invalid(
                Self::ID,
                format!("`content` exceeds {MAX_CONTENT_CHARS} characters"),
            ));
        }
        Ok(Self {
            content,
            username: fields.optional("username"),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let webhook = ctx.credential(WEBHOOK_URL)?;
        let url = url::Url::parse(webhook)
            .map_err(|e| ActionError::invalid(Self::ID, format!("invalid webhook URL: {e}")))?;

        let mut payload = Map::new();
        payload.insert("content".into(), Value::String(self.content.clone()));
        if let Some(username) = &self.username {
            payload.insert("username".into(), Value::String(username.clone()));
        }

        let request = ctx
            .client()
            .post(url)
            .query(&[("wait", "true")])
            .json(&payload);
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(reply.body, "Posted message to Discord webhook"))
    }
}
