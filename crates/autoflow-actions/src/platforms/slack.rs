//! Slack Web API actions.
//!
//! Slack answers `200` for most failures and reports them through the
//! body's `ok` flag, so every reply goes through [`require_ok`].

use async_trait::async_trait;
use serde_json::json;

use super::{Handler, HandlerContext, Outcome, count, take_list};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::Result;
use crate::http::{endpoint, require_ok};

const TOKEN: &str = "SLACK_BOT_TOKEN";

/// `chat.postMessage`.
#[derive(Debug, Clone)]
pub struct SendMessage {
    pub channel: String,
    pub text: String,
}

#[async_trait]
impl Handler for SendMessage {
    const ID: ActionId = ActionId::SlackSendMessage;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            channel: fields.required("channel")?,
            text: fields.required("text")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.slack, &["chat.postMessage"])?;
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .json(&json!({ "channel": self.channel, "text": self.text }));

        let reply = ctx.send(Self::ID, request).await?;
        require_ok(Self::ID, &reply.body, "Slack")?;

        Ok(Outcome::new(
            reply.body,
            format!("Posted to Slack channel {}", self.channel),
        ))
    }
}

/// `conversations.list`.
#[derive(Debug, Clone)]
pub struct ListChannels {
    pub limit: u64,
    pub types: String,
}

#[async_trait]
impl Handler for ListChannels {
    const ID: ActionId = ActionId::SlackListChannels;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            limit: fields.optional_u64("limit")?.unwrap_or(100),
            types: fields.optional_or("types", "public_channel"),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.slack, &["conversations.list"])?;
        let request = ctx
            .client()
            .get(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .query(&[("limit", self.limit.to_string()), ("types", self.types.clone())]);

        let mut reply = ctx.send(Self::ID, request).await?;
        require_ok(Self::ID, &reply.body, "Slack")?;

        let channels = take_list(&mut reply.body, "channels");
        let summary = format!("Retrieved {} Slack channels", count(&channels));
        Ok(Outcome::new(channels, summary))
    }
}
