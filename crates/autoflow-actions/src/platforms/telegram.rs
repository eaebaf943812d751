//! Telegram Bot API `sendMessage`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::Result;
use crate::http::{endpoint, require_ok};

const TOKEN: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Clone)]
pub struct SendMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: Option<String>,
}

#[async_trait]
impl Handler for SendMessage {
    const ID: ActionId = ActionId::TelegramSendMessage;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            chat_id: fields.required("chat_id")?,
            text: fields.required("text")?,
            parse_mode: fields.optional("parse_mode"),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        // The token is a path segment: /bot<token>/sendMessage.
        let bot = format!("bot{}", ctx.credential(TOKEN)?);
        let url = endpoint(Self::ID, &ctx.endpoints.telegram, &[&bot, "sendMessage"])?;

        let mut payload = Map::new();
        payload.insert("chat_id".into(), Value::String(self.chat_id.clone()));
        payload.insert("text".into(), Value::String(self.text.clone()));
        if let Some(mode) = &self.parse_mode {
            payload.insert("parse_mode".into(), Value::String(mode.clone()));
        }

        // Telegram reports errors as non-2xx *and* `ok: false`; read both.
        let reply = ctx
            .http
            .exchange(Self::ID, ctx.client().post(url).json(&payload))
            .await?;
        require_ok(Self::ID, &reply.body, "Telegram")?;

        let mut body = reply.body;
        let message = body.get_mut("result").map(Value::take).unwrap_or(Value::Null);
        Ok(Outcome::new(
            message,
            format!("Sent Telegram message to chat {}", self.chat_id),
        ))
    }
}
