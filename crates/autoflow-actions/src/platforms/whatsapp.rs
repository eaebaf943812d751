//! WhatsApp Cloud API text messages.

use async_trait::async_trait;
use serde_json::json;

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "WHATSAPP_ACCESS_TOKEN";
const PHONE_NUMBER_ID: &str = "WHATSAPP_PHONE_NUMBER_ID";

#[derive(Debug, Clone)]
pub struct SendMessage {
    /// Recipient in E.164 form without the leading `+`.
    pub to: String,
    pub text: String,
}

#[async_trait]
impl Handler for SendMessage {
    const ID: ActionId = ActionId::WhatsappSendMessage;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let raw = fields.required("to")?;
        let to: String = raw
            .trim()
            .trim_start_matches('+')
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if to.is_empty() || !to.chars().all(|c| c.is_ascii_digit()) {
            return Err(ActionError::invalid(
                Self::ID,
                format!("`to` must be a phone number, got `{raw}`"),
            ));
        }
        Ok(Self {
            to,
            text: fields.required("text")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.whatsapp,
            &[ctx.credential(PHONE_NUMBER_ID)?, "messages"],
        )?;
        let body = json!({
            "messaging_product": "whatsapp",
            "to": self.to,
            "type": "text",
            "text": { "body": self.text },
        });
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .json(&body);
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!("Sent WhatsApp message to {}", self.to),
        ))
    }
}
