//! Twilio SMS.

use async_trait::async_trait;
use serde_json::Value;

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::Result;
use crate::http::endpoint;

const ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
const AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";

#[derive(Debug, Clone)]
pub struct SendSms {
    pub to: String,
    pub from: String,
    pub body: String,
}

#[async_trait]
impl Handler for SendSms {
    const ID: ActionId = ActionId::TwilioSendSms;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            to: fields.required("to")?,
            from: fields.required("from")?,
            body: fields.required("body")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let sid = ctx.credential(ACCOUNT_SID)?;
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.twilio,
            &["Accounts", sid, "Messages.json"],
        )?;
        let request = ctx
            .client()
            .post(url)
            .basic_auth(sid, Some(ctx.credential(AUTH_TOKEN)?))
            .form(&[
                ("To", self.to.as_str()),
                ("From", self.from.as_str()),
                ("Body", self.body.as_str()),
            ]);
        let reply = ctx.send(Self::ID, request).await?;

        let message_sid = reply
            .body
            .get("sid")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        Ok(Outcome::new(
            reply.body,
            format!("Sent SMS {message_sid} to {}", self.to),
        ))
    }
}
