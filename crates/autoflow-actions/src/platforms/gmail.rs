//! Gmail actions.
//!
//! Sending goes through `users.messages.send` with a raw RFC 822 message,
//! base64url-encoded without padding.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;

use super::{Handler, HandlerContext, Outcome, count, take_list};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "GOOGLE_ACCESS_TOKEN";

/// Build the minimal raw message Gmail accepts: headers, a blank line, then
/// the body, CRLF-separated.
pub fn build_raw_message(to: &str, subject: &str, body: &str) -> String {
    [
        format!("To: {to}"),
        format!("Subject: {subject}"),
        "Content-Type: text/plain; charset=utf-8".to_string(),
        "MIME-Version: 1.0".to_string(),
        String::new(),
        body.to_string(),
    ]
    .join("\r\n")
}

/// base64url (no padding) of the raw message.
pub fn encode_raw_message(raw: &str) -> String {
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

fn reject_header_breaks(action: ActionId, key: &str, value: &str) -> Result<()> {
    if value.contains(['\r', '\n']) {
        return Err(ActionError::invalid(
            action,
            format!("`{key}` must be a single line"),
        ));
    }
    Ok(())
}

/// Send a plain-text email.
#[derive(Debug, Clone)]
pub struct SendEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
impl Handler for SendEmail {
    const ID: ActionId = ActionId::GmailSendEmail;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let to = fields.required("to")?;
        let subject = fields.required("subject")?;
        reject_header_breaks(Self::ID, "to", &to)?;
        reject_header_breaks(Self::ID, "subject", &subject)?;
        Ok(Self {
            to,
            subject,
            body: fields.required("body")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let raw = encode_raw_message(&build_raw_message(&self.to, &self.subject, &self.body));
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.gmail,
            &["users", "me", "messages", "send"],
        )?;
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .json(&json!({ "raw": raw }));
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(reply.body, format!("Email sent to {}", self.to)))
    }
}

/// List message ids matching a search query.
#[derive(Debug, Clone)]
pub struct ListMessages {
    pub query: Option<String>,
    pub max_results: u64,
}

#[async_trait]
impl Handler for ListMessages {
    const ID: ActionId = ActionId::GmailListMessages;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            query: fields.optional("query"),
            max_results: fields.optional_u64("max_results")?.unwrap_or(10),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.gmail, &["users", "me", "messages"])?;
        let mut request = ctx
            .client()
            .get(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .query(&[("maxResults", self.max_results.to_string())]);
        if let Some(q) = &self.query {
            request = request.query(&[("q", q)]);
        }

        let mut reply = ctx.send(Self::ID, request).await?;
        let messages = take_list(&mut reply.body, "messages");
        let summary = format!("Retrieved {} Gmail messages", count(&messages));
        Ok(Outcome::new(messages, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionConfig;

    #[test]
    fn raw_message_round_trips() {
        let raw = build_raw_message("ada@example.com", "Status ✓", "Line one\r\nLine two");
        let encoded = encode_raw_message(&raw);
        assert!(!encoded.contains(['+', '/', '=']));

        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(encoded).unwrap()).unwrap();
        let (headers, body) = decoded.split_once("\r\n\r\n").unwrap();
        let headers: Vec<&str> = headers.split("\r\n").collect();
        assert_eq!(headers[0], "To: ada@example.com");
        assert_eq!(headers[1], "Subject: Status ✓");
        assert_eq!(headers[2], "Content-Type: text/plain; charset=utf-8");
        assert_eq!(body, "Line one\r\nLine two");
    }

    #[test]
    fn known_encoding() {
        // Matches Node's Buffer.from(raw).toString('base64url').
        assert_eq!(encode_raw_message("To: a\r\n\r\nhi?"), "VG86IGENCg0KaGk_");
    }

    #[test]
    fn header_injection_is_rejected() {
        let config = ActionConfig::from_value(serde_json::json!({
            "to": "a@b.com\r\nBcc: evil@x.com",
            "subject": "s",
            "body": "b"
        }));
        assert!(matches!(
            SendEmail::parse(&config.fields(ActionId::GmailSendEmail)),
            Err(ActionError::InvalidConfig { .. })
        ));
    }
}
