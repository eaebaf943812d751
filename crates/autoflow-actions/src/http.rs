//! Shared outbound HTTP plumbing for provider handlers.
//!
//! Every handler goes through [`ProviderHttp::send`], which reads the body,
//! parses it as JSON when possible, and turns a non-2xx status into
//! [`ActionError::Http`] with the provider's own error message extracted.

use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::action::ActionId;
use crate::error::{ActionError, Result};

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Base URLs of the providers whose API host is fixed.
///
/// Discord, Supabase and Kubernetes are absent: their URLs come from
/// credentials.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub slack: String,
    pub telegram: String,
    pub notion: String,
    pub gmail: String,
    pub calendar: String,
    pub docs: String,
    pub sheets: String,
    pub github: String,
    pub jira: String,
    pub linkedin: String,
    pub x: String,
    pub vercel: String,
    pub graph: String,
    pub whatsapp: String,
    pub twilio: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            slack: "https://slack.com/api".into(),
            telegram: "https://api.telegram.org".into(),
            notion: "https://api.notion.com/v1".into(),
            gmail: "https://gmail.googleapis.com/gmail/v1".into(),
            calendar: "https://www.googleapis.com/calendar/v3".into(),
            docs: "https://docs.googleapis.com/v1".into(),
            sheets: "https://sheets.googleapis.com/v4".into(),
            github: "https://api.github.com".into(),
            jira: "https://api.atlassian.com".into(),
            linkedin: "https://api.linkedin.com/v2".into(),
            x: "https://api.twitter.com/2".into(),
            vercel: "https://api.vercel.com".into(),
            graph: "https://graph.microsoft.com/v1.0".into(),
            whatsapp: "https://graph.facebook.com/v19.0".into(),
            twilio: "https://api.twilio.com/2010-04-01".into(),
        }
    }
}

impl Endpoints {
    /// Every provider served from one base URL (mock servers, egress proxies).
    pub fn uniform(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            slack: base.clone(),
            telegram: base.clone(),
            notion: base.clone(),
            gmail: base.clone(),
            calendar: base.clone(),
            docs: base.clone(),
            sheets: base.clone(),
            github: base.clone(),
            jira: base.clone(),
            linkedin: base.clone(),
            x: base.clone(),
            vercel: base.clone(),
            graph: base.clone(),
            whatsapp: base.clone(),
            twilio: base,
        }
    }
}

/// Join `segments` onto `base`, percent-encoding each segment.
pub fn endpoint(action: ActionId, base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| ActionError::invalid(action, format!("invalid base URL `{base}`: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ActionError::invalid(action, format!("base URL `{base}` cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A parsed provider response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    /// Parsed JSON; `Null` for an empty body, `{"text": ..}` for non-JSON.
    pub body: Value,
}

/// HTTP client shared by all handlers.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    client: reqwest::Client,
}

impl Default for ProviderHttp {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderHttp {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("autoflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send and read the response without judging its status.
    pub async fn exchange(&self, action: ActionId, request: reqwest::RequestBuilder) -> Result<Reply> {
        let response = request.send().await.map_err(|e| ActionError::Transport {
            action,
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| ActionError::Transport {
            action,
            reason: format!("failed to read response body: {e}"),
        })?;

        debug!(action = %action, status, body_length = text.len(), "provider responded");

        Ok(Reply {
            status,
            headers,
            body: parse_body(&text),
        })
    }

    /// Send, and fail with [`ActionError::Http`] on a non-2xx status.
    pub async fn send(&self, action: ActionId, request: reqwest::RequestBuilder) -> Result<Reply> {
        let reply = self.exchange(action, request).await?;
        if !(200..300).contains(&reply.status) {
            return Err(ActionError::Http {
                action,
                status: reply.status,
                message: error_message(&reply.body),
            });
        }
        Ok(reply)
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "text": text }))
}

/// Best human-readable error text from a provider error body.
///
/// Covers the shapes in use: `{error: {message}}` (Google, Vercel, Graph),
/// `{message}` (Notion, GitHub, Twilio, PostgREST, Kubernetes),
/// `{errorMessages: [..]}` (Jira), `{description}` (Telegram), `{detail}`
/// (X), and bare `{error}` strings.
pub fn error_message(body: &Value) -> String {
    let str_at = |pointer: &str| body.pointer(pointer).and_then(Value::as_str);

    if let Some(msg) = str_at("/error/message").or_else(|| str_at("/message")) {
        return msg.to_string();
    }
    if let Some(messages) = body.get("errorMessages").and_then(Value::as_array)
        && !messages.is_empty()
    {
        return messages
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; ");
    }
    if let Some(msg) = str_at("/error_description")
        .or_else(|| str_at("/description"))
        .or_else(|| str_at("/detail"))
        .or_else(|| str_at("/error"))
        .or_else(|| str_at("/text"))
    {
        return msg.to_string();
    }
    body.to_string()
}

/// Treat a 2xx body whose `ok` flag is false as the action's failure.
pub fn require_ok(action: ActionId, body: &Value, provider: &str) -> Result<()> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    let detail = body
        .get("error")
        .or_else(|| body.get("description"))
        .and_then(Value::as_str)
        .unwrap_or("unknown_error");
    Err(ActionError::ProviderError {
        action,
        message: format!("{provider} API error: {detail}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_shapes() {
        assert_eq!(
            error_message(&json!({"error": {"code": 401, "message": "Invalid Credentials"}})),
            "Invalid Credentials"
        );
        assert_eq!(
            error_message(&json!({"object": "error", "message": "Could not find database"})),
            "Could not find database"
        );
        assert_eq!(
            error_message(&json!({"errorMessages": ["Project does not exist", "Bad"]})),
            "Project does not exist; Bad"
        );
        assert_eq!(
            error_message(&json!({"ok": false, "description": "Bad Request: chat not found"})),
            "Bad Request: chat not found"
        );
        assert_eq!(error_message(&json!({"error": "invalid_auth"})), "invalid_auth");
        assert_eq!(error_message(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn ok_flag_is_required() {
        assert!(require_ok(ActionId::SlackSendMessage, &json!({"ok": true}), "Slack").is_ok());

        let err = require_ok(
            ActionId::SlackSendMessage,
            &json!({"ok": false, "error": "channel_not_found"}),
            "Slack",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Slack API error: channel_not_found");

        assert!(require_ok(ActionId::SlackSendMessage, &json!({}), "Slack").is_err());
    }

    #[test]
    fn bodies_parse_leniently() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_body("Not Found"), json!({"text": "Not Found"}));
    }

    #[test]
    fn endpoint_encodes_segments() {
        let url = endpoint(
            ActionId::SheetsReadRange,
            "https://sheets.example.com/v4/",
            &["spreadsheets", "abc", "values", "Sheet 1!A1:B2"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/abc/values/Sheet%201!A1:B2"
        );

        assert!(endpoint(ActionId::SheetsReadRange, "not a url", &["x"]).is_err());
    }

    #[test]
    fn uniform_endpoints_trim_trailing_slash() {
        let endpoints = Endpoints::uniform("http://127.0.0.1:9999/");
        assert_eq!(endpoints.slack, "http://127.0.0.1:9999");
        assert_eq!(endpoints.twilio, "http://127.0.0.1:9999");
    }
}
