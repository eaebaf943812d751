//! Generic HTTP request action.
//!
//! Sends a JSON request to an arbitrary URL.  Headers and body may be given
//! as objects or as JSON-encoded strings.  No credential is resolved; callers
//! put any auth header in `headers` themselves.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: url::Url,
    pub method: reqwest::Method,
    pub headers: Map<String, Value>,
    pub body: Option<Value>,
}

/// Parse an HTTP method string into a `reqwest::Method`.
/// Returns `None` if the method is not supported.
fn parse_method(method: &str) -> Option<reqwest::Method> {
    match method.to_uppercase().as_str() {
        "GET" => Some(reqwest::Method::GET),
        "POST" => Some(reqwest::Method::POST),
        "PUT" => Some(reqwest::Method::PUT),
        "PATCH" => Some(reqwest::Method::PATCH),
        "DELETE" => Some(reqwest::Method::DELETE),
        "HEAD" => Some(reqwest::Method::HEAD),
        _ => None,
    }
}

#[async_trait]
impl Handler for HttpRequest {
    const ID: ActionId = ActionId::HttpRequest;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let url_str = fields.required("url")?;
        let url = url::Url::parse(&url_str)
            .map_err(|e| ActionError::invalid(Self::ID, format!("invalid URL `{url_str}`: {e}")))?;

        let method_str = fields.optional_or("method", "GET");
        let method = parse_method(&method_str).ok_or_else(|| {
            ActionError::invalid(
                Self::ID,
                format!(
                    "unsupported HTTP method `{method_str}`. Supported: GET, POST, PUT, PATCH, DELETE, HEAD"
                ),
            )
        })?;

        Ok(Self {
            url,
            method,
            headers: fields.optional_object("headers")?.unwrap_or_default(),
            body: fields.optional_json("body")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        debug!(method = %self.method, url = %self.url, "executing HTTP request");

        let mut request = ctx.client().request(self.method.clone(), self.url.clone());
        if !self
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"))
        {
            request = request.header("Content-Type", "application/json");
        }

        for (key, value) in &self.headers {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                ActionError::invalid(Self::ID, format!("invalid header name `{key}`: {e}"))
            })?;
            let value = reqwest::header::HeaderValue::from_str(&value).map_err(|e| {
                ActionError::invalid(Self::ID, format!("invalid header value for `{key}`: {e}"))
            })?;
            request = request.header(name, value);
        }

        if self.method != reqwest::Method::GET && self.method != reqwest::Method::HEAD {
            let body = self
                .body
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new()));
            request = request.body(body.to_string());
        }

        let reply = ctx.http.exchange(Self::ID, request).await?;
        if !(200..300).contains(&reply.status) {
            // The whole body is the useful detail for an arbitrary endpoint.
            return Err(ActionError::Http {
                action: Self::ID,
                status: reply.status,
                message: reply.body.to_string(),
            });
        }

        Ok(Outcome::new(
            reply.body,
            format!("Request to {} finished with status {}", self.url, reply.status),
        ))
    }
}
