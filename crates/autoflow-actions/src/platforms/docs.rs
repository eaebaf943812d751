//! Google Docs: create a document, then insert its initial text.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "GOOGLE_ACCESS_TOKEN";

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub title: String,
    pub content: Option<String>,
}

#[async_trait]
impl Handler for CreateDocument {
    const ID: ActionId = ActionId::DocsCreateDocument;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            title: fields.required("title")?,
            content: fields.optional("content"),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let token = ctx.credential(TOKEN)?;

        let url = endpoint(Self::ID, &ctx.endpoints.docs, &["documents"])?;
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "title": self.title }));
        let created = ctx.send(Self::ID, request).await?.body;

        let document_id = created
            .get("documentId")
            .and_then(Value::as_str)
            .ok_or_else(|| ActionError::Decode {
                action: Self::ID,
                reason: "create response has no documentId".into(),
            })?
            .to_string();

        let Some(content) = &self.content else {
            return Ok(Outcome::new(
                created,
                format!("Created Google Doc '{}' ({document_id})", self.title),
            ));
        };

        // Index 1 is the start of the body of a fresh document.
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.docs,
            &["documents", &format!("{document_id}:batchUpdate")],
        )?;
        let request = ctx.client().post(url).bearer_auth(token).json(&json!({
            "requests": [{
                "insertText": { "location": { "index": 1 }, "text": content }
            }]
        }));
        ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            created,
            format!(
                "Created Google Doc '{}' ({document_id}) with {} characters",
                self.title,
                content.chars().count()
            ),
        ))
    }
}
