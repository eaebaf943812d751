//! Notion API actions.
//!
//! All requests carry `Notion-Version: 2022-06-28`.  Notion reports errors
//! with a non-2xx status and `{ "object": "error", "message": .. }`.

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "NOTION_API_KEY";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion limits one rich-text object to 2000 characters.
const MAX_TEXT_CHARS: usize = 2_000;

fn authorized(
    ctx: &HandlerContext<'_>,
    builder: reqwest::RequestBuilder,
) -> Result<reqwest::RequestBuilder> {
    Ok(builder
        .bearer_auth(ctx.credential(TOKEN)?)
        .header("Notion-Version", NOTION_VERSION))
}

/// Create a page in a database.
#[derive(Debug, Clone)]
pub struct CreatePage {
    pub database_id: String,
    pub properties: Map<String, Value>,
}

#[async_trait]
impl Handler for CreatePage {
    const ID: ActionId = ActionId::NotionCreatePage;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            database_id: fields.required("database_id")?,
            properties: fields.optional_object("properties")?.unwrap_or_default(),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(Self::ID, &ctx.endpoints.notion, &["pages"])?;
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": self.properties,
        });
        let request = authorized(ctx, ctx.client().post(url))?.json(&body);
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!("Created Notion page in DB {}", self.database_id),
        ))
    }
}

/// Query a database, optionally filtered.
#[derive(Debug, Clone)]
pub struct QueryDatabase {
    pub database_id: String,
    pub filter: Option<Value>,
}

#[async_trait]
impl Handler for QueryDatabase {
    const ID: ActionId = ActionId::NotionQueryDb;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            database_id: fields.required("database_id")?,
            filter: fields.optional_json("filter")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.notion,
            &["databases", &self.database_id, "query"],
        )?;
        let body = match &self.filter {
            Some(filter) => json!({ "filter": filter }),
            None => json!({}),
        };
        let request = authorized(ctx, ctx.client().post(url))?.json(&body);
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!("Queried Notion DB {}", self.database_id),
        ))
    }
}

/// Append text to a page, one paragraph block per non-empty line.
#[derive(Debug, Clone)]
pub struct AppendText {
    pub page_id: String,
    pub paragraphs: Vec<String>,
}

#[async_trait]
impl Handler for AppendText {
    const ID: ActionId = ActionId::NotionAppendText;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let content = fields.required("content")?;
        let paragraphs: Vec<String> = content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect();

        if let Some(long) = paragraphs
            .iter()
            .find(|p| p.chars().count() > MAX_TEXT_CHARS)
        {
            return Err(ActionError::invalid(
                Self::ID,
                format!(
                    "a paragraph of {} characters exceeds Notion's {MAX_TEXT_CHARS}-character limit",
                    long.chars().count()
                ),
            ));
        }

        Ok(Self {
            page_id: fields.required("page_id")?,
            paragraphs,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.notion,
            &["blocks", &self.page_id, "children"],
        )?;
        let request = authorized(ctx, ctx.client().patch(url))?
            .json(&json!({ "children": paragraph_blocks(&self.paragraphs) }));
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!(
                "Appended {} paragraph(s) to Notion page {}",
                self.paragraphs.len(),
                self.page_id
            ),
        ))
    }
}

fn paragraph_blocks(paragraphs: &[String]) -> Vec<Value> {
    paragraphs
        .iter()
        .map(|text| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [{ "type": "text", "text": { "content": text } }]
                }
            })
        })
        .collect()
}
