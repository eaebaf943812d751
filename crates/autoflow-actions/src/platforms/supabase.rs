//! Supabase (PostgREST) table access.
//!
//! The project URL is itself a credential (`SUPABASE_URL`), so these
//! handlers do not use [`Endpoints`](crate::http::Endpoints).

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Handler, HandlerContext, Outcome, count};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const PROJECT_URL: &str = "SUPABASE_URL";
const SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";

fn table_request(
    action: ActionId,
    ctx: &HandlerContext<'_>,
    method: reqwest::Method,
    table: &str,
) -> Result<reqwest::RequestBuilder> {
    let base = ctx.credential(PROJECT_URL)?.trim_end_matches('/');
    let key = ctx.credential(SERVICE_KEY)?;
    let url = endpoint(action, base, &["rest", "v1", table])?;
    Ok(ctx
        .client()
        .request(method, url)
        .header("apikey", key)
        .bearer_auth(key))
}

#[derive(Debug, Clone)]
pub struct InsertRow {
    pub table: String,
    pub row: Map<String, Value>,
}

#[async_trait]
impl Handler for InsertRow {
    const ID: ActionId = ActionId::SupabaseInsertRow;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let row = fields
            .optional_object("row")?
            .ok_or_else(|| ActionError::missing(Self::ID, "row"))?;
        Ok(Self {
            table: fields.required("table")?,
            row,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let request = table_request(Self::ID, ctx, reqwest::Method::POST, &self.table)?
            .header("Prefer", "return=representation")
            .json(&self.row);
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!("Inserted a row into {}", self.table),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct SelectRows {
    pub table: String,
    pub select: String,
    /// PostgREST filters, e.g. `status=eq.open&owner=eq.42`.
    pub filters: Vec<(String, String)>,
    pub limit: Option<u64>,
}

#[async_trait]
impl Handler for SelectRows {
    const ID: ActionId = ActionId::SupabaseSelectRows;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let filters = fields
            .optional("filter")
            .map(|f| {
                url::form_urlencoded::parse(f.trim_start_matches('?').as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            table: fields.required("table")?,
            select: fields.optional_or("select", "*"),
            filters,
            limit: fields.optional_u64("limit")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let mut query = vec![("select".to_string(), self.select.clone())];
        query.extend(self.filters.iter().cloned());
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }

        let request =
            table_request(Self::ID, ctx, reqwest::Method::GET, &self.table)?.query(&query);
        let reply = ctx.send(Self::ID, request).await?;

        let summary = format!("Selected {} rows from {}", count(&reply.body), self.table);
        Ok(Outcome::new(reply.body, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionConfig;
    use serde_json::json;

    #[test]
    fn filter_string_becomes_query_pairs() {
        let config = ActionConfig::from_value(json!({
            "table": "tickets",
            "filter": "status=eq.open&owner=eq.42"
        }));
        let select = SelectRows::parse(&config.fields(ActionId::SupabaseSelectRows)).unwrap();
        assert_eq!(select.select, "*");
        assert_eq!(
            select.filters,
            vec![
                ("status".to_string(), "eq.open".to_string()),
                ("owner".to_string(), "eq.42".to_string()),
            ]
        );
    }

    #[test]
    fn row_must_be_an_object() {
        let config = ActionConfig::from_value(json!({"table": "t", "row": "[1, 2]"}));
        assert!(InsertRow::parse(&config.fields(ActionId::SupabaseInsertRow)).is_err());
    }
}
