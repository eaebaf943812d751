//! Excel Online (Microsoft Graph) table rows.

use async_trait::async_trait;
use serde_json::json;

use super::{Handler, HandlerContext, Outcome};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::Result;
use crate::http::endpoint;

const TOKEN: &str = "MICROSOFT_ACCESS_TOKEN";

#[derive(Debug, Clone)]
pub struct AppendRow {
    pub item_id: String,
    pub table: String,
    pub values: Vec<serde_json::Value>,
}

#[async_trait]
impl Handler for AppendRow {
    const ID: ActionId = ActionId::ExcelAppendRow;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            item_id: fields.required("item_id")?,
            table: fields.required("table")?,
            values: fields.values("values")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.graph,
            &[
                "me", "drive", "items", &self.item_id, "workbook", "tables", &self.table, "rows",
                "add",
            ],
        )?;
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .json(&json!({ "values": [self.values] }));
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!("Added a row to Excel table {}", self.table),
        ))
    }
}
