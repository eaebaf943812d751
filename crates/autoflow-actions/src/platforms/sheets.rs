//! Google Sheets values API.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Handler, HandlerContext, Outcome, count, take_list};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "GOOGLE_ACCESS_TOKEN";

/// Append one row after the last row of `range`.
#[derive(Debug, Clone)]
pub struct AppendRow {
    pub spreadsheet_id: String,
    pub range: String,
    pub values: Vec<Value>,
}

#[async_trait]
impl Handler for AppendRow {
    const ID: ActionId = ActionId::SheetsAppendRow;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let values = fields.values("values")?;
        if values.is_empty() {
            return Err(ActionError::invalid(Self::ID, "`values` has no cells"));
        }
        Ok(Self {
            spreadsheet_id: fields.required("spreadsheet_id")?,
            range: fields.required("range")?,
            values,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.sheets,
            &[
                "spreadsheets",
                &self.spreadsheet_id,
                "values",
                &format!("{}:append", self.range),
            ],
        )?;
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": [self.values] }));
        let reply = ctx.send(Self::ID, request).await?;

        let updated = reply
            .body
            .pointer("/updates/updatedRange")
            .and_then(Value::as_str)
            .unwrap_or(&self.range)
            .to_string();
        Ok(Outcome::new(
            reply.body,
            format!("Appended {} cell(s) to {updated}", self.values.len()),
        ))
    }
}

/// Read the values of a range.  Output is the bare row list.
#[derive(Debug, Clone)]
pub struct ReadRange {
    pub spreadsheet_id: String,
    pub range: String,
}

#[async_trait]
impl Handler for ReadRange {
    const ID: ActionId = ActionId::SheetsReadRange;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            spreadsheet_id: fields.required("spreadsheet_id")?,
            range: fields.required("range")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.sheets,
            &["spreadsheets", &self.spreadsheet_id, "values", &self.range],
        )?;
        let request = ctx.client().get(url).bearer_auth(ctx.credential(TOKEN)?);

        let mut reply = ctx.send(Self::ID, request).await?;
        let rows = take_list(&mut reply.body, "values");
        let summary = format!("Read {} rows from {}", count(&rows), self.range);
        Ok(Outcome::new(rows, summary))
    }
}
