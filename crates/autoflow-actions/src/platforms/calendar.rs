//! Google Calendar actions on the primary calendar.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use super::{Handler, HandlerContext, Outcome, count, take_list};
use crate::action::ActionId;
use crate::config::Fields;
use crate::error::{ActionError, Result};
use crate::http::endpoint;

const TOKEN: &str = "GOOGLE_ACCESS_TOKEN";

/// Same shape as JavaScript's `Date.toISOString()`.
fn iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// RFC 3339, or a local date-time without offset (`2024-01-15T10:00:00`),
/// which is taken as UTC.
fn parse_instant(action: ActionId, key: &str, value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ActionError::invalid(action, format!("`{key}` is not a valid timestamp: `{value}`"))
        })
}

/// Create an event; the end defaults to one hour after the start.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
}

#[async_trait]
impl Handler for CreateEvent {
    const ID: ActionId = ActionId::CalendarCreateEvent;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let start = parse_instant(Self::ID, "start_time", &fields.required("start_time")?)?;
        let end = match fields.optional("end_time") {
            Some(end) => parse_instant(Self::ID, "end_time", &end)?,
            None => start + Duration::hours(1),
        };
        if end <= start {
            return Err(ActionError::invalid(
                Self::ID,
                "`end_time` must be after `start_time`",
            ));
        }

        Ok(Self {
            summary: fields.required("summary")?,
            description: fields.optional("description"),
            start,
            end,
            attendees: fields.list("attendees")?,
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let mut event = Map::new();
        event.insert("summary".into(), Value::String(self.summary.clone()));
        event.insert("start".into(), json!({ "dateTime": iso(self.start) }));
        event.insert("end".into(), json!({ "dateTime": iso(self.end) }));
        if let Some(description) = &self.description {
            event.insert("description".into(), Value::String(description.clone()));
        }
        if !self.attendees.is_empty() {
            let attendees: Vec<Value> = self
                .attendees
                .iter()
                .map(|email| json!({ "email": email }))
                .collect();
            event.insert("attendees".into(), Value::Array(attendees));
        }

        let url = endpoint(
            Self::ID,
            &ctx.endpoints.calendar,
            &["calendars", "primary", "events"],
        )?;
        let request = ctx
            .client()
            .post(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .json(&event);
        let reply = ctx.send(Self::ID, request).await?;

        Ok(Outcome::new(
            reply.body,
            format!("Created Calendar event: {}", self.summary),
        ))
    }
}

/// Upcoming single events, ordered by start time.  Output is the bare
/// `items` list.
#[derive(Debug, Clone)]
pub struct GetEvents {
    pub time_min: Option<DateTime<Utc>>,
    pub max_results: u64,
}

#[async_trait]
impl Handler for GetEvents {
    const ID: ActionId = ActionId::CalendarGetEvents;

    fn parse(fields: &Fields<'_>) -> Result<Self> {
        let time_min = fields
            .optional("time_min")
            .map(|t| parse_instant(Self::ID, "time_min", &t))
            .transpose()?;
        Ok(Self {
            time_min,
            max_results: fields.optional_u64("max_results")?.unwrap_or(10),
        })
    }

    async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        let time_min = iso(self.time_min.unwrap_or_else(Utc::now));
        let url = endpoint(
            Self::ID,
            &ctx.endpoints.calendar,
            &["calendars", "primary", "events"],
        )?;
        let request = ctx
            .client()
            .get(url)
            .bearer_auth(ctx.credential(TOKEN)?)
            .query(&[
                ("maxResults", self.max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("timeMin", time_min),
            ]);

        let mut reply = ctx.send(Self::ID, request).await?;
        let items = take_list(&mut reply.body, "items");
        let summary = format!("Retrieved {} events", count(&items));
        Ok(Outcome::new(items, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionConfig;

    fn create(config: Value) -> Result<CreateEvent> {
        let config = ActionConfig::from_value(config);
        CreateEvent::parse(&config.fields(ActionId::CalendarCreateEvent))
    }

    #[test]
    fn end_defaults_to_one_hour_later() {
        let event = create(json!({
            "summary": "Standup",
            "start_time": "2024-01-01T10:00:00Z",
            "attendees": "a@b.com, c@d.com"
        }))
        .unwrap();
        assert_eq!(iso(event.end), "2024-01-01T11:00:00.000Z");
        assert_eq!(event.attendees, vec!["a@b.com", "c@d.com"]);
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let event = create(json!({
            "summary": "Lunch",
            "start_time": "2024-06-01T12:00:00+02:00"
        }))
        .unwrap();
        assert_eq!(iso(event.start), "2024-06-01T10:00:00.000Z");
    }

    #[test]
    fn times_without_offset_are_utc() {
        let event = create(json!({
            "summary": "Review",
            "start_time": "2024-01-15T10:00:00",
            "end_time": "2024-01-15T10:30"
        }))
        .unwrap();
        assert_eq!(iso(event.start), "2024-01-15T10:00:00.000Z");
        assert_eq!(iso(event.end), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn bad_times_are_rejected() {
        assert!(create(json!({"summary": "x", "start_time": "tomorrow"})).is_err());
        assert!(
            create(json!({
                "summary": "x",
                "start_time": "2024-01-01T10:00:00Z",
                "end_time": "2024-01-01T09:00:00Z"
            }))
            .is_err()
        );
    }

    #[test]
    fn get_events_defaults() {
        let config = ActionConfig::from_value(json!({}));
        let action = GetEvents::parse(&config.fields(ActionId::CalendarGetEvents)).unwrap();
        assert_eq!(action.max_results, 10);
        assert!(action.time_min.is_none());
    }
}
