//! Action configuration maps.
//!
//! Node configs arrive either as bare scalars (`"channel": "#ops"`) or in
//! the editor's `{ "mode": "manual" | "ai", "value": ... }` envelope.
//! [`ActionConfig`] flattens the envelope once on construction; handlers
//! then read typed values through [`Fields`].

use serde_json::{Map, Value};

use crate::action::ActionId;
use crate::error::{ActionError, Result};

/// A flattened configuration object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionConfig {
    values: Map<String, Value>,
}

impl ActionConfig {
    /// Build from a JSON value.  Anything other than an object is treated as
    /// an empty config.
    pub fn from_value(value: Value) -> Self {
        let values = match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| (key, unwrap_envelope(value)))
                .collect(),
            _ => Map::new(),
        };
        Self { values }
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether `key` holds something other than null or an empty string.
    pub fn is_present(&self, key: &str) -> bool {
        match self.values.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Mutable access for placeholder interpolation.
    pub(crate) fn values_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.values
    }

    /// The config as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Typed reader bound to `action` for error reporting.
    pub fn fields(&self, action: ActionId) -> Fields<'_> {
        Fields {
            action,
            config: self,
        }
    }
}

/// `{ mode, value }` → `value`; anything else is returned unchanged.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("mode") && map.contains_key("value") => {
            map.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Typed reader
// ---------------------------------------------------------------------------

/// Typed access to an [`ActionConfig`] on behalf of one action.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    action: ActionId,
    config: &'a ActionConfig,
}

impl Fields<'_> {
    pub fn action(&self) -> ActionId {
        self.action
    }

    /// A required scalar, rendered as a string.
    pub fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| ActionError::missing(self.action, key))
    }

    /// An optional scalar, rendered as a string.  Empty strings are absent.
    pub fn optional(&self, key: &str) -> Option<String> {
        if !self.config.is_present(key) {
            return None;
        }
        match self.config.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Optional string with a fallback.
    pub fn optional_or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// An optional non-negative integer, given as a number or numeric string.
    pub fn optional_u64(&self, key: &str) -> Result<Option<u64>> {
        if !self.config.is_present(key) {
            return Ok(None);
        }
        let parsed = match self.config.get(key) {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| {
            ActionError::invalid(self.action, format!("`{key}` must be a non-negative integer"))
        })
    }

    /// A required non-negative integer.
    pub fn required_u64(&self, key: &str) -> Result<u64> {
        self.optional_u64(key)?
            .ok_or_else(|| ActionError::missing(self.action, key))
    }

    /// An optional JSON value.  Strings are parsed as JSON; objects and
    /// arrays are taken as-is.
    pub fn optional_json(&self, key: &str) -> Result<Option<Value>> {
        if !self.config.is_present(key) {
            return Ok(None);
        }
        match self.config.get(key) {
            Some(Value::String(s)) => serde_json::from_str(s).map(Some).map_err(|e| {
                ActionError::invalid(self.action, format!("`{key}` is not valid JSON: {e}"))
            }),
            Some(other) => Ok(Some(other.clone())),
            None => Ok(None),
        }
    }

    /// An optional JSON object.
    pub fn optional_object(&self, key: &str) -> Result<Option<Map<String, Value>>> {
        match self.optional_json(key)? {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(ActionError::invalid(
                self.action,
                format!("`{key}` must be a JSON object"),
            )),
        }
    }

    /// A list of strings: a JSON array, or a comma-separated string.
    pub fn list(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .values(key)?
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect())
    }

    /// A row of cell values: a JSON array (kept typed) or a comma-separated
    /// string (each cell a string).
    pub fn values(&self, key: &str) -> Result<Vec<Value>> {
        if !self.config.is_present(key) {
            return Ok(Vec::new());
        }
        match self.config.get(key) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::String(s)) if s.trim_start().starts_with('[') => {
                match serde_json::from_str::<Value>(s) {
                    Ok(Value::Array(items)) => Ok(items),
                    _ => Err(ActionError::invalid(
                        self.action,
                        format!("`{key}` is not a valid JSON array"),
                    )),
                }
            }
            Some(Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect()),
            Some(other) => Ok(vec![other.clone()]),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelopes_are_flattened() {
        let config = ActionConfig::from_value(json!({
            "channel": {"mode": "manual", "value": "#ops"},
            "text": "plain",
            "nested": {"value": "kept"}
        }));
        assert_eq!(config.get("channel"), Some(&json!("#ops")));
        assert_eq!(config.get("text"), Some(&json!("plain")));
        assert_eq!(config.get("nested"), Some(&json!({"value": "kept"})));
    }

    #[test]
    fn non_object_config_is_empty() {
        let config = ActionConfig::from_value(json!("oops"));
        assert_eq!(config, ActionConfig::default());
    }

    #[test]
    fn blank_strings_are_absent() {
        let config = ActionConfig::from_value(json!({"a": "  ", "b": null, "c": 0}));
        assert!(!config.is_present("a"));
        assert!(!config.is_present("b"));
        assert!(config.is_present("c"));
        assert!(!config.is_present("d"));
    }

    #[test]
    fn scalars_render_as_strings() {
        let config = ActionConfig::from_value(json!({"n": 42, "flag": true}));
        let fields = config.fields(ActionId::HttpRequest);
        assert_eq!(fields.required("n").unwrap(), "42");
        assert_eq!(fields.optional("flag").as_deref(), Some("true"));
        assert!(matches!(
            fields.required("missing"),
            Err(ActionError::MissingFields { .. })
        ));
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let config = ActionConfig::from_value(json!({"a": "7", "b": 3, "c": "x", "d": -1}));
        let fields = config.fields(ActionId::KubernetesScaleDeployment);
        assert_eq!(fields.optional_u64("a").unwrap(), Some(7));
        assert_eq!(fields.required_u64("b").unwrap(), 3);
        assert!(fields.optional_u64("c").is_err());
        assert!(fields.optional_u64("d").is_err());
        assert_eq!(fields.optional_u64("e").unwrap(), None);
    }

    #[test]
    fn json_strings_are_parsed() {
        let config = ActionConfig::from_value(json!({
            "headers": "{\"X-Trace\": \"1\"}",
            "body": {"k": "v"},
            "broken": "{nope"
        }));
        let fields = config.fields(ActionId::HttpRequest);
        assert_eq!(
            fields.optional_object("headers").unwrap().unwrap().get("X-Trace"),
            Some(&json!("1"))
        );
        assert_eq!(fields.optional_json("body").unwrap(), Some(json!({"k": "v"})));
        assert!(fields.optional_json("broken").is_err());
    }

    #[test]
    fn lists_accept_arrays_and_csv() {
        let config = ActionConfig::from_value(json!({
            "csv": "a@b.com, c@d.com,",
            "arr": ["x", 1],
            "json": "[1, \"two\"]"
        }));
        let fields = config.fields(ActionId::CalendarCreateEvent);
        assert_eq!(fields.list("csv").unwrap(), vec!["a@b.com", "c@d.com"]);
        assert_eq!(fields.list("arr").unwrap(), vec!["x", "1"]);
        assert_eq!(fields.values("json").unwrap(), vec![json!(1), json!("two")]);
        assert!(fields.list("none").unwrap().is_empty());
    }
}
