//! Placeholder interpolation from prior node results.
//!
//! String config values may reference earlier outputs as
//! `{{<node_id>.output.<path>}}`, where `<path>` is a dot-separated list of
//! object keys and array indices.  Strings are substituted verbatim, other
//! values as compact JSON.  A placeholder that does not resolve is left in
//! place.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::config::ActionConfig;

static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_\-]+)\.output((?:\.[A-Za-z0-9_\-]+)*)\s*\}\}").ok()
});

/// Replace placeholders in every string value of `config`, recursively.
pub fn interpolate(config: &mut ActionConfig, context: &Value) {
    if !context.is_object() {
        return;
    }
    for value in config.values_mut().values_mut() {
        interpolate_value(value, context);
    }
}

fn interpolate_value(value: &mut Value, context: &Value) {
    match value {
        Value::String(s) if s.contains("{{") => {
            *s = interpolate_str(s, context);
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| interpolate_value(item, context)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|item| interpolate_value(item, context)),
        _ => {}
    }
}

/// Interpolate one string against `context`.
pub fn interpolate_str(input: &str, context: &Value) -> String {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return input.to_string();
    };
    re.replace_all(input, |caps: &Captures<'_>| {
        let node_id = &caps[1];
        let path = caps.get(2).map_or("", |m| m.as_str());
        match lookup(context, node_id, path) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                tracing::debug!(placeholder = &caps[0], "unresolved placeholder left as-is");
                caps[0].to_string()
            }
        }
    })
    .into_owned()
}

fn lookup<'a>(context: &'a Value, node_id: &str, path: &str) -> Option<&'a Value> {
    let mut current = context.get(node_id)?.get("output")?;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Value {
        json!({
            "n1": {
                "status": "success",
                "output": {
                    "channel": "C123",
                    "items": [{"id": "evt-1"}, {"id": "evt-2"}],
                    "count": 2
                }
            },
            "n2": {"status": "failed", "error": "boom"}
        })
    }

    #[test]
    fn nested_paths_and_indices_resolve() {
        let ctx = context();
        assert_eq!(interpolate_str("{{n1.output.channel}}", &ctx), "C123");
        assert_eq!(
            interpolate_str("first: {{ n1.output.items.1.id }}", &ctx),
            "first: evt-2"
        );
        assert_eq!(interpolate_str("{{n1.output.count}} events", &ctx), "2 events");
    }

    #[test]
    fn whole_output_serializes_as_json() {
        let ctx = json!({"a": {"output": {"k": [1, 2]}}});
        assert_eq!(interpolate_str("{{a.output}}", &ctx), r#"{"k":[1,2]}"#);
    }

    #[test]
    fn unresolved_placeholders_are_untouched() {
        let ctx = context();
        for input in [
            "{{missing.output.x}}",
            "{{n2.output.x}}",
            "{{n1.output.items.9.id}}",
            "{{n1.output.channel.deeper}}",
        ] {
            assert_eq!(interpolate_str(input, &ctx), input);
        }
    }

    #[test]
    fn config_values_are_interpolated_recursively() {
        let mut config = ActionConfig::from_value(json!({
            "channel": "{{n1.output.channel}}",
            "body": {"ids": ["{{n1.output.items.0.id}}"]},
            "count": 3
        }));
        interpolate(&mut config, &context());
        assert_eq!(config.get("channel"), Some(&json!("C123")));
        assert_eq!(config.get("body"), Some(&json!({"ids": ["evt-1"]})));
        assert_eq!(config.get("count"), Some(&json!(3)));
    }
}
