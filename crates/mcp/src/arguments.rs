//! Coercion of flat caller arguments against a tool's parameter schema.

use serde_json::{Map, Value};

use crate::registry::{ParamSpec, ParamType};
use crate::{ToolError, ToolResult};

/// Arguments after binding: every declared parameter that was supplied or has
/// a default is present and already has its declared JSON type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn bind(params: &[ParamSpec], raw: Option<&Map<String, Value>>) -> ToolResult<Self> {
        let mut values = Map::new();

        for spec in params {
            let supplied = raw.and_then(|raw| raw.get(spec.name)).filter(|value| !value.is_null());
            match (supplied, &spec.default) {
                (Some(value), _) => {
                    values.insert(spec.name.to_string(), coerce(spec, value)?);
                }
                (None, Some(default)) => {
                    values.insert(spec.name.to_string(), default.clone());
                }
                (None, None) if spec.required => {
                    return Err(ToolError::malformed(spec.name, "missing required argument"));
                }
                (None, None) => {}
            }
        }

        Ok(Self { values })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn str(&self, name: &str) -> ToolResult<&str> {
        self.opt_str(name).ok_or_else(|| ToolError::malformed(name, "missing required argument"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> ToolResult<i64> {
        self.opt_int(name).ok_or_else(|| ToolError::malformed(name, "missing required argument"))
    }

    pub fn opt_int(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> ToolResult<bool> {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| ToolError::malformed(name, "missing required argument"))
    }

    /// Absent lists read as empty.
    pub fn string_list(&self, name: &str) -> Vec<String> {
        self.values
            .get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn coerce(spec: &ParamSpec, value: &Value) -> ToolResult<Value> {
    let name = spec.name;
    match spec.param_type {
        ParamType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) => Ok(Value::String(number.to_string())),
            Value::Bool(flag) => Ok(Value::String(flag.to_string())),
            _ => Err(ToolError::malformed(name, "expected a string")),
        },
        ParamType::Integer => coerce_integer(value)
            .map(Value::from)
            .ok_or_else(|| ToolError::malformed(name, format!("expected an integer, got {value}"))),
        ParamType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(text) if text.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(text) if text.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(ToolError::malformed(name, format!("expected a boolean, got {value}"))),
        },
        ParamType::StringList => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(_) => Ok(item.clone()),
                    Value::Number(number) => Ok(Value::String(number.to_string())),
                    _ => Err(ToolError::malformed(name, "expected a list of strings")),
                })
                .collect::<ToolResult<Vec<_>>>()
                .map(Value::Array),
            Value::String(text) => Ok(Value::Array(
                split_list(text).map(|item| Value::String(item.to_string())).collect(),
            )),
            _ => Err(ToolError::malformed(name, "expected a list of strings")),
        },
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Parses a comma-separated list of integer ids such as `"12, 15,18"`.
pub fn parse_id_list(name: &str, raw: &str) -> ToolResult<Vec<i64>> {
    let ids = split_list(raw)
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| ToolError::malformed(name, format!("`{token}` is not an integer id")))
        })
        .collect::<ToolResult<Vec<_>>>()?;

    if ids.is_empty() {
        return Err(ToolError::malformed(name, "expected at least one id"));
    }
    Ok(ids)
}

/// Parses JSON text that must hold an array, e.g. a list of sequence steps.
pub fn parse_json_array(name: &str, raw: &str) -> ToolResult<Vec<Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(ToolError::malformed(
            name,
            format!("expected a JSON array, got {}", json_kind(&other)),
        )),
        Err(error) => Err(ToolError::malformed(name, format!("invalid JSON: {error}"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use crate::arguments::{parse_id_list, parse_json_array, Arguments};
    use crate::registry::{ParamSpec, ParamType};
    use crate::ToolError;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn schema() -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("name", ParamType::String, "Lead name"),
            ParamSpec::with_default("limit", ParamType::Integer, "Page size", 20),
            ParamSpec::with_default("active_only", ParamType::Boolean, "Only active", false),
            ParamSpec::optional("labels", ParamType::StringList, "Labels"),
            ParamSpec::optional("score", ParamType::Integer, "Score"),
        ]
    }

    #[test]
    fn defaults_fill_missing_and_null_arguments() {
        let raw = object(json!({ "name": "Ana", "limit": null }));

        let args = Arguments::bind(&schema(), Some(&raw)).expect("bind");

        assert_eq!(args.str("name").ok(), Some("Ana"));
        assert_eq!(args.int("limit").ok(), Some(20));
        assert_eq!(args.bool("active_only").ok(), Some(false));
        assert!(!args.contains("score"));
        assert!(args.string_list("labels").is_empty());
    }

    #[test]
    fn scalars_are_coerced_to_declared_types() {
        let raw = object(json!({
            "name": 42,
            "limit": "15",
            "active_only": "TRUE",
            "labels": "bug, urgent,,",
            "score": 7.0,
        }));

        let args = Arguments::bind(&schema(), Some(&raw)).expect("bind");

        assert_eq!(args.str("name").ok(), Some("42"));
        assert_eq!(args.int("limit").ok(), Some(15));
        assert_eq!(args.bool("active_only").ok(), Some(true));
        assert_eq!(args.string_list("labels"), vec!["bug".to_string(), "urgent".to_string()]);
        assert_eq!(args.opt_int("score"), Some(7));
    }

    #[test]
    fn missing_required_argument_is_malformed() {
        let error = Arguments::bind(&schema(), None).expect_err("name is required");

        assert!(matches!(
            error,
            ToolError::MalformedArgument { ref name, .. } if name == "name"
        ));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let raw = object(json!({ "name": "Ana", "limit": "twenty" }));
        let error = Arguments::bind(&schema(), Some(&raw)).expect_err("limit is not numeric");
        assert!(error.to_string().contains("expected an integer"));

        let raw = object(json!({ "name": "Ana", "active_only": "maybe" }));
        let error = Arguments::bind(&schema(), Some(&raw)).expect_err("not a boolean");
        assert!(error.to_string().contains("expected a boolean"));

        let raw = object(json!({ "name": { "first": "Ana" } }));
        assert!(Arguments::bind(&schema(), Some(&raw)).is_err());
    }

    #[test]
    fn unknown_arguments_are_ignored() {
        let raw = object(json!({ "name": "Ana", "favorite_color": "green" }));

        let args = Arguments::bind(&schema(), Some(&raw)).expect("bind");

        assert!(!args.contains("favorite_color"));
    }

    #[test]
    fn id_lists_parse_and_skip_blank_tokens() {
        assert_eq!(parse_id_list("lead_ids", "12, 15,18,").ok(), Some(vec![12, 15, 18]));
    }

    #[test]
    fn id_lists_reject_non_numeric_tokens() {
        let error = parse_id_list("lead_ids", "1,two,3").expect_err("two is not numeric");

        assert_eq!(error.to_string(), "invalid argument `lead_ids`: `two` is not an integer id");
    }

    #[test]
    fn id_lists_reject_empty_input() {
        assert!(parse_id_list("lead_ids", " , ").is_err());
    }

    #[test]
    fn json_arrays_parse() {
        let steps = parse_json_array("steps", r#"[{"type":"email","delayDays":0}]"#).expect("parse");

        assert_eq!(steps, vec![json!({ "type": "email", "delayDays": 0 })]);
    }

    #[test]
    fn json_array_errors_are_malformed_arguments() {
        let invalid = parse_json_array("steps", "[{oops").expect_err("invalid JSON");
        assert!(invalid.to_string().contains("invalid JSON"));

        let wrong_shape = parse_json_array("steps", r#"{"type":"email"}"#).expect_err("object");
        assert!(wrong_shape.to_string().contains("expected a JSON array, got an object"));
    }
}
