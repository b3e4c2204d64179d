use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response is JSON but not an object (found {0})")]
    NotAnObject(&'static str),
}

/// Renders the top-level properties of a JSON object as `key: value` lines,
/// in source order. Nested values are printed as JSON, not expanded.
pub fn flatten_json(body: &str) -> Result<Vec<String>, FlattenError> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(object) => Ok(flatten_object(&object)),
        other => Err(FlattenError::NotAnObject(kind_of(&other))),
    }
}

fn flatten_object(object: &Map<String, Value>) -> Vec<String> {
    object
        .iter()
        .map(|(key, value)| format!("{}: {}", key, render_value(value)))
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
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
    use super::*;

    #[test]
    fn test_flatten_scalars_in_source_order() {
        let lines = flatten_json(r#"{"a": 1, "b": "x"}"#).unwrap();
        assert_eq!(lines, vec!["a: 1", "b: x"]);
    }

    #[test]
    fn test_flatten_keeps_source_order_not_alphabetical() {
        let lines = flatten_json(r#"{"zeta": true, "alpha": false, "mid": 2.5}"#).unwrap();
        assert_eq!(lines, vec!["zeta: true", "alpha: false", "mid: 2.5"]);
    }

    #[test]
    fn test_flatten_null_renders_empty() {
        let lines = flatten_json(r#"{"website": null}"#).unwrap();
        assert_eq!(lines, vec!["website: "]);
    }

    #[test]
    fn test_nested_values_are_not_expanded() {
        let lines = flatten_json(r#"{"links": {"self": {"href": "u"}}, "tags": [1, 2]}"#).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "links: {\n  \"self\": {\n    \"href\": \"u\"\n  }\n}"
        );
        assert_eq!(lines[1], "tags: [\n  1,\n  2\n]");
    }

    #[test]
    fn test_empty_object_has_no_lines() {
        assert!(flatten_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            flatten_json("<html>Not Found</html>"),
            Err(FlattenError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_non_object_is_an_error() {
        assert!(matches!(
            flatten_json("[1, 2, 3]"),
            Err(FlattenError::NotAnObject("an array"))
        ));
    }
}
