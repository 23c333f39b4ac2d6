//! Loose truthiness rules used by attribute filtering and flag arguments.

use serde_json::Value;

/// Whether a value counts as "set".
///
/// `null`, `false`, `0` and `""` are falsy; everything else, including empty
/// arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Lenient boolean parsing for flags that may arrive as strings.
///
/// `"true"`, `"yes"` and `"1"` are true; `"false"`, `"no"`, `"0"`, `"null"` and
/// `"undefined"` are false (case-insensitive, trimmed). Other non-empty strings and
/// non-string truthy values are true.
pub fn string_to_boolean(value: &Value) -> bool {
    if !is_truthy(value) {
        return false;
    }

    let s = match value {
        Value::Bool(b) => return *b,
        Value::String(s) => s,
        _ => return true,
    };

    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => true,
        "false" | "no" | "0" | "null" | "undefined" => false,
        _ => !s.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn test_string_to_boolean() {
        assert!(string_to_boolean(&json!("Yes")));
        assert!(string_to_boolean(&json!(" true ")));
        assert!(string_to_boolean(&json!("anything")));
        assert!(string_to_boolean(&json!(3)));
        assert!(string_to_boolean(&json!({"a": 1})));
        assert!(!string_to_boolean(&json!("NO")));
        assert!(!string_to_boolean(&json!("undefined")));
        assert!(!string_to_boolean(&json!("0")));
        assert!(!string_to_boolean(&json!(false)));
        assert!(!string_to_boolean(&json!(null)));
        assert!(!string_to_boolean(&json!("")));
    }
}
