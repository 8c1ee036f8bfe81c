//! Required-field checks on request bodies.

use crate::error::AppError;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Every field must be present with a truthy value, else `message` as a validation error.
    pub fn require(body: &Map<String, Value>, fields: &[&str], message: &str) -> Result<(), AppError> {
        if fields.iter().all(|f| is_present(body.get(*f))) {
            Ok(())
        } else {
            Err(AppError::Validation(message.to_string()))
        }
    }
}

/// Absent, null, `false`, `0` and `""` do not count as provided.
pub fn is_present(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values_are_missing() {
        assert!(!is_present(None));
        assert!(!is_present(Some(&Value::Null)));
        assert!(!is_present(Some(&json!(""))));
        assert!(!is_present(Some(&json!(0))));
        assert!(!is_present(Some(&json!(false))));
        assert!(is_present(Some(&json!("medium"))));
        assert!(is_present(Some(&json!(3))));
        assert!(is_present(Some(&json!([]))));
    }

    #[test]
    fn require_reports_message() {
        let body = json!({ "name": "Rex", "size": "" });
        let err = RequestValidator::require(body.as_object().unwrap(), &["name", "size"], "need both").unwrap_err();
        assert_eq!(err.to_string(), "need both");
    }
}
