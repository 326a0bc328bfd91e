//! Top-level argument checks against a tool's JSON Schema.
//!
//! Only the subset the loop relies on is enforced: the argument container
//! type, required keys, declared property types, and string enums. Nested
//! schemas are left to the tool itself.

use serde_json::Value;

use crate::error::{ColloquyError, Result};

/// Check `args` against `schema`, reporting the first violation.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<()> {
    let expects_object = schema.get("type").and_then(Value::as_str) == Some("object");
    let Some(obj) = args.as_object() else {
        if expects_object {
            return Err(invalid(format!(
                "expected object arguments, got {}",
                type_name(args)
            )));
        }
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    if let Some(name) = required.into_iter().find(|name| !obj.contains_key(*name)) {
        return Err(invalid(format!("missing required field '{name}'")));
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in obj {
        let Some(prop) = properties.get(key) else {
            continue;
        };
        if let Some(expected) = prop.get("type").and_then(Value::as_str) {
            if !matches_type(value, expected) {
                return Err(invalid(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    type_name(value)
                )));
            }
        }
        if let Some(allowed) = prop.get("enum").and_then(Value::as_array) {
            if !allowed.contains(value) {
                return Err(invalid(format!("field '{key}' is not one of the allowed values")));
            }
        }
    }

    Ok(())
}

fn invalid(message: String) -> ColloquyError {
    ColloquyError::InvalidArgument(message)
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": { "type": "string" },
                "days": { "type": "integer" },
                "units": { "type": "string", "enum": ["metric", "imperial"] },
            },
            "required": ["city"],
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = json!({ "city": "Lagos", "days": 3, "units": "metric", "extra": true });
        assert!(validate_arguments(&args, &weather_schema()).is_ok());
    }

    #[test]
    fn rejects_non_object_arguments() {
        let err = validate_arguments(&json!([1, 2]), &weather_schema()).unwrap_err();
        assert!(err.to_string().contains("expected object arguments, got array"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = validate_arguments(&json!({ "days": 2 }), &weather_schema()).unwrap_err();
        assert!(err.to_string().contains("missing required field 'city'"));
    }

    #[test]
    fn rejects_wrong_property_type() {
        let err =
            validate_arguments(&json!({ "city": "Lagos", "days": "two" }), &weather_schema())
                .unwrap_err();
        assert!(err.to_string().contains("field 'days' expected type 'integer'"));
    }

    #[test]
    fn rejects_value_outside_enum() {
        let err = validate_arguments(&json!({ "city": "Lagos", "units": "kelvin" }), &weather_schema())
            .unwrap_err();
        assert!(err.to_string().contains("field 'units'"));
    }

    #[test]
    fn untyped_schema_accepts_anything() {
        assert!(validate_arguments(&Value::Null, &json!({})).is_ok());
        assert!(validate_arguments(&json!({ "x": 1 }), &json!({})).is_ok());
    }
}
