//! Tool argument validation against JSON Schema
//!
//! Input schemas are compiled once, when a tool is registered, and reused for
//! every `tools/call`.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the offending value (`root`, `root.message`, `root.items[2]`)
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Compiled input schema of one tool
pub struct ArgumentValidator {
    validator: Validator,
}

impl ArgumentValidator {
    /// Compile `schema`, failing if it is not a usable JSON Schema
    pub fn compile(schema: &Value) -> Result<Self, ValidationError> {
        let validator = jsonschema::validator_for(schema).map_err(|e| ValidationError {
            path: "schema".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { validator })
    }

    /// Validate `value`, collecting every failure
    pub fn validate(&self, value: &Value) -> Result<(), Vec<ValidationError>> {
        if self.validator.is_valid(value) {
            return Ok(());
        }

        let mut errors: Vec<ValidationError> = self
            .validator
            .iter_errors(value)
            .map(|e| ValidationError {
                path: display_path(&e.instance_path.to_string()),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            errors.push(ValidationError {
                path: "root".to_string(),
                message: "value does not match the schema".to_string(),
            });
        }
        Err(errors)
    }
}

impl fmt::Debug for ArgumentValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentValidator").finish_non_exhaustive()
    }
}

/// Turn a JSON pointer (`/items/2/name`) into `root.items[2].name`
fn display_path(pointer: &str) -> String {
    let mut path = String::from("root");
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path.push('.');
            path.push_str(&segment);
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(schema: &Value, value: &Value) -> Result<(), Vec<ValidationError>> {
        ArgumentValidator::compile(schema).unwrap().validate(value)
    }

    fn echo_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "minLength": 1},
                "repeat": {"type": "integer", "minimum": 1, "maximum": 5}
            },
            "required": ["message"]
        })
    }

    #[test]
    fn test_valid_arguments() {
        assert!(validate(&echo_schema(), &json!({"message": "hi", "repeat": 2})).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let errors = validate(&echo_schema(), &json!({})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "root");
        assert_eq!(errors[0].message, "\"message\" is a required property");
    }

    #[test]
    fn test_wrong_property_type() {
        let errors = validate(&echo_schema(), &json!({"message": 42})).unwrap_err();
        assert_eq!(errors[0].path, "root.message");
        assert!(errors[0].message.contains("string"));
    }

    #[test]
    fn test_number_bounds() {
        let errors = validate(&echo_schema(), &json!({"message": "x", "repeat": 9})).unwrap_err();
        assert_eq!(errors[0].path, "root.repeat");
        assert!(errors[0].message.contains('5'));
    }

    #[test]
    fn test_integer_rejects_float() {
        let errors =
            validate(&echo_schema(), &json!({"message": "x", "repeat": 1.5})).unwrap_err();
        assert!(errors[0].message.contains("integer"));
    }

    #[test]
    fn test_enum_and_items() {
        let schema = json!({
            "type": "object",
            "properties": {
                "sizes": {"type": "array", "items": {"enum": ["small", "large"]}, "maxItems": 2}
            }
        });
        assert!(validate(&schema, &json!({"sizes": ["small"]})).is_ok());
        let errors = validate(&schema, &json!({"sizes": ["small", "huge"]})).unwrap_err();
        assert_eq!(errors[0].path, "root.sizes[1]");
    }

    #[test]
    fn test_additional_properties_false() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "additionalProperties": false
        });
        let errors = validate(&schema, &json!({"a": "x", "b": 1})).unwrap_err();
        assert!(errors[0].message.contains("'b'"));
    }

    #[test]
    fn test_union_type_and_boolean_schema() {
        let schema = json!({"type": ["string", "null"]});
        assert!(validate(&schema, &Value::Null).is_ok());
        assert!(validate(&schema, &json!(1)).is_err());
        assert!(validate(&json!(true), &json!({"anything": 1})).is_ok());
        assert!(validate(&json!(false), &json!(1)).is_err());
    }

    #[test]
    fn test_pattern_is_enforced() {
        let schema = json!({
            "type": "object",
            "properties": {"size": {"type": "string", "pattern": "^[0-9]+x[0-9]+$"}}
        });
        assert!(validate(&schema, &json!({"size": "1024x768"})).is_ok());
        let errors = validate(&schema, &json!({"size": "huge"})).unwrap_err();
        assert_eq!(errors[0].path, "root.size");
    }

    #[test]
    fn test_combinators_and_const() {
        let schema = json!({
            "type": "object",
            "properties": {
                "seed": {"anyOf": [{"type": "integer"}, {"const": "random"}]},
                "steps": {"type": "integer", "exclusiveMinimum": 0}
            }
        });
        assert!(validate(&schema, &json!({"seed": 7, "steps": 20})).is_ok());
        assert!(validate(&schema, &json!({"seed": "random"})).is_ok());
        assert!(validate(&schema, &json!({"seed": "lucky"})).is_err());
        assert!(validate(&schema, &json!({"steps": 0})).is_err());
    }

    #[test]
    fn test_unusable_schema_fails_to_compile() {
        let err = ArgumentValidator::compile(&json!({"type": 12})).unwrap_err();
        assert_eq!(err.path, "schema");
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(""), "root");
        assert_eq!(display_path("/requests/3/model"), "root.requests[3].model");
        assert_eq!(display_path("/a~1b"), "root.a/b");
    }
}
