//! Echo tool

use serde_json::{json, Value};

use crate::mcp::{Tool, ToolAnnotations, ToolError};

/// Reflects its `message` argument back to the caller
#[derive(Debug, Default)]
pub struct EchoTool;

impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo a message back unchanged. Useful for checking that the server is reachable."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Text to echo back"}
            },
            "required": ["message"]
        })
    }

    fn annotations(&self) -> Option<ToolAnnotations> {
        Some(ToolAnnotations::read_only().with_title("Echo"))
    }

    fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        let message = arguments
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::invalid_params("Missing required argument: message"))?;
        Ok(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_reflects_message() {
        let result = EchoTool.invoke(json!({"message": "hi"})).unwrap();
        assert_eq!(result, json!({"message": "hi"}));
    }

    #[test]
    fn test_echo_requires_message() {
        let err = EchoTool.invoke(json!({})).unwrap_err();
        assert!(err.to_string().contains("message"));
    }
}
