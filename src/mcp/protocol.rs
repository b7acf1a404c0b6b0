//! MCP JSON-RPC protocol types and line codec

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ToolwireError};

/// JSON-RPC protocol tag carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version exchanged during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const CANCELLED: &str = "notifications/cancelled";
    pub const PING: &str = "ping";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
    pub const LIST_PROMPTS: &str = "prompts/list";
    pub const GET_PROMPT: &str = "prompts/get";
}

/// One decoded JSON-RPC message.
///
/// `id` is `None` only when the `id` key is absent from the wire object. An
/// explicit `"id": null` decodes to `Some(Value::Null)` and is a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Envelope {
    /// Build a request envelope
    pub fn request(id: Value, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Build a notification envelope (no `id` key on the wire)
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Look up a named parameter, treating absent or non-object params as empty
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| p.get(key))
    }
}

/// Outcome of decoding a single line
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Envelope(Envelope),
    /// Well-formed JSON that is not a valid envelope but carries an `id`
    /// the peer can be answered on.
    Invalid { id: Value, reason: String },
}

/// Decode one line of input.
///
/// Fails with [`ToolwireError::Parse`] when the line is not JSON, and with
/// [`ToolwireError::InvalidRequest`] when it is JSON but no id can be
/// recovered from it.
pub fn decode_line(line: &str) -> Result<Decoded> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| ToolwireError::Parse(e.to_string()))?;

    let Value::Object(mut obj) = value else {
        return Err(ToolwireError::InvalidRequest(
            "envelope must be a JSON object".to_string(),
        ));
    };

    let id = obj.remove("id");
    match validate_envelope(&mut obj) {
        Ok((method, params)) => Ok(Decoded::Envelope(Envelope {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params,
        })),
        Err(reason) => match id {
            Some(id) => Ok(Decoded::Invalid { id, reason }),
            None => Err(ToolwireError::InvalidRequest(reason)),
        },
    }
}

fn validate_envelope(
    obj: &mut Map<String, Value>,
) -> std::result::Result<(String, Option<Value>), String> {
    match obj.get("jsonrpc") {
        Some(Value::String(v)) if v == JSONRPC_VERSION => {}
        Some(other) => return Err(format!("unsupported jsonrpc version: {}", other)),
        None => return Err("missing jsonrpc field".to_string()),
    }

    let method = match obj.remove("method") {
        Some(Value::String(m)) => m,
        Some(_) => return Err("method must be a string".to_string()),
        None => return Err("missing method field".to_string()),
    };

    let params = match obj.remove("params") {
        None | Some(Value::Null) => None,
        Some(p @ Value::Object(_)) => Some(p),
        Some(_) => return Err("params must be an object".to_string()),
    };

    Ok((method, params))
}

/// MCP JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    /// Create an error response carrying a structured payload
    pub fn error_with_data(
        id: Value,
        code: i64,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Create error from ToolwireError
    pub fn from_error(id: Value, err: ToolwireError) -> Self {
        Self::error(id, err.code(), err.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Encode a response as a single protocol line (without the trailing newline)
pub fn encode_response(response: &McpResponse) -> Result<String> {
    // serde_json escapes control characters inside strings, so the compact
    // form never contains a raw newline.
    Ok(serde_json::to_string(response)?)
}

/// MCP initialize result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Server capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server identity reported during `initialize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "toolwire".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl InitializeResult {
    pub fn new(server_info: ServerInfo, instructions: Option<String>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
                prompts: Some(PromptsCapability {
                    list_changed: false,
                }),
            },
            server_info,
            instructions,
        }
    }
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self::new(ServerInfo::default(), None)
    }
}

/// Tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            structured_content: None,
            is_error: Some(false),
        }
    }

    /// Wrap a handler result: strings are rendered verbatim, anything else
    /// as pretty-printed JSON, and the raw value is kept as structured content.
    pub fn from_value(value: Value) -> Self {
        let text = match &value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        Self {
            structured_content: Some(value),
            ..Self::text(text)
        }
    }
}
