//! Tool trait and registry

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::protocol::error_codes;
use super::schema::{ArgumentValidator, ValidationError};

/// Failure returned by a tool handler.
///
/// `Rpc` failures are reported to the peer with their code, message and data
/// unchanged. Anything else is reported as an internal error carrying only
/// the error's message.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToolError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ToolError::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, message)
    }

    /// A referenced entity (model, provider, record) does not exist
    pub fn not_found(what: &str, name: &str) -> Self {
        Self::invalid_params(format!("Unknown {}: {}", what, name))
    }

    /// Attach a structured payload to a typed error
    pub fn with_data(self, data: Value) -> Self {
        match self {
            ToolError::Rpc { code, message, .. } => ToolError::Rpc {
                code,
                message,
                data: Some(data),
            },
            other => other,
        }
    }
}

/// Behavioral hints advertised alongside a tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "readOnlyHint", skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    #[serde(rename = "destructiveHint", skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    #[serde(rename = "idempotentHint", skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    #[serde(rename = "openWorldHint", skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

impl ToolAnnotations {
    /// Hints for a side-effect free, repeatable tool
    pub fn read_only() -> Self {
        Self {
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: Some(false),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// MCP tool definition, as listed by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

/// A named, schema-described operation exposed to the peer
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema for the `arguments` object
    fn input_schema(&self) -> Value;

    fn annotations(&self) -> Option<ToolAnnotations> {
        None
    }

    fn invoke(&self, arguments: Value) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
            annotations: self.annotations(),
        }
    }
}

type Handler = dyn Fn(Value) -> Result<Value, ToolError> + Send + Sync;

/// Tool backed by a closure
pub struct FnTool {
    name: String,
    description: String,
    input_schema: Value,
    annotations: Option<ToolAnnotations>,
    handler: Box<Handler>,
}

impl FnTool {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            annotations: None,
            handler: Box::new(handler),
        }
    }

    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    fn annotations(&self) -> Option<ToolAnnotations> {
        self.annotations.clone()
    }

    fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        (self.handler)(arguments)
    }
}

/// A registered tool together with its compiled input schema
pub struct RegisteredTool {
    tool: Arc<dyn Tool>,
    validator: Result<ArgumentValidator, ValidationError>,
}

impl RegisteredTool {
    fn new(tool: Arc<dyn Tool>) -> Self {
        let validator = ArgumentValidator::compile(&tool.input_schema());
        if let Err(err) = &validator {
            tracing::warn!(tool = tool.name(), "Tool has an unusable input schema: {}", err);
        }
        Self { tool, validator }
    }

    /// The compiled input schema, or why it could not be compiled
    pub fn validator(&self) -> Result<&ArgumentValidator, &ValidationError> {
        self.validator.as_ref()
    }
}

impl Deref for RegisteredTool {
    type Target = dyn Tool;

    fn deref(&self) -> &Self::Target {
        self.tool.as_ref()
    }
}

/// Name-keyed tool registry preserving insertion order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool, replacing any tool already registered under its name.
    /// A replaced tool keeps its original position in the listing.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let entry = RegisteredTool::new(tool);
        match self.index.get(&name) {
            Some(&slot) => {
                tracing::debug!(tool = %name, "Replacing registered tool");
                self.tools[slot] = entry;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(entry);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    /// Definitions of all tools in registration order
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
