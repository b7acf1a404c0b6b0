//! Method routing for decoded envelopes

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::context::ServerContext;
use super::protocol::{error_codes, methods, Envelope, McpError, McpResponse, ToolCallResult};
use super::registry::ToolError;
use crate::error::ToolwireError;

/// What the session should do after dispatching an envelope
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The envelope was a request; write this response
    Responded(McpResponse),
    /// The envelope was a notification; write nothing
    Suppressed,
}

/// Trait for handling decoded MCP envelopes
pub trait McpHandler: Send + Sync {
    fn handle(&self, envelope: &Envelope) -> DispatchOutcome;
}

type RpcResult = Result<Value, McpError>;

impl From<ToolwireError> for McpError {
    fn from(err: ToolwireError) -> Self {
        McpError {
            code: err.code(),
            message: err.to_string(),
            data: None,
        }
    }
}

fn rpc_error(code: i64, message: impl Into<String>) -> McpError {
    McpError {
        code,
        message: message.into(),
        data: None,
    }
}

fn invalid_params(message: impl Into<String>) -> McpError {
    rpc_error(error_codes::INVALID_PARAMS, message)
}

fn to_result<T: Serialize>(value: &T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| ToolwireError::from(e).into())
}

/// Routes protocol methods to the registries held by a [`ServerContext`]
#[derive(Debug, Clone)]
pub struct Dispatcher {
    context: Arc<ServerContext>,
}

impl Dispatcher {
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    /// Dispatch one envelope. Requests always produce exactly one response;
    /// notifications never do.
    pub fn dispatch(&self, envelope: &Envelope) -> DispatchOutcome {
        let started = Instant::now();
        let result = if envelope.is_notification() {
            self.notify(envelope)
        } else {
            self.route(envelope)
        };

        if self.context.verbose {
            tracing::info!(
                method = %envelope.method,
                id = ?envelope.id,
                ok = result.is_ok(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Dispatched"
            );
        } else {
            tracing::debug!(method = %envelope.method, ok = result.is_ok(), "Dispatched");
        }

        match &envelope.id {
            None => {
                if let Err(err) = result {
                    tracing::debug!(
                        method = %envelope.method,
                        code = err.code,
                        "Notification failed: {}",
                        err.message
                    );
                }
                DispatchOutcome::Suppressed
            }
            Some(id) => DispatchOutcome::Responded(match result {
                Ok(value) => McpResponse::success(id.clone(), value),
                Err(err) => McpResponse::error_with_data(id.clone(), err.code, err.message, err.data),
            }),
        }
    }

    fn notify(&self, envelope: &Envelope) -> RpcResult {
        match envelope.method.as_str() {
            methods::INITIALIZED => {
                tracing::info!("Client initialized");
                Ok(Value::Null)
            }
            methods::CANCELLED => {
                // Requests are handled one at a time, so by the time this
                // arrives the referenced request has already completed.
                tracing::debug!(request_id = ?envelope.param("requestId"), "Cancellation received");
                Ok(Value::Null)
            }
            method if method.starts_with("notifications/") => {
                tracing::debug!(method, "Ignoring notification");
                Ok(Value::Null)
            }
            _ => self.route(envelope),
        }
    }

    fn route(&self, envelope: &Envelope) -> RpcResult {
        match envelope.method.as_str() {
            methods::INITIALIZE => to_result(&self.context.initialize_result()),
            methods::PING => Ok(json!({})),
            methods::LIST_TOOLS => Ok(json!({ "tools": self.context.tools.list() })),
            methods::CALL_TOOL => self.call_tool(envelope),
            methods::LIST_PROMPTS => Ok(json!({ "prompts": self.context.prompts.list() })),
            methods::GET_PROMPT => self.get_prompt(envelope),
            other => Err(ToolwireError::MethodNotFound(other.to_string()).into()),
        }
    }

    fn call_tool(&self, envelope: &Envelope) -> RpcResult {
        let name = required_name(envelope)?;
        let arguments = arguments_object(envelope, "Tool")?;

        let tool = self
            .context
            .tools
            .lookup(name)
            .ok_or_else(|| rpc_error(error_codes::METHOD_NOT_FOUND, format!("Unknown tool: {}", name)))?;

        let validator = tool.validator().map_err(|err| {
            McpError::from(ToolwireError::Internal(format!(
                "Tool '{}' has an unusable input schema: {}",
                name, err
            )))
        })?;

        if let Err(errors) = validator.validate(&arguments) {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(McpError {
                code: error_codes::INVALID_PARAMS,
                message: format!("Invalid arguments for tool '{}': {}", name, details[0]),
                data: Some(json!({ "errors": details })),
            });
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| tool.invoke(arguments)));
        match outcome {
            Ok(Ok(value)) => to_result(&ToolCallResult::from_value(value)),
            Ok(Err(ToolError::Rpc {
                code,
                message,
                data,
            })) => Err(McpError {
                code,
                message,
                data,
            }),
            Ok(Err(ToolError::Other(err))) => {
                tracing::warn!(tool = name, "Tool failed: {:#}", err);
                Err(rpc_error(error_codes::INTERNAL_ERROR, format!("{:#}", err)))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(tool = name, "Tool panicked: {}", message);
                Err(rpc_error(
                    error_codes::INTERNAL_ERROR,
                    format!("Tool '{}' panicked: {}", name, message),
                ))
            }
        }
    }

    fn get_prompt(&self, envelope: &Envelope) -> RpcResult {
        let name = required_name(envelope)?;
        let arguments = arguments_object(envelope, "Prompt")?;

        let prompt = self
            .context
            .prompts
            .lookup(name)
            .ok_or_else(|| invalid_params(format!("Unknown prompt: {}", name)))?;

        let empty = Map::new();
        let supplied = arguments.as_object().unwrap_or(&empty);
        let text = prompt.render(supplied)?;

        Ok(json!({
            "description": prompt.description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": text }
            }]
        }))
    }
}

impl McpHandler for Dispatcher {
    fn handle(&self, envelope: &Envelope) -> DispatchOutcome {
        self.dispatch(envelope)
    }
}

fn required_name(envelope: &Envelope) -> Result<&str, McpError> {
    match envelope.param("name") {
        Some(Value::String(name)) => Ok(name),
        Some(_) => Err(invalid_params("Parameter 'name' must be a string")),
        None => Err(invalid_params("Missing required parameter: name")),
    }
}

fn arguments_object(envelope: &Envelope, kind: &str) -> Result<Value, McpError> {
    match envelope.param("arguments") {
        None | Some(Value::Null) => Ok(json!({})),
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        Some(_) => Err(invalid_params(format!("{} arguments must be an object", kind))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
