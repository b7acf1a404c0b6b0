//! Error types for Toolwire

use thiserror::Error;

use crate::mcp::protocol::error_codes;

/// Result type alias for Toolwire operations
pub type Result<T> = std::result::Result<T, ToolwireError>;

/// Main error type for Toolwire
#[derive(Error, Debug)]
pub enum ToolwireError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ToolwireError {
    /// Get error code for the JSON-RPC protocol
    pub fn code(&self) -> i64 {
        match self {
            ToolwireError::Parse(_) => error_codes::PARSE_ERROR,
            ToolwireError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            ToolwireError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            ToolwireError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}
