//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio for AI tool integration.

pub mod context;
pub mod dispatcher;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod session;

pub use context::{ServerContext, ServerContextBuilder};
pub use dispatcher::{DispatchOutcome, Dispatcher, McpHandler};
pub use prompts::{PromptArgument, PromptDefinition, PromptRegistry};
pub use protocol::{
    decode_line, encode_response, error_codes, methods, Decoded, Envelope, InitializeResult,
    McpError, McpResponse, ServerInfo, ToolCallResult, ToolContent, PROTOCOL_VERSION,
};
pub use registry::{
    FnTool, RegisteredTool, Tool, ToolAnnotations, ToolDefinition, ToolError, ToolRegistry,
};
pub use schema::{ArgumentValidator, ValidationError};
pub use session::{McpServer, SessionEnd, SessionStats};
