//! Toolwire - tool server infrastructure
//!
//! A JSON-RPC 2.0 engine that exposes registered tools and prompt templates
//! to LLM clients over line-delimited stdio.

pub mod config;
pub mod error;
pub mod mcp;
pub mod prompts;
pub mod tools;

use std::sync::Arc;

pub use config::{LogFormat, ServerConfig};
pub use error::{Result, ToolwireError};
pub use mcp::{Dispatcher, McpServer, ServerContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the server context with every bundled tool and prompt enabled by `config`
pub fn build_context(config: &ServerConfig) -> Arc<ServerContext> {
    let mut builder = ServerContext::builder(&config.server_name, &config.server_version)
        .verbose(config.verbose);
    if let Some(instructions) = &config.instructions {
        builder = builder.instructions(instructions);
    }
    for tool in tools::builtin_tools(config) {
        builder = builder.shared_tool(tool);
    }
    for prompt in prompts::get_prompt_definitions() {
        builder = builder.prompt(prompt);
    }
    builder.build()
}
