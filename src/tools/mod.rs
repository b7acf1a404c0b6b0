//! Bundled tools
//!
//! These are ordinary [`Tool`] implementations; the protocol core knows
//! nothing about them beyond the trait.

pub mod batch;
pub mod echo;
pub mod pricing;

use std::sync::Arc;

pub use batch::BatchEstimateTool;
pub use echo::EchoTool;
pub use pricing::{EstimateCostTool, ListModelsTool};

use crate::config::ServerConfig;
use crate::mcp::Tool;

/// Names of every bundled tool, in registration order
pub const BUILTIN_TOOL_NAMES: &[&str] = &[
    "echo",
    "list_models",
    "estimate_cost",
    "batch_estimate_cost",
];

/// Instantiate the bundled tools enabled by `config`
pub fn builtin_tools(config: &ServerConfig) -> Vec<Arc<dyn Tool>> {
    let all: Vec<Arc<dyn Tool>> = vec![
        Arc::new(EchoTool),
        Arc::new(ListModelsTool),
        Arc::new(EstimateCostTool),
        Arc::new(BatchEstimateTool::new(config.max_concurrency)),
    ];

    all.into_iter()
        .filter(|tool| {
            let enabled = !config.disabled_tools.iter().any(|d| d == tool.name());
            if !enabled {
                tracing::info!(tool = tool.name(), "Bundled tool disabled by configuration");
            }
            enabled
        })
        .collect()
}
