//! Process-wide server state

use std::sync::Arc;

use super::prompts::{PromptDefinition, PromptRegistry};
use super::protocol::{InitializeResult, ServerInfo};
use super::registry::{Tool, ToolRegistry};

/// Registries and identity shared by the dispatcher and session loop.
///
/// Built once with [`ServerContextBuilder`] before the session starts and
/// only read afterwards.
#[derive(Debug)]
pub struct ServerContext {
    pub info: ServerInfo,
    pub instructions: Option<String>,
    pub tools: ToolRegistry,
    pub prompts: PromptRegistry,
    pub verbose: bool,
}

impl ServerContext {
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> ServerContextBuilder {
        ServerContextBuilder {
            context: ServerContext {
                info: ServerInfo {
                    name: name.into(),
                    version: version.into(),
                },
                instructions: None,
                tools: ToolRegistry::new(),
                prompts: PromptRegistry::new(),
                verbose: false,
            },
        }
    }

    pub fn initialize_result(&self) -> InitializeResult {
        InitializeResult::new(self.info.clone(), self.instructions.clone())
    }
}

/// Registration phase of a [`ServerContext`]
pub struct ServerContextBuilder {
    context: ServerContext,
}

impl ServerContextBuilder {
    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.context.tools.register(Arc::new(tool));
        self
    }

    pub fn shared_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.context.tools.register(tool);
        self
    }

    pub fn prompt(mut self, prompt: PromptDefinition) -> Self {
        self.context.prompts.register(prompt);
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.context.instructions = Some(instructions.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Finish registration; the context is immutable from here on
    pub fn build(self) -> Arc<ServerContext> {
        tracing::debug!(
            tools = self.context.tools.len(),
            prompts = self.context.prompts.len(),
            "Server context ready"
        );
        Arc::new(self.context)
    }
}
