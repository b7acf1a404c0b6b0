//! Prompt templates and registry
//!
//! Templates use literal `{{name}}` placeholders. Rendering is plain text
//! replacement: there is no escaping, no conditionals and no loops.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ToolwireError};

/// Named argument accepted by a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl PromptArgument {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required: false,
        }
    }
}

/// A registered prompt template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub title: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    #[serde(skip)]
    pub template: String,
}

impl PromptDefinition {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: description.into(),
            arguments: Vec::new(),
            template: template.into(),
        }
    }

    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Render the template with the supplied arguments.
    ///
    /// Required arguments are all checked before any substitution happens.
    /// Placeholders of declared optional arguments that were not supplied
    /// are erased.
    pub fn render(&self, supplied: &Map<String, Value>) -> Result<String> {
        if let Some(missing) = self
            .arguments
            .iter()
            .find(|arg| arg.required && !supplied.contains_key(&arg.name))
        {
            return Err(ToolwireError::InvalidParams(format!(
                "Missing required argument '{}' for prompt '{}'",
                missing.name, self.name
            )));
        }

        let mut text = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                break;
            };
            text.push_str(&rest[..start]);
            match self.resolve(&after[..end], supplied) {
                Some(value) => {
                    text.push_str(&value);
                    rest = &after[end + 2..];
                }
                None => {
                    text.push('{');
                    rest = &rest[start + 1..];
                }
            }
        }
        text.push_str(rest);

        Ok(text)
    }

    /// Replacement for one placeholder, or `None` to leave it as written
    fn resolve(&self, name: &str, supplied: &Map<String, Value>) -> Option<String> {
        match supplied.get(name) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => self
                .arguments
                .iter()
                .any(|arg| !arg.required && arg.name == name)
                .then(String::new),
        }
    }
}

/// Name-keyed prompt registry preserving insertion order
#[derive(Debug, Default)]
pub struct PromptRegistry {
    prompts: Vec<PromptDefinition>,
    index: HashMap<String, usize>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a prompt, replacing any prompt already registered under its name
    pub fn register(&mut self, prompt: PromptDefinition) {
        match self.index.get(&prompt.name) {
            Some(&slot) => self.prompts[slot] = prompt,
            None => {
                self.index.insert(prompt.name.clone(), self.prompts.len());
                self.prompts.push(prompt);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&PromptDefinition> {
        self.index.get(name).map(|&slot| &self.prompts[slot])
    }

    pub fn list(&self) -> &[PromptDefinition] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
