//! Server configuration

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolwireError};
use crate::tools::BUILTIN_TOOL_NAMES;

/// Log output format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ToolwireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ToolwireError::Config(format!(
                "unknown log format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Runtime configuration for the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name reported in `serverInfo`
    pub server_name: String,
    /// Version reported in `serverInfo`
    pub server_version: String,
    /// Log every dispatched message at info level
    pub verbose: bool,
    pub log_format: LogFormat,
    /// Default worker count for batch tools
    pub max_concurrency: usize,
    /// Bundled tools to leave unregistered
    pub disabled_tools: Vec<String>,
    /// Free-text usage hints returned from `initialize`
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "toolwire".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            verbose: false,
            log_format: LogFormat::Text,
            max_concurrency: 4,
            disabled_tools: Vec::new(),
            instructions: None,
        }
    }
}

impl ServerConfig {
    /// Check invariants that clap cannot express
    pub fn validate(&self) -> Result<()> {
        if self.server_name.trim().is_empty() {
            return Err(ToolwireError::Config("server name must not be empty".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(ToolwireError::Config(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(unknown) = self
            .disabled_tools
            .iter()
            .find(|name| !BUILTIN_TOOL_NAMES.contains(&name.as_str()))
        {
            return Err(ToolwireError::Config(format!(
                "cannot disable unknown tool '{}'",
                unknown
            )));
        }
        Ok(())
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "toolwire=debug,info"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config = ServerConfig {
            max_concurrency: 0,
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ToolwireError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_disabled_tool() {
        let config = ServerConfig {
            disabled_tools: vec!["resize_image".to_string()],
            ..ServerConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("resize_image"));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
