//! Tools the agent can call.
//!
//! A [`Tool`] describes itself with a [`ToolDefinition`] (sent to the model
//! as a function schema) and runs with JSON arguments. Tools that depend on
//! the user's search settings pick them up through
//! [`Tool::apply_search_config`] when the agent is built.
//!
//! ```ignore
//! use scout::tools::{Tool, WebSearchTool};
//!
//! let mut tool = WebSearchTool::new(api_key);
//! tool.apply_search_config(&search_config);
//! let result = tool.call(serde_json::json!({"query": "rust async"})).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::session::SearchConfig;

pub mod web_search;

pub use web_search::{WebSearchTool, TAVILY_SEARCH_URL};

/// Arc-wrapped tool for sharing with a running agent.
pub type ArcTool = Arc<dyn Tool>;
/// Boxed tool, still mutable before it is handed to an agent.
pub type BoxedTool = Box<dyn Tool>;

/// Function schema for a tool, in the shape chat-completion APIs expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Render as an OpenAI `tools[]` entry.
    pub fn to_openai(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Errors raised by tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Tool execution failed: {0}")]
    Execution(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A capability the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with model-supplied arguments.
    async fn call(&self, args: Value) -> Result<Value, ToolError>;

    /// Copy user search settings onto the tool. Most tools ignore them.
    fn apply_search_config(&mut self, _config: &SearchConfig) {}

    /// Tool name (taken from the definition).
    fn name(&self) -> String {
        self.definition().name
    }
}
