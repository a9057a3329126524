//! Event stream types and errors for agent turns.
//!
//! Contains:
//! - `AgentEvent`: the tagged union every producer emits
//! - `AgentEventStream`: wrapper for receiving events of one turn
//! - `AgentError`: error types for agent operations

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// One event of an agent turn, classified at the producer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A fragment of assistant text.
    TextDelta { text: String },
    /// The agent decided to call a tool.
    ToolStart {
        call_id: String,
        tool_name: String,
        args: Value,
    },
    /// A tool call finished.
    ToolResult {
        call_id: String,
        tool_name: String,
        result: Value,
    },
    /// Anything the producer saw but could not classify.
    Other,
}

impl AgentEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    pub fn tool_start(call_id: impl Into<String>, tool_name: impl Into<String>, args: Value) -> Self {
        Self::ToolStart {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            args,
        }
    }

    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: Value,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            result,
        }
    }
}

/// Receiver for the events of a single turn.
///
/// Yields `None` once the agent has finished the turn.
pub struct AgentEventStream {
    rx: mpsc::Receiver<Result<AgentEvent, AgentError>>,
}

impl AgentEventStream {
    /// Wrap the receiving half of a channel.
    pub fn new(rx: mpsc::Receiver<Result<AgentEvent, AgentError>>) -> Self {
        Self { rx }
    }

    /// Build a finished stream from a fixed list of items.
    pub fn from_items(items: Vec<Result<AgentEvent, AgentError>>) -> Self {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity covers every item, so this cannot fail.
            let _ = tx.try_send(item);
        }
        Self { rx }
    }

    /// Receive the next event.
    pub async fn recv(&mut self) -> Option<Result<AgentEvent, AgentError>> {
        self.rx.recv().await
    }
}

/// Errors that can occur while building or running an agent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AgentError {
    #[error("Model error: {0}")]
    Model(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Tool error: {0}")]
    Tool(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
