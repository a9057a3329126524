//! Errors surfaced by the session controller.

use thiserror::Error;

use crate::agents::AgentError;
use crate::streaming::{StreamError, ToolRecord};

/// Error type for session operations.
///
/// None of these is fatal to the session; each one only ends the current
/// turn or configuration attempt.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A turn was submitted before any configuration was applied.
    #[error("No agent configured. Apply the settings first (/apply).")]
    NotConfigured,

    /// The agent stream failed mid-turn. Nothing was persisted.
    #[error("Turn failed: {source}")]
    StreamTransport {
        source: AgentError,
        /// Tool calls that completed before the failure.
        completed_tools: Vec<ToolRecord>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Building the agent failed.
    #[error("Failed to build agent: {0}")]
    Agent(AgentError),
}

impl From<StreamError> for SessionError {
    fn from(e: StreamError) -> Self {
        Self::StreamTransport {
            source: e.source,
            completed_tools: e.completed_tools,
        }
    }
}
