//! Agents that answer a turn as a stream of events.
//!
//! This module provides:
//! - [`Agent`]: the turn-invocation seam the session controller talks to
//! - [`AgentBuilder`]: constructs an agent from a model name and tools
//! - [`ReactAgent`]: the model/tool loop over an OpenAI-compatible API

use std::sync::Arc;

use crate::session::{Role, ThreadId};
use crate::tools::BoxedTool;

pub mod openai;
mod react;
mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use openai::{OpenAiClient, OPENAI_BASE_URL};
pub use react::{ReactAgent, ReactAgentBuilder, MAX_STEPS};
pub use stream::{AgentError, AgentEvent, AgentEventStream};

/// The input of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub messages: Vec<(Role, String)>,
}

impl TurnRequest {
    /// A turn carrying a single user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            messages: vec![(Role::User, text.into())],
        }
    }
}

/// Correlation context for a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Turns sharing a thread id continue the same dialogue.
    pub thread_id: ThreadId,
}

impl RunConfig {
    pub fn for_thread(thread_id: ThreadId) -> Self {
        Self { thread_id }
    }
}

/// A configured agent.
pub trait Agent: Send + Sync {
    /// Model the agent was built for.
    fn model_name(&self) -> &str;

    /// Start a turn. The stream ends when the agent has finished answering;
    /// failures arrive as an `Err` item.
    fn stream(&self, request: TurnRequest, config: RunConfig) -> AgentEventStream;

    /// Drop whatever the agent remembers for a thread that will not be used again.
    fn forget_thread(&self, thread_id: &ThreadId);
}

/// Builds agents for the session controller.
pub trait AgentBuilder: Send + Sync {
    fn build(&self, model: &str, tools: Vec<BoxedTool>) -> Result<Arc<dyn Agent>, AgentError>;
}
