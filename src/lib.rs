//! Scout Library
//!
//! This crate provides the core of the scout chat agent: a tool-calling
//! model that can search the web, the stream handling that turns its events
//! into live output, and the session that records each turn.
//!
//! ## Main Components
//!
//! - [`agents`] - Agent trait, OpenAI-compatible client, ReAct loop
//! - [`cli`] - Command-line interface (REPL, commands, runner)
//! - [`config`] - Settings and XDG directories
//! - [`messaging`] - Message bus, render surfaces, terminal renderer
//! - [`session`] - Message store, search settings, session controller
//! - [`streaming`] - Stream handler and search result formatter
//! - [`tools`] - Tool trait and the web search tool
//!
//! ## Quick Start
//!
//! ```ignore
//! use scout::{MessageBus, Settings};
//!
//! let settings = Settings::default();
//! let mut controller = settings.controller()?;
//! controller.apply(settings.search_tools())?;
//!
//! let bus = MessageBus::new();
//! let mut sender = bus.sender();
//! controller.submit_turn("What is the capital of France?", &mut sender).await?;
//! ```

pub mod agents;
pub mod cli;
pub mod config;
pub mod messaging;
pub mod session;
pub mod streaming;
pub mod tools;

// Re-export commonly used types
pub use agents::{
    Agent, AgentBuilder, AgentError, AgentEvent, AgentEventStream, OpenAiClient, ReactAgent,
    ReactAgentBuilder,
};
pub use config::{Settings, SettingsError, XdgDirs};
pub use messaging::{Message, MessageBus, MessageSender, RenderSurface, TerminalRenderer};
pub use session::{
    ConversationEntry, MessageStore, SearchConfig, SearchTopic, SessionController, SessionError,
    ThreadId,
};
pub use streaming::{format_search_result, handle_stream, StreamOutcome};
pub use tools::{BoxedTool, Tool, WebSearchTool};
