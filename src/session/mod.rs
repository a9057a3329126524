//! Conversation session state.
//!
//! This module holds everything that lives for one UI session:
//! - [`MessageStore`]: the append-only log replayed on every redraw
//! - [`SearchConfig`]: pending search settings
//! - [`SessionController`]: configures the agent and runs turns
//!
//! ## Usage
//!
//! ```ignore
//! use scout::session::{SearchConfig, SessionController};
//!
//! let mut controller = SessionController::new(Box::new(builder));
//! controller.configure("gpt-4o", vec![Box::new(search_tool)], SearchConfig::default())?;
//!
//! controller.submit_turn("What is the capital of France?", &mut surface).await?;
//! for entry in controller.store() {
//!     println!("{}: {}", entry.role(), entry.content());
//! }
//! ```

mod controller;
mod entry;
mod error;
mod search_config;
mod store;
mod thread;

pub use controller::{ConversationSession, SessionController};
pub use entry::{ConversationEntry, EntryType, Role};
pub use error::SessionError;
pub use search_config::{
    SearchConfig, SearchTopic, DEFAULT_RESULT_COUNT, MAX_RESULT_COUNT, MIN_RESULT_COUNT,
};
pub use store::MessageStore;
pub use thread::ThreadId;
