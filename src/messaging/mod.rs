//! Messaging between the conversation core and the terminal.
//!
//! The core never writes to the terminal directly. It calls a
//! [`RenderSurface`]; in the binary that surface is a [`MessageSender`],
//! and a [`TerminalRenderer`] task on the other side of the [`MessageBus`]
//! turns the messages into output.
//!
//! ```text
//!   SessionController ──RenderSurface──▶ MessageSender
//!                                             │ per-subscriber queue
//!                                             ▼
//!                                       TerminalRenderer
//! ```
//!
//! ```ignore
//! use scout::messaging::{MessageBus, TerminalRenderer};
//!
//! let bus = MessageBus::new();
//! let render = tokio::spawn(TerminalRenderer::new().run_until_turn_end(bus.subscribe()));
//!
//! let mut surface = bus.sender();
//! controller.submit_turn("What is the capital of France?", &mut surface).await?;
//! let renderer = render.await?;
//! ```

mod bus;
mod renderer;
mod surface;
mod types;

pub use bus::{BusError, MessageBus, MessageReceiver, MessageSender};
pub use renderer::{RenderStyle, TerminalRenderer};
pub use surface::{tool_block_label, RenderSurface, TOOL_BLOCK_CHECKMARK};
pub use types::*;
