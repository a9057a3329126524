//! The rendering surface the conversation core writes into.
//!
//! The core only ever calls into a surface; nothing flows back. The bus
//! sender is the production surface, a renderer task on the other end of
//! the bus turns the messages into terminal output.

use super::{Message, MessageSender};
use crate::session::Role;

/// Label prefix marking a resolved tool call.
pub const TOOL_BLOCK_CHECKMARK: &str = "✅";

/// Header for the collapsible block shown when a tool resolves.
pub fn tool_block_label(tool_name: &str) -> String {
    format!("{} {}", TOOL_BLOCK_CHECKMARK, tool_name)
}

/// Output operations a conversation UI has to support.
pub trait RenderSurface {
    /// Write a static chat line for `role`.
    fn chat_line(&mut self, role: Role, text: &str);

    /// Overwrite the live region of the current turn with `text`.
    fn update_live(&mut self, text: &str);

    /// Show a collapsible labelled block containing markdown.
    fn tool_block(&mut self, label: &str, markdown: &str);

    /// Show a user-visible warning.
    fn warning(&mut self, text: &str);

    /// Close the live region of the current turn.
    fn finish_turn(&mut self);
}

impl RenderSurface for MessageSender {
    fn chat_line(&mut self, role: Role, text: &str) {
        let _ = self.send(Message::chat_line(role, text));
    }

    fn update_live(&mut self, text: &str) {
        let _ = self.send(Message::live_text(text));
    }

    fn tool_block(&mut self, label: &str, markdown: &str) {
        let _ = self.send(Message::tool_block(label, markdown));
    }

    fn warning(&mut self, text: &str) {
        MessageSender::warning(self, text);
    }

    fn finish_turn(&mut self) {
        let _ = self.send(Message::TurnEnd);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Surface that records every call as the message it would publish.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub messages: Vec<Message>,
    }

    impl RecordingSurface {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn live_updates(&self) -> Vec<&str> {
            self.messages
                .iter()
                .filter_map(|m| match m {
                    Message::LiveText(t) => Some(t.content.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn warnings(&self) -> Vec<&str> {
            self.messages
                .iter()
                .filter_map(|m| match m {
                    Message::Text(t) => Some(t.text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl RenderSurface for RecordingSurface {
        fn chat_line(&mut self, role: Role, text: &str) {
            self.messages.push(Message::chat_line(role, text));
        }

        fn update_live(&mut self, text: &str) {
            self.messages.push(Message::live_text(text));
        }

        fn tool_block(&mut self, label: &str, markdown: &str) {
            self.messages.push(Message::tool_block(label, markdown));
        }

        fn warning(&mut self, text: &str) {
            self.messages.push(Message::warning(text));
        }

        fn finish_turn(&mut self) {
            self.messages.push(Message::TurnEnd);
        }
    }
}
