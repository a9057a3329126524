//! Message types for core-to-UI communication.

use serde::{Deserialize, Serialize};

use crate::session::Role;

/// Message levels for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub level: MessageLevel,
    pub text: String,
}

/// A static chat line written for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLineMessage {
    pub role: Role,
    pub content: String,
}

/// The latest full text of the live assistant region.
///
/// Each message replaces the previous one; it is not a delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveTextMessage {
    pub content: String,
}

/// A collapsible labelled block with markdown content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolBlockMessage {
    pub label: String,
    pub markdown: String,
}

/// Any message type (for serialization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Text(TextMessage),
    ChatLine(ChatLineMessage),
    LiveText(LiveTextMessage),
    ToolBlock(ToolBlockMessage),
    /// Closes the live region of the current turn.
    TurnEnd,
    Divider,
    Clear,
}

impl Message {
    /// Create an info message.
    pub fn info(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Info,
            text: text.into(),
        })
    }

    /// Create a success message.
    pub fn success(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Success,
            text: text.into(),
        })
    }

    /// Create a warning message.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Warning,
            text: text.into(),
        })
    }

    /// Create an error message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            level: MessageLevel::Error,
            text: text.into(),
        })
    }

    pub fn chat_line(role: Role, content: impl Into<String>) -> Self {
        Self::ChatLine(ChatLineMessage {
            role,
            content: content.into(),
        })
    }

    pub fn live_text(content: impl Into<String>) -> Self {
        Self::LiveText(LiveTextMessage {
            content: content.into(),
        })
    }

    pub fn tool_block(label: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self::ToolBlock(ToolBlockMessage {
            label: label.into(),
            markdown: markdown.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_constructors() {
        for (msg, level) in [
            (Message::info("i"), MessageLevel::Info),
            (Message::success("s"), MessageLevel::Success),
            (Message::warning("w"), MessageLevel::Warning),
            (Message::error("e"), MessageLevel::Error),
        ] {
            match msg {
                Message::Text(t) => assert_eq!(t.level, level),
                other => panic!("Expected Text message, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_message_serializes_with_type_tag() {
        let json = serde_json::to_value(Message::tool_block("✅ web_search", "1. x")).unwrap();
        assert_eq!(json["type"], "tool_block");
        assert_eq!(json["label"], "✅ web_search");

        let json = serde_json::to_value(Message::chat_line(Role::User, "hi")).unwrap();
        assert_eq!(json["type"], "chat_line");
        assert_eq!(json["role"], "user");

        let json = serde_json::to_value(Message::TurnEnd).unwrap();
        assert_eq!(json["type"], "turn_end");
    }

    #[test]
    fn test_message_roundtrip() {
        let msg = Message::live_text("Paris");
        let text = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&text).unwrap();
        assert_eq!(back, msg);
    }
}
