//! Conversation entry types.
//!
//! Entries are what the message store keeps and what gets replayed on
//! every redraw. They are built once and never mutated afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of content an entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Raw chat text.
    Text,
    /// Pre-formatted markdown produced from a tool result.
    ToolResult,
}

/// A single persisted conversation entry.
///
/// Fields are private so an entry cannot change once it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    role: Role,
    entry_type: EntryType,
    content: String,
    /// Empty unless `entry_type` is `ToolResult`.
    tool_name: String,
}

impl ConversationEntry {
    /// Create a text entry.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            entry_type: EntryType::Text,
            content: content.into(),
            tool_name: String::new(),
        }
    }

    /// Create a tool result entry. Tool results are always attributed to the assistant.
    pub fn tool_result(tool_name: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            entry_type: EntryType::ToolResult,
            content: markdown.into(),
            tool_name: tool_name.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn is_tool_result(&self) -> bool {
        self.entry_type == EntryType::ToolResult
    }
}
