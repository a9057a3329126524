//! Reedline completion with Tab-triggered menu.
//!
//! Type "/" then Tab to see commands. Menu filters as you type.

use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, Emacs, Highlighter, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Span, StyledText, Suggestion,
};

use crate::config::KNOWN_MODELS;

/// All slash commands with descriptions
pub const COMMANDS: &[(&str, &str)] = &[
    ("/apply", "Rebuild the agent with the pending settings"),
    ("/clear", "Start a new conversation"),
    ("/domain", "Add or remove an allowed domain"),
    ("/domains", "List allowed domains"),
    ("/exit", "Exit"),
    ("/help", "Show help"),
    ("/history", "Replay the conversation"),
    ("/model", "Show or set the model"),
    ("/quit", "Exit"),
    ("/results", "Set the number of search results"),
    ("/show", "Show status"),
    ("/topic", "Set the search topic"),
];

/// `/domain` subcommands
pub const DOMAIN_COMMANDS: &[&str] = &["add", "rm"];

/// Search topics offered after `/topic`
pub const TOPICS: &[&str] = &["general", "news"];

/// Completer for scout commands
#[derive(Clone)]
pub struct ScoutCompleter {
    pub models: Vec<String>,
    pub domains: Vec<String>,
}

impl Default for ScoutCompleter {
    fn default() -> Self {
        Self {
            models: KNOWN_MODELS.iter().map(|m| m.to_string()).collect(),
            domains: Vec::new(),
        }
    }
}

impl ScoutCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_domains(&mut self, domains: Vec<String>) {
        self.domains = domains;
    }
}

fn suggestions<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    prefix: &str,
    span: Span,
    append_whitespace: bool,
) -> Vec<Suggestion> {
    let prefix = prefix.to_lowercase();
    candidates
        .into_iter()
        .filter(|c| prefix.is_empty() || c.to_lowercase().starts_with(&prefix))
        .take(12)
        .map(|c| Suggestion {
            value: c.to_string(),
            description: None,
            extra: None,
            span,
            append_whitespace,
            style: None,
        })
        .collect()
}

impl Completer for ScoutCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let Some(input) = line.get(..pos) else {
            return Vec::new();
        };

        if input.is_empty() || !input.starts_with('/') {
            return Vec::new();
        }

        // Command completion (no space yet)
        if !input.contains(' ') {
            let prefix = input.to_lowercase();
            return COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(&prefix))
                .map(|(cmd, desc)| Suggestion {
                    value: cmd.to_string(),
                    description: Some(desc.to_string()),
                    extra: None,
                    span: Span::new(0, pos),
                    append_whitespace: true,
                    style: None,
                })
                .collect();
        }

        // Everything below completes the last word of the line.
        let start = input.rfind(' ').map(|i| i + 1).unwrap_or(pos);
        let word = &input[start..];
        let span = Span::new(start, pos);
        let parts: Vec<&str> = input.split_whitespace().collect();
        let arg_index = if input.ends_with(' ') {
            parts.len()
        } else {
            parts.len().saturating_sub(1)
        };

        match (parts.first().copied(), arg_index) {
            (Some("/model"), 1) => {
                suggestions(self.models.iter().map(String::as_str), word, span, false)
            }
            (Some("/topic"), 1) => suggestions(TOPICS.iter().copied(), word, span, false),
            (Some("/domain"), 1) => suggestions(DOMAIN_COMMANDS.iter().copied(), word, span, true),
            (Some("/domain"), 2) if parts.get(1) == Some(&"rm") => {
                suggestions(self.domains.iter().map(String::as_str), word, span, false)
            }
            _ => Vec::new(),
        }
    }
}

/// Syntax highlighter
#[derive(Clone)]
pub struct ScoutHighlighter;

impl Highlighter for ScoutHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        if line.starts_with('/') {
            let cmd_end = line.find(' ').unwrap_or(line.len());
            let cmd = &line[..cmd_end];
            let is_valid = is_complete_command(cmd);

            if is_valid {
                styled.push((Style::new().fg(Color::Cyan).bold(), cmd.to_string()));
            } else {
                styled.push((Style::new().fg(Color::Yellow), cmd.to_string()));
            }

            if cmd_end < line.len() {
                styled.push((Style::default(), line[cmd_end..].to_string()));
            }
        } else {
            styled.push((Style::default(), line.to_string()));
        }

        styled
    }
}

/// Check if a command is complete (exact match)
pub fn is_complete_command(input: &str) -> bool {
    COMMANDS.iter().any(|(cmd, _)| *cmd == input)
}

/// Create reedline with Tab-triggered completion menu
pub fn create_reedline(completer: ScoutCompleter) -> Reedline {
    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("completion_menu")
            .with_columns(1)
            .with_column_padding(2)
            .with_text_style(Style::new().fg(Color::Default))
            .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan))
            .with_description_text_style(Style::new().fg(Color::DarkGray)),
    );

    let mut keybindings = reedline::default_emacs_keybindings();

    // Tab to show/navigate menu
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );

    // Shift+Tab to go back
    keybindings.add_binding(
        KeyModifiers::SHIFT,
        KeyCode::BackTab,
        ReedlineEvent::MenuPrevious,
    );

    Reedline::create()
        .with_completer(Box::new(completer))
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_quick_completions(true)
        .with_partial_completions(true)
        .with_highlighter(Box::new(ScoutHighlighter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
}
