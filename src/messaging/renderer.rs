//! Terminal renderer for messages with basic markdown support.

use super::{Message, MessageLevel, MessageReceiver, RenderSurface};
use crate::session::Role;
use crossterm::{
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    ExecutableCommand,
};
use std::io::{self, Write};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};
use tracing::warn;

/// Render style configuration.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub info_color: Color,
    pub success_color: Color,
    pub warning_color: Color,
    pub error_color: Color,
    pub user_color: Color,
    pub assistant_color: Color,
    pub tool_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            info_color: Color::White,
            success_color: Color::Green,
            warning_color: Color::Yellow,
            error_color: Color::Red,
            user_color: Color::Cyan,
            assistant_color: Color::Magenta,
            tool_color: Color::Green,
        }
    }
}

/// Progress of the live assistant region within a turn.
#[derive(Debug, Default)]
struct LiveRegion {
    /// Bytes of the live buffer already written.
    printed: usize,
    /// Whether the assistant header has been written this turn.
    started: bool,
    /// Whether the cursor sits at the start of a line.
    at_line_start: bool,
}

/// Terminal renderer for messages.
///
/// Terminals cannot rewrite earlier output cheaply, so the live region is
/// rendered append-only: each live update prints only the part of the
/// buffer not yet on screen.
pub struct TerminalRenderer {
    style: RenderStyle,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    out: Box<dyn Write + Send>,
    live: LiveRegion,
}

impl TerminalRenderer {
    /// Create a renderer writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Create a renderer writing to an arbitrary sink.
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            style: RenderStyle::default(),
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            out,
            live: LiveRegion::default(),
        }
    }

    /// Replace the style.
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Render a message to the terminal.
    pub fn render(&mut self, message: &Message) -> io::Result<()> {
        match message {
            Message::Text(text) => {
                self.break_live_line()?;
                self.render_text(text.level, &text.text)
            }
            Message::ChatLine(line) => {
                self.break_live_line()?;
                self.render_chat_line(line.role, &line.content)
            }
            Message::LiveText(live) => self.render_live(&live.content),
            Message::ToolBlock(block) => {
                self.break_live_line()?;
                self.render_tool_block(&block.label, &block.markdown)
            }
            Message::TurnEnd => self.end_turn(),
            Message::Divider => self.render_divider(),
            Message::Clear => self.clear_screen(),
        }?;
        self.out.flush()
    }

    fn render_text(&mut self, level: MessageLevel, text: &str) -> io::Result<()> {
        let color = match level {
            MessageLevel::Info => self.style.info_color,
            MessageLevel::Success => self.style.success_color,
            MessageLevel::Warning => self.style.warning_color,
            MessageLevel::Error => self.style.error_color,
        };

        let prefix = match level {
            MessageLevel::Success => "✓ ",
            MessageLevel::Warning => "⚠ ",
            MessageLevel::Error => "✗ ",
            MessageLevel::Info => "",
        };

        self.out
            .execute(SetForegroundColor(color))?
            .execute(Print(prefix))?
            .execute(Print(text))?
            .execute(Print("\n"))?
            .execute(ResetColor)?;

        Ok(())
    }

    fn render_role_header(&mut self, role: Role) -> io::Result<()> {
        let (color, label) = match role {
            Role::User => (self.style.user_color, "you"),
            Role::Assistant => (self.style.assistant_color, "scout"),
        };
        self.out
            .execute(SetForegroundColor(color))?
            .execute(SetAttribute(Attribute::Bold))?
            .execute(Print(format!("{} ›", label)))?
            .execute(SetAttribute(Attribute::Reset))?
            .execute(ResetColor)?
            .execute(Print("\n"))?;
        Ok(())
    }

    fn render_chat_line(&mut self, role: Role, content: &str) -> io::Result<()> {
        self.render_role_header(role)?;
        match role {
            Role::User => {
                self.out.execute(Print(content))?.execute(Print("\n"))?;
                Ok(())
            }
            Role::Assistant => self.render_markdown(content),
        }
    }

    fn render_live(&mut self, content: &str) -> io::Result<()> {
        if !self.live.started {
            self.render_role_header(Role::Assistant)?;
            self.live.started = true;
            self.live.at_line_start = true;
        }

        let fresh = match content.get(self.live.printed..) {
            Some(rest) => rest,
            None => {
                // The buffer shrank or was replaced; start over on a new line.
                warn!("Live text no longer extends what was printed, rewriting");
                self.break_live_line()?;
                content
            }
        };

        if !fresh.is_empty() {
            self.out.execute(Print(fresh))?;
            self.live.at_line_start = fresh.ends_with('\n');
        }
        self.live.printed = content.len();
        Ok(())
    }

    /// Move to a fresh line if live text left the cursor mid-line.
    fn break_live_line(&mut self) -> io::Result<()> {
        if self.live.started && !self.live.at_line_start {
            self.out.execute(Print("\n"))?;
            self.live.at_line_start = true;
        }
        Ok(())
    }

    fn end_turn(&mut self) -> io::Result<()> {
        self.break_live_line()?;
        if self.live.started {
            self.out.execute(Print("\n"))?;
        }
        self.live = LiveRegion::default();
        Ok(())
    }

    fn render_tool_block(&mut self, label: &str, markdown: &str) -> io::Result<()> {
        self.out
            .execute(SetForegroundColor(self.style.tool_color))?
            .execute(SetAttribute(Attribute::Bold))?
            .execute(Print(format!("▸ {}", label)))?
            .execute(SetAttribute(Attribute::Reset))?
            .execute(ResetColor)?
            .execute(Print("\n"))?;

        for line in markdown.lines() {
            self.out
                .execute(SetForegroundColor(Color::DarkGrey))?
                .execute(Print("  │ "))?
                .execute(ResetColor)?;
            self.render_markdown_line(line)?;
        }
        Ok(())
    }

    /// Render markdown content with proper formatting.
    pub fn render_markdown(&mut self, content: &str) -> io::Result<()> {
        let mut in_code_block = false;
        let mut code_lang = String::new();
        let mut code_buffer = String::new();

        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("```") {
                if in_code_block {
                    self.render_code_block(&code_lang, &code_buffer)?;
                    code_buffer.clear();
                    code_lang.clear();
                    in_code_block = false;
                } else {
                    in_code_block = true;
                    code_lang = rest.trim().to_string();
                }
            } else if in_code_block {
                code_buffer.push_str(line);
                code_buffer.push('\n');
            } else {
                self.render_markdown_line(line)?;
            }
        }

        // Unclosed fence
        if in_code_block && !code_buffer.is_empty() {
            self.render_code_block(&code_lang, &code_buffer)?;
        }

        Ok(())
    }

    /// Render a single line of markdown.
    fn render_markdown_line(&mut self, line: &str) -> io::Result<()> {
        let heading = line
            .strip_prefix("### ")
            .or_else(|| line.strip_prefix("## "))
            .or_else(|| line.strip_prefix("# "));
        if let Some(rest) = heading {
            self.out
                .execute(SetForegroundColor(Color::Cyan))?
                .execute(SetAttribute(Attribute::Bold))?
                .execute(Print(rest))?
                .execute(SetAttribute(Attribute::Reset))?
                .execute(Print("\n"))?;
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            self.out
                .execute(SetForegroundColor(Color::Yellow))?
                .execute(Print("• "))?
                .execute(ResetColor)?;
            self.render_inline_markdown(rest)?;
            self.out.execute(Print("\n"))?;
            return Ok(());
        }

        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            if let Some(rest) = line[digits..].strip_prefix(". ") {
                self.out
                    .execute(SetForegroundColor(Color::Yellow))?
                    .execute(Print(format!("{}. ", &line[..digits])))?
                    .execute(ResetColor)?;
                self.render_inline_markdown(rest)?;
                self.out.execute(Print("\n"))?;
                return Ok(());
            }
        }

        if let Some(rest) = line.strip_prefix("> ") {
            self.out
                .execute(SetForegroundColor(Color::DarkGrey))?
                .execute(Print("│ "))?
                .execute(ResetColor)?;
            self.render_inline_markdown(rest)?;
            self.out.execute(Print("\n"))?;
            return Ok(());
        }

        self.render_inline_markdown(line)?;
        self.out.execute(Print("\n"))?;
        Ok(())
    }

    /// Render inline markdown (bold, italic, code, links).
    fn render_inline_markdown(&mut self, text: &str) -> io::Result<()> {
        let mut chars = text.chars().peekable();
        let mut buffer = String::new();

        while let Some(c) = chars.next() {
            match c {
                '`' => {
                    self.flush_plain(&mut buffer)?;
                    let mut code = String::new();
                    for nc in chars.by_ref() {
                        if nc == '`' {
                            break;
                        }
                        code.push(nc);
                    }
                    self.out
                        .execute(SetForegroundColor(Color::Magenta))?
                        .execute(Print(&code))?
                        .execute(ResetColor)?;
                }
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.flush_plain(&mut buffer)?;
                    let mut bold = String::new();
                    while let Some(nc) = chars.next() {
                        if nc == '*' && chars.peek() == Some(&'*') {
                            chars.next();
                            break;
                        }
                        bold.push(nc);
                    }
                    self.out.execute(SetAttribute(Attribute::Bold))?;
                    // Titles are usually links inside bold.
                    self.render_inline_markdown(&bold)?;
                    self.out.execute(SetAttribute(Attribute::Reset))?;
                }
                '_' | '*' => {
                    self.flush_plain(&mut buffer)?;
                    let mut italic = String::new();
                    for nc in chars.by_ref() {
                        if nc == c {
                            break;
                        }
                        italic.push(nc);
                    }
                    self.out
                        .execute(SetAttribute(Attribute::Italic))?
                        .execute(Print(&italic))?
                        .execute(SetAttribute(Attribute::Reset))?;
                }
                '[' => {
                    let mut link_text = String::new();
                    let mut found_close = false;
                    for nc in chars.by_ref() {
                        if nc == ']' {
                            found_close = true;
                            break;
                        }
                        link_text.push(nc);
                    }
                    if found_close && chars.peek() == Some(&'(') {
                        chars.next();
                        let mut url = String::new();
                        for nc in chars.by_ref() {
                            if nc == ')' {
                                break;
                            }
                            url.push(nc);
                        }
                        self.flush_plain(&mut buffer)?;
                        self.out
                            .execute(SetForegroundColor(Color::Blue))?
                            .execute(SetAttribute(Attribute::Underlined))?
                            .execute(Print(&link_text))?
                            .execute(SetAttribute(Attribute::NoUnderline))?
                            .execute(ResetColor)?;
                        if url != link_text {
                            self.out
                                .execute(SetForegroundColor(Color::DarkGrey))?
                                .execute(Print(format!(" ({})", url)))?
                                .execute(ResetColor)?;
                        }
                    } else {
                        buffer.push('[');
                        buffer.push_str(&link_text);
                        if found_close {
                            buffer.push(']');
                        }
                    }
                }
                _ => buffer.push(c),
            }
        }

        self.flush_plain(&mut buffer)
    }

    fn flush_plain(&mut self, buffer: &mut String) -> io::Result<()> {
        if !buffer.is_empty() {
            self.out.execute(Print(buffer.as_str()))?;
            buffer.clear();
        }
        Ok(())
    }

    /// Render a code block with syntax highlighting.
    fn render_code_block(&mut self, lang: &str, code: &str) -> io::Result<()> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = &self.theme_set.themes["base16-ocean.dark"];
        let mut highlighter = HighlightLines::new(syntax, theme);

        self.out
            .execute(SetForegroundColor(Color::DarkGrey))?
            .execute(Print(format!(
                "┌── {}\n",
                if lang.is_empty() { "code" } else { lang }
            )))?
            .execute(ResetColor)?;

        for line in LinesWithEndings::from(code) {
            self.out
                .execute(SetForegroundColor(Color::DarkGrey))?
                .execute(Print("│ "))?
                .execute(ResetColor)?;

            let rendered = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => as_24_bit_terminal_escaped(&ranges[..], false),
                Err(_) => line.to_string(),
            };
            self.out.execute(Print(rendered))?;
        }

        self.out
            .execute(ResetColor)?
            .execute(SetForegroundColor(Color::DarkGrey))?
            .execute(Print("└──\n"))?
            .execute(ResetColor)?;

        Ok(())
    }

    fn render_divider(&mut self) -> io::Result<()> {
        let width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80)
            .min(80);
        self.out
            .execute(SetForegroundColor(Color::DarkGrey))?
            .execute(Print("─".repeat(width)))?
            .execute(ResetColor)?
            .execute(Print("\n"))?;
        Ok(())
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        self.live = LiveRegion::default();
        self.out.execute(Print("\x1b[2J\x1b[1;1H"))?;
        Ok(())
    }

    fn render_or_warn(&mut self, message: &Message) {
        if let Err(e) = self.render(message) {
            warn!(error = %e, "Failed to render message");
        }
    }

    /// Render messages until the current turn ends or the bus closes.
    ///
    /// Meant to be spawned per turn; returns the renderer so the next turn
    /// can reuse it.
    pub async fn run_until_turn_end(mut self, mut receiver: MessageReceiver) -> Self {
        while let Ok(message) = receiver.recv().await {
            let done = matches!(message, Message::TurnEnd);
            self.render_or_warn(&message);
            if done {
                break;
            }
        }
        self
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders immediately, for output produced outside a streamed turn.
impl RenderSurface for TerminalRenderer {
    fn chat_line(&mut self, role: Role, text: &str) {
        self.render_or_warn(&Message::chat_line(role, text));
    }

    fn update_live(&mut self, text: &str) {
        self.render_or_warn(&Message::live_text(text));
    }

    fn tool_block(&mut self, label: &str, markdown: &str) {
        self.render_or_warn(&Message::tool_block(label, markdown));
    }

    fn warning(&mut self, text: &str) {
        self.render_or_warn(&Message::warning(text));
    }

    fn finish_turn(&mut self) {
        self.render_or_warn(&Message::TurnEnd);
    }
}
