//! CLI components.

pub mod commands;
pub mod completion;
pub mod prompt;
pub mod repl;
pub mod runner;

pub use commands::{parse_command, Command, DomainRef};
pub use completion::{create_reedline, ScoutCompleter, ScoutHighlighter, COMMANDS};
pub use prompt::ScoutPrompt;
pub use repl::Repl;
pub use runner::{run_interactive, run_single_prompt};
