//! CLI runner for interactive and single-prompt modes.

use anyhow::Context;
use tracing::info;

use crate::cli::repl::Repl;
use crate::config::Settings;

/// Run a single prompt and exit.
///
/// The agent must build; a failed turn is returned as an error.
pub async fn run_single_prompt(settings: Settings, prompt: &str) -> anyhow::Result<()> {
    let mut repl = Repl::new(settings)?;
    repl.apply().context("Could not configure the agent")?;
    repl.run_turn(prompt).await?;
    Ok(())
}

/// Run in interactive mode.
///
/// Settings are applied once at start. If that fails the REPL still opens
/// so they can be fixed and applied with `/apply`.
pub async fn run_interactive(settings: Settings) -> anyhow::Result<()> {
    print_banner();

    let missing = settings.missing_keys();
    let mut repl = Repl::new(settings)?;

    if !missing.is_empty() {
        println!(
            "  \x1b[1;33m⚠️  Missing {}. Set them in the environment or a .env file.\x1b[0m",
            missing.join(" and ")
        );
    }
    match repl.apply() {
        Ok(()) => info!(thread = %repl.controller().thread_id(), "Agent configured"),
        Err(e) => println!("  \x1b[1;33m⚠️  {}\x1b[0m\n", e),
    }

    repl.run().await?;

    Ok(())
}

/// Print the welcome banner.
///
/// This is public for testing purposes.
pub fn print_banner() {
    println!();
    println!("  \x1b[1;35m╔═╗╔═╗╔═╗╦ ╦╔╦╗\x1b[0m");
    println!(
        "  \x1b[1;35m╚═╗║  ║ ║║ ║ ║ \x1b[0m  \x1b[2mv{}\x1b[0m",
        get_version()
    );
    println!("  \x1b[1;35m╚═╝╚═╝╚═╝╚═╝ ╩ \x1b[0m");
    println!();
    println!("  \x1b[2m🔎 Web-search-augmented chat\x1b[0m");
    println!("  \x1b[2mType \x1b[0m\x1b[1;36m/help\x1b[0m\x1b[2m for commands, or ask a question!\x1b[0m");
    println!();
}

/// Get the application version string.
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Generate the banner text lines without ANSI codes (for testing).
pub fn banner_text_lines() -> Vec<&'static str> {
    vec![
        "╔═╗╔═╗╔═╗╦ ╦╔╦╗",
        "╚═╗║  ║ ║║ ║ ║",
        "╚═╝╚═╝╚═╝╚═╝ ╩",
        "Web-search-augmented chat",
        "/help",
    ]
}
