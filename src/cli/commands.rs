//! Slash command parsing.

use crate::session::SearchTopic;

/// Which domain `/domain rm` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    Name(String),
    /// Zero-based position in the allow-list.
    Position(usize),
}

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Apply,
    /// `/model` alone shows the models; with a name it sets the pending one.
    Model(Option<String>),
    Results(u8),
    Topic(SearchTopic),
    DomainAdd(String),
    DomainRemove(DomainRef),
    Domains,
    Clear,
    History,
    Show,
    Exit,
}

/// Parse one line starting with `/`.
pub fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim();
    let body = input.strip_prefix('/').unwrap_or(input);
    let mut parts = body.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    match cmd.as_str() {
        "help" | "h" | "?" => Ok(Command::Help),
        "apply" => Ok(Command::Apply),
        "model" | "m" => Ok(Command::Model(
            (!args.is_empty()).then(|| args.to_string()),
        )),
        "results" => args
            .parse::<u8>()
            .map(Command::Results)
            .map_err(|_| "Usage: /results <1-10>".to_string()),
        "topic" => args
            .parse::<SearchTopic>()
            .map(Command::Topic)
            .map_err(|_| "Usage: /topic <general|news>".to_string()),
        "domain" => parse_domain(args),
        "domains" => Ok(Command::Domains),
        "clear" | "new" => Ok(Command::Clear),
        "history" => Ok(Command::History),
        "show" => Ok(Command::Show),
        "exit" | "quit" | "q" => Ok(Command::Exit),
        "" => Err("Type /help for available commands".to_string()),
        other => Err(format!(
            "Unknown command: /{}\n   Type /help for available commands",
            other
        )),
    }
}

fn parse_domain(args: &str) -> Result<Command, String> {
    const USAGE: &str = "Usage: /domain add <domain> | /domain rm <domain|#>";

    let mut parts = args.splitn(2, char::is_whitespace);
    let sub = parts.next().unwrap_or("");
    let value = parts.next().map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(USAGE.to_string());
    }

    match sub {
        "add" => Ok(Command::DomainAdd(value.to_string())),
        "rm" | "remove" => match value.parse::<usize>() {
            Ok(0) => Err("Domain numbers start at 1".to_string()),
            Ok(n) => Ok(Command::DomainRemove(DomainRef::Position(n - 1))),
            Err(_) => Ok(Command::DomainRemove(DomainRef::Name(value.to_string()))),
        },
        _ => Err(USAGE.to_string()),
    }
}

/// Help text for `/help`.
pub fn help_text() -> &'static str {
    "\
Commands:
  /apply                 Rebuild the agent with the pending settings
  /model [name]          Show or set the model
  /results <1-10>        Number of search results
  /topic <general|news>  Search topic
  /domain add <domain>   Only search this domain
  /domain rm <domain|#>  Remove an allowed domain
  /domains               List allowed domains
  /clear                 Start a new conversation
  /history               Replay the conversation
  /show                  Show status
  /exit                  Exit

Settings changes take effect on /apply. Anything else is sent as a question."
}
