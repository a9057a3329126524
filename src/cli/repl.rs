//! Interactive REPL implementation.

use reedline::{FileBackedHistory, Signal};
use tracing::{debug, warn};

use crate::cli::commands::{help_text, parse_command, Command, DomainRef};
use crate::cli::completion::{create_reedline, ScoutCompleter};
use crate::cli::prompt::ScoutPrompt;
use crate::config::{Settings, SettingsError, XdgDirs, KNOWN_MODELS};
use crate::messaging::{Message, MessageBus, TerminalRenderer};
use crate::session::{SessionController, SessionError};
use crate::streaming::StreamOutcome;

const HISTORY_SIZE: usize = 500;

/// REPL state.
pub struct Repl {
    controller: SessionController,
    settings: Settings,
    /// Turn output travels over the bus to a per-turn render task.
    message_bus: MessageBus,
    /// Lent to the render task while a turn runs.
    renderer: Option<TerminalRenderer>,
}

impl Repl {
    /// Create a REPL rendering to stdout.
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        let controller = settings.controller()?;
        Ok(Self::with_parts(controller, settings, TerminalRenderer::new()))
    }

    pub fn with_parts(
        controller: SessionController,
        settings: Settings,
        renderer: TerminalRenderer,
    ) -> Self {
        Self {
            controller,
            settings,
            message_bus: MessageBus::new(),
            renderer: Some(renderer),
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Build the agent from the pending settings.
    pub fn apply(&mut self) -> Result<(), SessionError> {
        self.controller.apply(self.settings.search_tools())
    }

    /// Run the REPL loop.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut line_editor = create_reedline(self.completer());

        let xdg = XdgDirs::new();
        if let Err(e) = xdg.ensure_dirs() {
            warn!(error = %e, "Failed to create state directories");
        }
        match FileBackedHistory::with_file(HISTORY_SIZE, xdg.history_file()) {
            Ok(h) => line_editor = line_editor.with_history(Box::new(h)),
            Err(e) => warn!(error = %e, "Line history disabled"),
        }

        loop {
            // Domains change between lines, so the completer is refreshed each time.
            line_editor = line_editor.with_completer(Box::new(self.completer()));
            let prompt = ScoutPrompt::new(
                self.controller.session().model(),
                self.controller.is_configured(),
            );

            match line_editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if self.handle_input(line).await {
                        println!("👋 Happy searching!");
                        break;
                    }
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                    continue;
                }
                Ok(Signal::CtrlD) => {
                    println!("👋 Happy searching!");
                    break;
                }
                Err(err) => {
                    self.say(Message::error(format!("Readline error: {}", err)));
                    break;
                }
            }
        }

        Ok(())
    }

    fn completer(&self) -> ScoutCompleter {
        let mut completer = ScoutCompleter::new();
        completer.set_domains(
            self.controller
                .session()
                .search_config()
                .include_domains()
                .to_vec(),
        );
        completer
    }

    /// Handle one line. Returns true when the user asked to exit.
    pub async fn handle_input(&mut self, input: &str) -> bool {
        if input.starts_with('/') {
            return self.handle_command(input);
        }
        // Failures are already on screen.
        let _ = self.handle_prompt(input).await;
        false
    }

    /// Run one turn and report any failure on screen.
    pub async fn handle_prompt(&mut self, prompt: &str) -> Result<StreamOutcome, SessionError> {
        let result = self.run_turn(prompt).await;
        if let Err(e) = &result {
            self.report_turn_error(e);
        }
        result
    }

    /// Run one turn, rendering it through the bus.
    pub async fn run_turn(&mut self, prompt: &str) -> Result<StreamOutcome, SessionError> {
        let renderer = self.renderer.take().unwrap_or_default();
        // Subscribe before the first message is sent.
        let render_task = tokio::spawn(renderer.run_until_turn_end(self.message_bus.subscribe()));

        let mut sender = self.message_bus.sender();
        let result = self.controller.submit_turn(prompt, &mut sender).await;

        match render_task.await {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => warn!(error = %e, "Render task failed"),
        }
        result
    }

    fn report_turn_error(&mut self, err: &SessionError) {
        match err {
            // The controller already warned through the surface.
            SessionError::NotConfigured => {}
            SessionError::StreamTransport {
                completed_tools, ..
            } => {
                self.say(Message::error(err.to_string()));
                if !completed_tools.is_empty() {
                    self.say(Message::warning(format!(
                        "{} completed tool call(s) were discarded.",
                        completed_tools.len()
                    )));
                }
            }
            other => self.say(Message::error(other.to_string())),
        }
    }

    fn renderer(&mut self) -> &mut TerminalRenderer {
        self.renderer.get_or_insert_with(TerminalRenderer::new)
    }

    fn say(&mut self, message: Message) {
        if let Err(e) = self.renderer().render(&message) {
            warn!(error = %e, "Failed to render message");
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn handle_command(&mut self, input: &str) -> bool {
        let command = match parse_command(input) {
            Ok(command) => command,
            Err(usage) => {
                self.say(Message::warning(usage));
                return false;
            }
        };
        debug!(?command, "Command");

        match command {
            Command::Help => self.say(Message::info(help_text())),
            Command::Exit => return true,
            Command::Apply => self.cmd_apply(),
            Command::Model(None) => self.cmd_models(),
            Command::Model(Some(name)) => {
                if !KNOWN_MODELS.contains(&name.as_str()) {
                    self.say(Message::warning(format!(
                        "{} is not a known model; it will be sent to the API as is.",
                        name
                    )));
                }
                self.controller.set_model(name.clone());
                self.say(Message::success(format!(
                    "Model set to {} (takes effect on /apply)",
                    name
                )));
            }
            Command::Results(count) => match self.controller.set_result_count(count) {
                Ok(()) => self.say(Message::success(format!(
                    "Search results: {} (takes effect on /apply)",
                    count
                ))),
                Err(e) => self.say(Message::warning(e.to_string())),
            },
            Command::Topic(topic) => {
                self.controller.set_topic(topic);
                self.say(Message::success(format!(
                    "Search topic: {} (takes effect on /apply)",
                    topic
                )));
            }
            Command::DomainAdd(domain) => match self.controller.add_domain(&domain) {
                Ok(true) => self.say(Message::success(format!(
                    "Added {} (takes effect on /apply)",
                    domain.trim()
                ))),
                Ok(false) => self.say(Message::warning(format!(
                    "{} is already listed",
                    domain.trim()
                ))),
                Err(e) => self.say(Message::warning(e)),
            },
            Command::DomainRemove(target) => self.cmd_remove_domain(target),
            Command::Domains => self.cmd_domains(),
            Command::Clear => {
                self.controller.reset_conversation();
                self.say(Message::Clear);
                self.say(Message::success("Started a new conversation"));
            }
            Command::History => {
                if self.controller.store().is_empty() {
                    self.say(Message::info("No messages yet."));
                } else {
                    let renderer = self.renderer.get_or_insert_with(TerminalRenderer::new);
                    self.controller.history(renderer);
                }
            }
            Command::Show => self.cmd_show(),
        }
        false
    }

    fn cmd_apply(&mut self) {
        match self.apply() {
            Ok(()) => {
                let model = self
                    .controller
                    .session()
                    .active_model()
                    .unwrap_or_default()
                    .to_string();
                let thread = self.controller.thread_id().to_string();
                self.say(Message::success(format!(
                    "Agent ready: {} (thread {})",
                    model, thread
                )));
                if self.settings.tavily_api_key.is_none() {
                    self.say(Message::warning(
                        "TAVILY_API_KEY is not set; web searches will fail.",
                    ));
                }
            }
            Err(e) => self.say(Message::error(e.to_string())),
        }
    }

    fn cmd_models(&mut self) {
        let current = self.controller.session().model().to_string();
        let mut lines = vec!["Models:".to_string()];
        for model in KNOWN_MODELS {
            let marker = if *model == current { "●" } else { "○" };
            lines.push(format!("  {} {}", marker, model));
        }
        if !KNOWN_MODELS.contains(&current.as_str()) {
            lines.push(format!("  ● {}", current));
        }
        self.say(Message::info(lines.join("\n")));
    }

    fn cmd_remove_domain(&mut self, target: DomainRef) {
        let removed = match target {
            DomainRef::Name(name) => self.controller.remove_domain(&name).then_some(name),
            DomainRef::Position(index) => self.controller.remove_domain_at(index),
        };
        match removed {
            Some(domain) => self.say(Message::success(format!(
                "Removed {} (takes effect on /apply)",
                domain
            ))),
            None => self.say(Message::warning("No such domain. See /domains")),
        }
    }

    fn cmd_domains(&mut self) {
        let domains = self
            .controller
            .session()
            .search_config()
            .include_domains()
            .to_vec();
        if domains.is_empty() {
            self.say(Message::info("No domain restriction; all sites are searched."));
            return;
        }
        let lines: Vec<String> = domains
            .iter()
            .enumerate()
            .map(|(i, d)| format!("  {}. {}", i + 1, d))
            .collect();
        self.say(Message::info(format!("Allowed domains:\n{}", lines.join("\n"))));
    }

    fn cmd_show(&mut self) {
        let session = self.controller.session();
        let config = session.search_config();
        let domains = if config.include_domains().is_empty() {
            "any".to_string()
        } else {
            config.include_domains().join(", ")
        };
        let active = session.active_model().unwrap_or("not applied");
        let missing = self.settings.missing_keys();

        let mut lines = vec![
            "Current Status".to_string(),
            format!("  Model:        {} (active: {})", session.model(), active),
            format!("  Thread:       {}", session.thread_id()),
            format!("  Results:      {}", config.result_count()),
            format!("  Topic:        {}", config.topic),
            format!("  Domains:      {}", domains),
            format!("  Messages:     {}", self.controller.store().len()),
        ];
        if !missing.is_empty() {
            lines.push(format!("  Missing keys: {}", missing.join(", ")));
        }
        self.say(Message::info(lines.join("\n")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{ScriptedAgent, ScriptedBuilder};
    use crate::agents::{AgentError, AgentEvent};
    use crate::messaging::testing::SharedBuffer;
    use crate::session::{EntryType, Role};
    use serde_json::json;

    fn repl() -> (Repl, ScriptedBuilder, SharedBuffer) {
        let builder = ScriptedBuilder::new(ScriptedAgent::new());
        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            tavily_api_key: Some("tvly-test".to_string()),
            ..Default::default()
        };
        let mut controller = SessionController::new(Box::new(builder.clone()));
        controller.set_model(settings.model.clone());
        let buf = SharedBuffer::default();
        let renderer = TerminalRenderer::with_writer(Box::new(buf.clone()));
        (
            Repl::with_parts(controller, settings, renderer),
            builder,
            buf,
        )
    }

    fn france_turn() -> Vec<Result<AgentEvent, AgentError>> {
        vec![
            Ok(AgentEvent::text("Paris")),
            Ok(AgentEvent::tool_start(
                "call_1",
                "web_search",
                json!({"query": "capital of France"}),
            )),
            Ok(AgentEvent::tool_result(
                "call_1",
                "web_search",
                json!([{"title": "France", "url": "https://en.wikipedia.org/wiki/France", "content": "Capital: Paris"}]),
            )),
            Ok(AgentEvent::text(" is the capital.")),
        ]
    }

    // =========================================================================
    // Turns
    // =========================================================================

    #[tokio::test]
    async fn test_prompt_before_apply_warns() {
        let (mut repl, builder, buf) = repl();

        assert!(!repl.handle_input("hello").await);

        assert!(buf.plain().contains("No agent configured"));
        assert!(repl.controller().store().is_empty());
        assert!(builder.agent.calls().is_empty());
    }

    #[tokio::test]
    async fn test_full_turn_renders_and_persists() {
        let (mut repl, builder, buf) = repl();
        repl.handle_input("/apply").await;
        builder.agent.push_turn(france_turn());

        repl.handle_input("What is the capital of France?").await;

        let plain = buf.plain();
        assert!(plain.contains("Agent ready"));
        assert!(plain.contains("you ›"));
        assert!(plain.contains("Paris is the capital."));
        assert!(plain.contains("▸ ✅ web_search"));

        let entries: Vec<_> = repl.controller().store().iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].role(), Role::User);
        assert_eq!(entries[1].entry_type(), EntryType::ToolResult);
        assert_eq!(entries[2].content(), "Paris is the capital.");
    }

    #[tokio::test]
    async fn test_renderer_survives_consecutive_turns() {
        let (mut repl, builder, buf) = repl();
        repl.apply().unwrap();
        builder.agent.push_turn(vec![Ok(AgentEvent::text("one"))]);
        builder.agent.push_turn(vec![Ok(AgentEvent::text("two"))]);

        repl.run_turn("first").await.unwrap();
        repl.run_turn("second").await.unwrap();

        let plain = buf.plain();
        assert!(plain.find("one").unwrap() < plain.find("two").unwrap());
        assert_eq!(repl.controller().store().len(), 4);
    }

    #[tokio::test]
    async fn test_stream_failure_reports_discarded_tools() {
        let (mut repl, builder, buf) = repl();
        repl.apply().unwrap();
        let mut turn = france_turn();
        turn.truncate(3);
        turn.push(Err(AgentError::Transport("connection reset".to_string())));
        builder.agent.push_turn(turn);

        let err = repl.handle_prompt("capital?").await.unwrap_err();

        assert!(matches!(err, SessionError::StreamTransport { .. }));
        let plain = buf.plain();
        assert!(plain.contains("Turn failed"));
        assert!(plain.contains("1 completed tool call(s) were discarded."));
        assert!(repl.controller().store().is_empty());
    }

    // =========================================================================
    // Commands
    // =========================================================================

    #[tokio::test]
    async fn test_exit_commands() {
        let (mut repl, _, _) = repl();
        assert!(repl.handle_input("/exit").await);
        assert!(repl.handle_input("/quit").await);
        assert!(!repl.handle_input("/help").await);
    }

    #[tokio::test]
    async fn test_unknown_command_warns() {
        let (mut repl, _, buf) = repl();
        repl.handle_input("/bogus").await;
        assert!(buf.plain().contains("Unknown command: /bogus"));
    }

    #[tokio::test]
    async fn test_search_settings_flow_into_apply() {
        let (mut repl, builder, buf) = repl();
        repl.handle_input("/model gpt-4o-mini").await;
        repl.handle_input("/results 7").await;
        repl.handle_input("/topic news").await;
        repl.handle_input("/domain add reuters.com").await;
        repl.handle_input("/apply").await;

        let config = repl.controller().session().search_config();
        assert_eq!(config.result_count(), 7);
        assert_eq!(config.include_domains(), ["reuters.com"]);
        assert_eq!(
            builder.builds(),
            vec![("gpt-4o-mini".to_string(), vec!["web_search".to_string()])]
        );
        assert!(buf.plain().contains("takes effect on /apply"));
    }

    #[tokio::test]
    async fn test_results_out_of_range_is_rejected() {
        let (mut repl, _, buf) = repl();
        repl.handle_input("/results 11").await;
        assert!(buf.plain().contains("between 1 and 10"));
        assert_eq!(repl.controller().session().search_config().result_count(), 3);
    }

    #[tokio::test]
    async fn test_domain_listing_and_removal() {
        let (mut repl, _, buf) = repl();
        repl.handle_input("/domain add a.com").await;
        repl.handle_input("/domain add b.com").await;
        repl.handle_input("/domain add a.com").await;
        repl.handle_input("/domains").await;
        assert!(buf.plain().contains("1. a.com"));
        assert!(buf.plain().contains("2. b.com"));
        assert!(buf.plain().contains("a.com is already listed"));

        repl.handle_input("/domain rm 1").await;
        repl.handle_input("/domain rm nope.com").await;
        assert_eq!(
            repl.controller().session().search_config().include_domains(),
            ["b.com"]
        );
        assert!(buf.plain().contains("No such domain"));
    }

    #[tokio::test]
    async fn test_blank_domain_is_not_reported_as_duplicate() {
        let (mut repl, _, buf) = repl();
        repl.handle_input("/domain add    ").await;

        let plain = buf.plain();
        assert!(plain.contains("Usage: /domain add"));
        assert!(!plain.contains("already listed"));
        assert!(repl
            .controller()
            .session()
            .search_config()
            .include_domains()
            .is_empty());
    }

    #[tokio::test]
    async fn test_clear_and_history() {
        let (mut repl, builder, buf) = repl();
        repl.apply().unwrap();
        builder.agent.push_turn(vec![Ok(AgentEvent::text("Paris."))]);
        repl.run_turn("capital?").await.unwrap();
        let thread_before = repl.controller().thread_id().clone();

        repl.handle_input("/history").await;
        assert_eq!(buf.plain().matches("Paris.").count(), 2);

        repl.handle_input("/clear").await;
        assert!(repl.controller().store().is_empty());
        assert_ne!(repl.controller().thread_id(), &thread_before);

        repl.handle_input("/history").await;
        assert!(buf.plain().contains("No messages yet."));
    }

    #[tokio::test]
    async fn test_show_reports_state() {
        let (mut repl, _, buf) = repl();
        repl.handle_input("/show").await;
        let plain = buf.plain();
        assert!(plain.contains("Model:        gpt-4o (active: not applied)"));
        assert!(plain.contains("Domains:      any"));
        assert!(!plain.contains("Missing keys"));
    }

    #[tokio::test]
    async fn test_apply_failure_is_reported() {
        let (mut repl, builder, buf) = repl();
        builder.fail_builds(true);
        repl.handle_input("/apply").await;
        assert!(buf.plain().contains("build refused"));
        assert!(!repl.controller().is_configured());
    }
}
