//! Session controller: configuration, turn lifecycle and persistence.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::entry::{ConversationEntry, EntryType, Role};
use super::error::SessionError;
use super::search_config::{SearchConfig, SearchTopic, MAX_RESULT_COUNT, MIN_RESULT_COUNT};
use super::store::MessageStore;
use super::thread::ThreadId;
use crate::agents::{Agent, AgentBuilder, RunConfig, TurnRequest};
use crate::messaging::{tool_block_label, RenderSurface};
use crate::streaming::{handle_stream, StreamOutcome};
use crate::tools::BoxedTool;

/// Per-UI-session state.
///
/// The agent handle and thread id only ever change together.
pub struct ConversationSession {
    thread_id: ThreadId,
    agent: Option<Arc<dyn Agent>>,
    /// Model for the next configure.
    model: String,
    /// Search settings for the next configure.
    search_config: SearchConfig,
}

impl ConversationSession {
    fn new() -> Self {
        Self {
            thread_id: ThreadId::generate(),
            agent: None,
            model: String::new(),
            search_config: SearchConfig::default(),
        }
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    pub fn is_configured(&self) -> bool {
        self.agent.is_some()
    }

    /// Model the current agent was built for, if any.
    pub fn active_model(&self) -> Option<&str> {
        self.agent.as_deref().map(|a| a.model_name())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search_config
    }

    fn install(&mut self, agent: Arc<dyn Agent>) {
        self.agent = Some(agent);
        self.thread_id = ThreadId::generate();
    }
}

/// Wires user input through the agent and the stream handler into the
/// message store.
///
/// Every mutating operation takes `&mut self`, so a turn can never overlap
/// another turn or a reconfiguration. Hosts sharing a controller across
/// tasks wrap it in a `tokio::sync::Mutex`.
pub struct SessionController {
    builder: Box<dyn AgentBuilder>,
    session: ConversationSession,
    store: MessageStore,
}

impl SessionController {
    pub fn new(builder: Box<dyn AgentBuilder>) -> Self {
        Self {
            builder,
            session: ConversationSession::new(),
            store: MessageStore::new(),
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn thread_id(&self) -> &ThreadId {
        self.session.thread_id()
    }

    pub fn is_configured(&self) -> bool {
        self.session.is_configured()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Build a new agent and start a new thread.
    ///
    /// The search settings are copied onto every tool before the build. On
    /// failure the previous agent and thread stay in place.
    pub fn configure(
        &mut self,
        model: impl Into<String>,
        mut tools: Vec<BoxedTool>,
        search_config: SearchConfig,
    ) -> Result<(), SessionError> {
        let model = model.into();
        if !search_config.is_valid() {
            return Err(SessionError::InvalidConfig(format!(
                "result count must be between {} and {}, got {}",
                MIN_RESULT_COUNT,
                MAX_RESULT_COUNT,
                search_config.result_count()
            )));
        }

        for tool in tools.iter_mut() {
            tool.apply_search_config(&search_config);
        }

        let agent = self
            .builder
            .build(&model, tools)
            .map_err(SessionError::Agent)?;

        self.session.model = model;
        self.session.search_config = search_config;
        self.session.install(agent);

        info!(
            model = %self.session.model,
            thread = %self.session.thread_id,
            results = self.session.search_config.result_count(),
            topic = %self.session.search_config.topic,
            domains = self.session.search_config.include_domains().len(),
            "Session configured"
        );
        Ok(())
    }

    /// Configure with the pending model and search settings.
    pub fn apply(&mut self, tools: Vec<BoxedTool>) -> Result<(), SessionError> {
        let model = self.session.model.clone();
        let config = self.session.search_config.clone();
        self.configure(model, tools, config)
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.session.model = model.into();
    }

    /// Replace the pending search settings wholesale.
    pub fn set_search_config(&mut self, config: SearchConfig) {
        self.session.search_config = config;
    }

    pub fn set_result_count(&mut self, count: u8) -> Result<(), SessionError> {
        self.session
            .search_config
            .set_result_count(count)
            .map_err(SessionError::InvalidConfig)
    }

    pub fn set_topic(&mut self, topic: SearchTopic) {
        self.session.search_config.topic = topic;
    }

    /// Add a domain to the pending allow-list; blanks and duplicates are no-ops.
    pub fn add_domain(&mut self, domain: &str) -> Result<bool, String> {
        self.session.search_config.add_domain(domain)
    }

    pub fn remove_domain(&mut self, domain: &str) -> bool {
        self.session.search_config.remove_domain(domain)
    }

    pub fn remove_domain_at(&mut self, index: usize) -> Option<String> {
        self.session.search_config.remove_domain_at(index)
    }

    // =========================================================================
    // Turns
    // =========================================================================

    /// Run one turn and persist it.
    ///
    /// On success the store gains the user text, one tool result entry per
    /// resolved tool call, and the answer if it is not empty. A failed turn
    /// persists nothing.
    pub async fn submit_turn(
        &mut self,
        user_text: &str,
        surface: &mut dyn RenderSurface,
    ) -> Result<StreamOutcome, SessionError> {
        let Some(agent) = self.session.agent.clone() else {
            warn!("Turn submitted before configuration");
            let err = SessionError::NotConfigured;
            surface.warning(&err.to_string());
            surface.finish_turn();
            return Err(err);
        };

        let thread_id = self.session.thread_id.clone();
        info!(thread = %thread_id, model = agent.model_name(), "Turn started");
        surface.chat_line(Role::User, user_text);

        let mut stream = agent.stream(
            TurnRequest::user(user_text),
            RunConfig::for_thread(thread_id.clone()),
        );
        let result = handle_stream(surface, &mut stream).await;
        surface.finish_turn();

        let outcome = result?;

        self.store
            .append(ConversationEntry::text(Role::User, user_text));
        self.store.extend(
            outcome
                .tool_records
                .iter()
                .map(|r| ConversationEntry::tool_result(&r.tool_name, r.formatted())),
        );
        if !outcome.answer.is_empty() {
            self.store
                .append(ConversationEntry::text(Role::Assistant, &outcome.answer));
        }

        info!(
            thread = %thread_id,
            tools = outcome.tool_records.len(),
            answer_len = outcome.answer.len(),
            entries = self.store.len(),
            "Turn finished"
        );
        Ok(outcome)
    }

    /// Start a fresh dialogue under the same agent and settings.
    pub fn reset_conversation(&mut self) {
        self.store.reset();
        if let Some(agent) = &self.session.agent {
            agent.forget_thread(&self.session.thread_id);
        }
        self.session.thread_id = ThreadId::generate();
        debug!(thread = %self.session.thread_id, "Conversation reset");
    }

    /// Replay the stored conversation onto a surface.
    pub fn history(&self, surface: &mut dyn RenderSurface) {
        for entry in &self.store {
            match entry.entry_type() {
                EntryType::Text => surface.chat_line(entry.role(), entry.content()),
                EntryType::ToolResult => {
                    surface.tool_block(&tool_block_label(entry.tool_name()), entry.content())
                }
            }
        }
    }
}
