//! Resolved runtime settings.
//!
//! Values come from command-line flags, with environment variables (and
//! `.env` files loaded into the environment) as fallbacks.

use thiserror::Error;

use crate::agents::{OpenAiClient, ReactAgentBuilder, OPENAI_BASE_URL};
use crate::session::{SearchConfig, SearchTopic, SessionController, DEFAULT_RESULT_COUNT};
use crate::tools::{BoxedTool, WebSearchTool};

/// Model used when none is given.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Models offered for completion and by `/model`.
pub const KNOWN_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini"];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid search settings: {0}")]
    InvalidSearch(String),
}

/// Everything needed to build a session.
#[derive(Clone)]
pub struct Settings {
    pub model: String,
    pub openai_api_key: Option<String>,
    pub base_url: String,
    pub tavily_api_key: Option<String>,
    pub result_count: u8,
    pub topic: SearchTopic,
    pub domains: Vec<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<REDACTED>");
        f.debug_struct("Settings")
            .field("model", &self.model)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("base_url", &self.base_url)
            .field("tavily_api_key", &redact(&self.tavily_api_key))
            .field("result_count", &self.result_count)
            .field("topic", &self.topic)
            .field("domains", &self.domains)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            openai_api_key: None,
            base_url: OPENAI_BASE_URL.to_string(),
            tavily_api_key: None,
            result_count: DEFAULT_RESULT_COUNT,
            topic: SearchTopic::default(),
            domains: Vec::new(),
        }
    }
}

impl Settings {
    /// The search settings these values describe.
    pub fn search_config(&self) -> Result<SearchConfig, SettingsError> {
        let mut config = SearchConfig::new();
        config
            .set_result_count(self.result_count)
            .map_err(SettingsError::InvalidSearch)?;
        config.topic = self.topic;
        for domain in &self.domains {
            config
                .add_domain(domain)
                .map_err(SettingsError::InvalidSearch)?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.search_config().map(|_| ())
    }

    /// Names of the environment variables whose keys are missing.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let missing = |key: &Option<String>| key.as_deref().map_or(true, |k| k.trim().is_empty());
        let mut out = Vec::new();
        if missing(&self.openai_api_key) {
            out.push("OPENAI_API_KEY");
        }
        if missing(&self.tavily_api_key) {
            out.push("TAVILY_API_KEY");
        }
        out
    }

    pub fn agent_builder(&self) -> ReactAgentBuilder {
        ReactAgentBuilder::new(OpenAiClient::new(
            self.openai_api_key.clone().unwrap_or_default(),
            self.base_url.clone(),
        ))
    }

    /// Fresh tool instances for one configure call.
    pub fn search_tools(&self) -> Vec<BoxedTool> {
        vec![Box::new(WebSearchTool::new(
            self.tavily_api_key.clone().unwrap_or_default(),
        ))]
    }

    /// A controller whose pending configuration mirrors these settings.
    pub fn controller(&self) -> Result<SessionController, SettingsError> {
        let mut controller = SessionController::new(Box::new(self.agent_builder()));
        controller.set_model(self.model.clone());
        controller.set_search_config(self.search_config()?);
        Ok(controller)
    }
}
