//! Web search tool backed by the Tavily search API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{Tool, ToolDefinition, ToolError};
use crate::session::{SearchConfig, SearchTopic, DEFAULT_RESULT_COUNT};

/// Tavily search endpoint.
pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

const TOOL_NAME: &str = "web_search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Searches the web and returns the provider's JSON response unchanged.
///
/// `max_results`, `include_domains` and `topic` are plain fields so the
/// session controller can overwrite them before building an agent.
#[derive(Clone)]
pub struct WebSearchTool {
    client: Client,
    api_key: String,
    endpoint: String,
    pub max_results: u8,
    pub include_domains: Vec<String>,
    pub topic: SearchTopic,
}

impl std::fmt::Debug for WebSearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchTool")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<REDACTED>")
            .field("max_results", &self.max_results)
            .field("include_domains", &self.include_domains)
            .field("topic", &self.topic)
            .finish()
    }
}

impl WebSearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
            max_results: DEFAULT_RESULT_COUNT,
            include_domains: Vec::new(),
            topic: SearchTopic::General,
        }
    }

    /// Point the tool at a different endpoint (self-hosted proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_body(&self, query: &str) -> Value {
        let mut body = json!({
            "query": query,
            "max_results": self.max_results,
            "topic": self.topic.as_str(),
            "search_depth": "basic",
        });
        if !self.include_domains.is_empty() {
            body["include_domains"] = json!(self.include_domains);
        }
        body
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            TOOL_NAME,
            "Search the web for up-to-date information. \
             Use this for current events, facts you are unsure about, or anything that needs a source.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        debug!(tool = TOOL_NAME, ?args, "Tool called");

        let args: SearchArgs = serde_json::from_value(args.clone()).map_err(|e| {
            warn!(tool = TOOL_NAME, error = %e, ?args, "Failed to parse arguments");
            ToolError::InvalidArguments(format!("{}. Got: {}", e, args))
        })?;

        if self.api_key.is_empty() {
            return Err(ToolError::Execution(
                "no search API key configured (set TAVILY_API_KEY)".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&self.request_body(&args.query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::Execution(format!(
                "search API returned status {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let body: Value = response.json().await?;
        debug!(
            tool = TOOL_NAME,
            hits = body["results"].as_array().map(|r| r.len()).unwrap_or(0),
            "Search completed"
        );
        Ok(body)
    }

    fn apply_search_config(&mut self, config: &SearchConfig) {
        self.max_results = config.result_count();
        self.topic = config.topic;
        self.include_domains = config.include_domains().to_vec();
    }
}
