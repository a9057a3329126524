//! Search settings applied to the web search tool on configure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Smallest allowed number of search results.
pub const MIN_RESULT_COUNT: u8 = 1;
/// Largest allowed number of search results.
pub const MAX_RESULT_COUNT: u8 = 10;
/// Default number of search results.
pub const DEFAULT_RESULT_COUNT: u8 = 3;

/// Search topic. `News` favours recency, `General` favours relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTopic {
    #[default]
    General,
    News,
}

impl SearchTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::News => "news",
        }
    }
}

impl fmt::Display for SearchTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchTopic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "news" => Ok(Self::News),
            _ => Err(format!("invalid search topic: {s} (expected general or news)")),
        }
    }
}

/// Settings copied onto search tools when the agent is (re)built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    result_count: u8,
    pub topic: SearchTopic,
    include_domains: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_count: DEFAULT_RESULT_COUNT,
            topic: SearchTopic::default(),
            include_domains: Vec::new(),
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result_count(&self) -> u8 {
        self.result_count
    }

    /// Set the result count, rejecting values outside `1..=10`.
    pub fn set_result_count(&mut self, count: u8) -> Result<(), String> {
        if !(MIN_RESULT_COUNT..=MAX_RESULT_COUNT).contains(&count) {
            return Err(format!(
                "result count must be between {} and {}, got {}",
                MIN_RESULT_COUNT, MAX_RESULT_COUNT, count
            ));
        }
        self.result_count = count;
        Ok(())
    }

    pub fn include_domains(&self) -> &[String] {
        &self.include_domains
    }

    /// Add a domain to the allow-list. Duplicates are ignored.
    ///
    /// Returns whether the list changed, or an error for blank input.
    pub fn add_domain(&mut self, domain: &str) -> Result<bool, String> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err("domain must not be blank".to_string());
        }
        if self.include_domains.iter().any(|d| d == domain) {
            return Ok(false);
        }
        self.include_domains.push(domain.to_string());
        Ok(true)
    }

    /// Remove a domain by value. Returns whether it was present.
    pub fn remove_domain(&mut self, domain: &str) -> bool {
        let domain = domain.trim();
        let before = self.include_domains.len();
        self.include_domains.retain(|d| d != domain);
        self.include_domains.len() != before
    }

    /// Remove a domain by list position. Returns the removed domain.
    pub fn remove_domain_at(&mut self, index: usize) -> Option<String> {
        (index < self.include_domains.len()).then(|| self.include_domains.remove(index))
    }

    pub(crate) fn is_valid(&self) -> bool {
        (MIN_RESULT_COUNT..=MAX_RESULT_COUNT).contains(&self.result_count)
    }
}
