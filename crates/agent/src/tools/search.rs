//! Real-time web search.
//!
//! The only tool with an argument: it paraphrases the user's question into
//! a few search keywords via one auxiliary oracle call, then queries a
//! [`SearchProvider`]. The HTTP provider talks to the DuckDuckGo Instant
//! Answer API, which needs no credentials.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::oracle::{CompletionOracle, OracleRequest, ToolSpec};
use crate::prompts::SEARCH_QUERY_PROMPT;

use super::{Tool, ToolError};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search returned status {0}")]
    Api(u16),
    #[error("search produced no results for `{0}`")]
    NoResults(String),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}

/// Keyless instant-answer search.
pub struct DuckDuckGoProvider {
    http: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoProvider {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: "https://api.duckduckgo.com".to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: String,
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api(status.as_u16()));
        }

        let answer: InstantAnswer = response.json().await?;
        if !answer.abstract_text.trim().is_empty() {
            return Ok(answer.abstract_text);
        }

        let snippets: Vec<&str> = answer
            .related_topics
            .iter()
            .map(|topic| topic.text.trim())
            .filter(|text| !text.is_empty())
            .take(3)
            .collect();

        if snippets.is_empty() {
            return Err(SearchError::NoResults(query.to_string()));
        }

        Ok(snippets.join("\n"))
    }
}

pub struct WebSearchTool {
    oracle: Arc<dyn CompletionOracle>,
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(oracle: Arc<dyn CompletionOracle>, provider: Arc<dyn SearchProvider>) -> Self {
        Self { oracle, provider }
    }

    /// One auxiliary oracle call turning the question into 2-4 keywords.
    /// Falls back to the raw question when the call fails or returns
    /// nothing usable.
    async fn derive_query(&self, user_query: &str) -> String {
        let request = OracleRequest::classification(
            SEARCH_QUERY_PROMPT,
            format!("User question: {user_query}"),
        );

        match self.oracle.complete(request).await {
            Ok(completion) => {
                let derived = completion.content.unwrap_or_default().trim().to_string();
                if derived.is_empty() {
                    user_query.to_string()
                } else {
                    derived
                }
            }
            Err(_) => user_query.to_string(),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("web_search", "real-time web search for anything else")
            .with_parameter("user_query", "the user's question to search for")
    }

    async fn run(&self, arguments: &BTreeMap<String, String>) -> Result<String, ToolError> {
        let user_query = arguments.get("user_query").map(String::as_str).unwrap_or_default();
        let search_query = self.derive_query(user_query).await;
        debug!(
            event_name = "turn.tools.search_query",
            query = %search_query,
            "derived search query"
        );

        let results = self.provider.search(&search_query).await?;
        Ok(format!("Search Query: {search_query}\n\nResults: {results}"))
    }
}
