//! Agent tool registration.
//!
//! Each tool wraps one client operation and is callable from the agent's
//! tool-call loop. Tool errors propagate to the loop; nothing is swallowed
//! at this layer.

use super::llm::ToolDefinition;
use crate::client::{Pii, ScienceDirectClient};
use crate::error::{Error, Result};
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// A callable tool exposed to the research agent.
///
/// - `name()` must be unique across the registry (snake_case).
/// - `description()` is surfaced to the model as the tool docstring.
/// - `parameters()` returns a JSON Schema object for the arguments.
/// - `call()` receives the model's JSON arguments and returns JSON output.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> Value;

    async fn call(&self, params: Value) -> Result<Value>;
}

/// Registry mapping tool names to trait objects, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Panics if the name is already registered.
    pub fn register<T: AgentTool + 'static>(&mut self, tool: T) {
        assert!(
            !self.tools.iter().any(|t| t.name() == tool.name()),
            "Duplicate tool name: {}",
            tool.name()
        );
        self.tools.push(Arc::new(tool));
    }

    /// Invoke a registered tool by name
    pub async fn invoke(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::InvalidInput {
                field: "tool".to_string(),
                reason: format!("unknown tool: {name}"),
            })?;

        info!(tool = name, "Invoking tool");
        tool.call(params).await
    }

    /// Tool definitions to advertise in chat requests
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| {
                ToolDefinition::function(tool.name(), tool.description(), tool.parameters())
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Arguments for the article search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArticlesInput {
    /// Search query for finding articles
    pub query: String,
    /// Maximum number of articles to return
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

const fn default_search_limit() -> u32 {
    5
}

/// Arguments for the article detail tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetArticleDetailsInput {
    /// Publisher Item Identifier of the article
    pub pii: String,
}

/// Search ScienceDirect for articles matching a query
pub struct SearchArticlesTool {
    client: Arc<ScienceDirectClient>,
}

impl SearchArticlesTool {
    #[must_use]
    pub const fn new(client: Arc<ScienceDirectClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AgentTool for SearchArticlesTool {
    fn name(&self) -> &str {
        "search_articles"
    }

    fn description(&self) -> &str {
        "Search for scientific articles on ScienceDirect. Returns a list of matching articles with titles, authors, abstracts and identifiers."
    }

    fn parameters(&self) -> Value {
        schema_for!(SearchArticlesInput).to_value()
    }

    async fn call(&self, params: Value) -> Result<Value> {
        let input: SearchArticlesInput =
            serde_json::from_value(params).map_err(|e| Error::InvalidInput {
                field: "arguments".to_string(),
                reason: e.to_string(),
            })?;

        let articles = self.client.search(&input.query, input.limit).await?;
        Ok(serde_json::to_value(articles)?)
    }
}

/// Retrieve detailed information about one article by PII
pub struct GetArticleDetailsTool {
    client: Arc<ScienceDirectClient>,
}

impl GetArticleDetailsTool {
    #[must_use]
    pub const fn new(client: Arc<ScienceDirectClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AgentTool for GetArticleDetailsTool {
    fn name(&self) -> &str {
        "get_article_details"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific article by its Publisher Item Identifier (PII)."
    }

    fn parameters(&self) -> Value {
        schema_for!(GetArticleDetailsInput).to_value()
    }

    async fn call(&self, params: Value) -> Result<Value> {
        let input: GetArticleDetailsInput =
            serde_json::from_value(params).map_err(|e| Error::InvalidInput {
                field: "arguments".to_string(),
                reason: e.to_string(),
            })?;

        let pii = Pii::new(&input.pii)?;
        let article = self.client.article(&pii).await?;
        Ok(serde_json::to_value(article)?)
    }
}
