//! Research agent: drives an LLM tool-call loop over the ScienceDirect
//! client and synthesizes a cited answer.

pub mod llm;
pub mod tools;

pub use llm::{AssistantReply, ChatClient, ChatMessage};
pub use tools::{AgentTool, GetArticleDetailsTool, SearchArticlesTool, ToolRegistry};

use crate::client::{Article, ScienceDirectClient};
use crate::config::Config;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// System prompt for the research agent. The closing instruction pins the
/// final-message contract that `final_response` parses.
pub const SYSTEM_PROMPT: &str = "You are a scientific research assistant specializing in \
analyzing academic literature. Your role is to search for relevant scientific articles \
using the ScienceDirect database and provide comprehensive, evidence-based answers to \
research questions. Always cite the specific articles you reference and provide a \
balanced view of the findings. Focus on recent, peer-reviewed research when possible. \
When you have gathered enough evidence, reply with a single JSON object of the form \
{\"answer\": \"...\", \"summary\": \"...\"} and no other text.";

/// Structured response from the research agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResponse {
    /// The synthesized answer to the question
    pub answer: String,
    /// Articles the agent consulted while answering
    #[serde(default)]
    pub articles: Vec<Article>,
    /// Brief summary of the findings
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct FinalAnswer {
    answer: String,
    #[serde(default)]
    summary: String,
}

/// Agent that answers research questions with tool-assisted literature search
pub struct ResearchAgent {
    llm: ChatClient,
    registry: ToolRegistry,
    max_steps: u32,
}

impl ResearchAgent {
    /// Build the agent with the standard search and detail tools
    pub fn new(config: &Config, client: Arc<ScienceDirectClient>) -> Result<Self> {
        let llm = ChatClient::new(&config.agent)?;
        let mut registry = ToolRegistry::new();
        registry.register(SearchArticlesTool::new(Arc::clone(&client)));
        registry.register(GetArticleDetailsTool::new(client));

        info!(
            "Research agent initialized: model={}, tools={}",
            llm.model(),
            registry.len()
        );
        Ok(Self {
            llm,
            registry,
            max_steps: config.agent.max_steps,
        })
    }

    /// Run the tool-call loop for one question. Tool failures propagate as
    /// typed errors; degrading them is the caller's decision.
    pub async fn run(&self, question: &str, max_articles: u32) -> Result<ResearchResponse> {
        let prompt = format!(
            "Please research the following scientific question: '{question}'. \
             Search for up to {max_articles} relevant articles, analyze their findings, \
             and provide a comprehensive answer with citations."
        );

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(&prompt)];
        let definitions = self.registry.definitions();
        let mut cited: Vec<Article> = Vec::new();

        for step in 0..self.max_steps {
            let reply = self.llm.complete(&messages, &definitions).await?;

            if reply.tool_calls.is_empty() {
                let content = reply.content.unwrap_or_default();
                debug!("Final answer after {} tool rounds", step);
                return Ok(final_response(&content, cited));
            }

            messages.push(ChatMessage::from_assistant(&reply));
            for call in &reply.tool_calls {
                let args: Value =
                    serde_json::from_str(&call.function.arguments).map_err(|e| {
                        Error::Llm(format!("model produced invalid tool arguments: {e}"))
                    })?;

                debug!("Tool call: {}({})", call.function.name, args);
                let result = self.registry.invoke(&call.function.name, args).await?;
                collect_cited(&call.function.name, &result, &mut cited);
                messages.push(ChatMessage::tool(&call.id, serde_json::to_string(&result)?));
            }
        }

        Err(Error::Llm(format!(
            "no final answer after {} tool rounds",
            self.max_steps
        )))
    }
}

/// Track articles returned by tool calls so the response can cite them
fn collect_cited(tool_name: &str, result: &Value, cited: &mut Vec<Article>) {
    match tool_name {
        "search_articles" => {
            if let Ok(articles) = serde_json::from_value::<Vec<Article>>(result.clone()) {
                for article in articles {
                    remember(cited, article);
                }
            }
        }
        "get_article_details" => {
            if let Ok(article) = serde_json::from_value::<Article>(result.clone()) {
                remember(cited, article);
            }
        }
        _ => {}
    }
}

fn remember(cited: &mut Vec<Article>, article: Article) {
    let duplicate = cited.iter().any(|existing| match (&existing.pii, &article.pii) {
        (Some(a), Some(b)) => a == b,
        _ => existing.title == article.title,
    });
    if !duplicate {
        cited.push(article);
    }
}

/// Parse the model's final message. A well-formed JSON object yields the
/// structured answer; anything else becomes the answer verbatim.
fn final_response(content: &str, cited: Vec<Article>) -> ResearchResponse {
    let trimmed = strip_code_fence(content);
    match serde_json::from_str::<FinalAnswer>(trimmed) {
        Ok(parsed) => ResearchResponse {
            answer: parsed.answer,
            articles: cited,
            summary: parsed.summary,
        },
        Err(_) => ResearchResponse {
            answer: trimmed.to_string(),
            articles: cited,
            summary: String::new(),
        },
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

/// Answer a research question, degrading any failure into a valid response
/// with an apologetic answer and zero articles. This is the one boundary
/// that swallows errors; everything below it propagates them.
pub async fn answer_research_question(
    question: &str,
    max_articles: u32,
    config: &Config,
) -> ResearchResponse {
    match run_research(question, max_articles, config).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Research failed, returning degraded answer: {}", e);
            ResearchResponse {
                answer: format!("I encountered an error while researching: {e}"),
                articles: Vec::new(),
                summary: "Unable to complete the research due to an error.".to_string(),
            }
        }
    }
}

async fn run_research(
    question: &str,
    max_articles: u32,
    config: &Config,
) -> Result<ResearchResponse> {
    let client = Arc::new(ScienceDirectClient::new(config)?);
    let agent = ResearchAgent::new(config, client)?;
    agent.run(question, max_articles).await
}

/// Interactive chat session reading questions from stdin
pub async fn chat_with_agent(config: &Config) -> Result<()> {
    let client = Arc::new(ScienceDirectClient::new(config)?);
    let agent = ResearchAgent::new(config, client)?;

    println!("Scientific Research Assistant");
    println!("{}", "=".repeat(50));
    println!("Ask me any scientific question, and I'll search the literature for you.");
    println!("Type 'quit' or 'exit' to end the session.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("Your question:");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        if matches!(question.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("Goodbye!");
            break;
        }
        if question.is_empty() {
            continue;
        }

        println!("\nSearching scientific literature...");
        match agent.run(question, config.agent.max_articles).await {
            Ok(response) => print_session_response(&response),
            Err(e) => {
                println!("\nError: {e}\n");
                println!("Please check your API credentials and try again.\n");
            }
        }
    }

    Ok(())
}

fn print_session_response(response: &ResearchResponse) {
    let rule = "=".repeat(50);

    println!("\n{rule}");
    println!("ANSWER:");
    println!("{}", response.answer);

    if !response.articles.is_empty() {
        println!("\n{rule}");
        println!("REFERENCES:");
        for (i, article) in response.articles.iter().enumerate() {
            println!("\n{}. {}", i + 1, article.title);
            if !article.authors.is_empty() {
                let authors: Vec<&str> = article
                    .authors
                    .iter()
                    .take(3)
                    .map(String::as_str)
                    .collect();
                println!("   Authors: {}", authors.join(", "));
            }
            if let Some(journal) = &article.publication_name {
                println!("   Journal: {journal}");
            }
            if let Some(date) = &article.cover_date {
                println!("   Date: {date}");
            }
            if let Some(doi) = &article.doi {
                println!("   DOI: {doi}");
            }
        }
    }

    if !response.summary.is_empty() {
        println!("\n{rule}");
        println!("SUMMARY:");
        println!("{}", response.summary);
    }
    println!("\n{rule}\n");
}
