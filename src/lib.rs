pub mod agent;
pub mod client;
pub mod config;
pub mod error;

pub use agent::{answer_research_question, chat_with_agent, ResearchAgent, ResearchResponse};
pub use client::{Article, Pii, ScienceDirectClient, PLACEHOLDER_TITLE, PROVIDER_MAX_RESULTS};
pub use config::{Config, ConfigOverrides};
pub use error::{Error, ErrorCategory, Result};
