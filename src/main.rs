use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use sciencedirect_agent::config::{mask_key, Config, ConfigOverrides};
use sciencedirect_agent::{answer_research_question, chat_with_agent, Article, ScienceDirectClient};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sciencedirect-agent",
    version,
    about = "Search ScienceDirect and answer research questions with cited articles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Elsevier API key (falls back to ELSEVIER_API_KEY)
    #[arg(short = 'k', long, global = true)]
    api_key: Option<String>,

    /// Institutional token (falls back to ELSEVIER_INST_TOKEN)
    #[arg(short = 't', long, global = true)]
    inst_token: Option<String>,

    /// Enable debug mode for detailed upstream error information
    #[arg(long, global = true)]
    debug: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for scientific articles on ScienceDirect
    Search {
        /// Search query for articles
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
    },

    /// Ask a research question and get an AI-powered answer with citations
    Ask {
        /// Research question to answer
        question: String,

        /// Maximum articles to analyze
        #[arg(short = 'm', long, default_value_t = 5)]
        max_articles: u32,

        /// Chat model to use (falls back to DEFAULT_MODEL)
        #[arg(long)]
        model: Option<String>,
    },

    /// Start an interactive chat session with the research agent
    Chat,

    /// Show current configuration and API key status
    Config {
        /// Issue a test request to verify the API key works
        #[arg(long)]
        check: bool,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if atty::is(atty::Stream::Stderr) {
        builder.init();
    } else {
        builder.json().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let model = match &cli.command {
        Commands::Ask { model, .. } => model.clone(),
        _ => None,
    };
    let overrides = ConfigOverrides {
        config_path: cli.config.clone(),
        api_key: cli.api_key.clone(),
        auth_token: None,
        inst_token: cli.inst_token.clone(),
        model,
        debug: cli.debug.then_some(true),
    };
    let config = Config::load(&overrides)?;

    match cli.command {
        Commands::Search { query, limit } => run_search(&config, &query, limit).await,
        Commands::Ask {
            question,
            max_articles,
            ..
        } => run_ask(&config, &question, max_articles).await,
        Commands::Chat => {
            chat_with_agent(&config).await?;
            Ok(())
        }
        Commands::Config { check } => run_config(&config, check).await,
    }
}

async fn run_search(config: &Config, query: &str, limit: u32) -> Result<()> {
    let client = ScienceDirectClient::new(config)?;

    println!("Searching articles...");
    let articles = client.search(query, limit).await?;

    if articles.is_empty() {
        println!("No articles found.");
        return Ok(());
    }

    println!("\nSearch results for: {query}\n");
    for (i, article) in articles.iter().enumerate() {
        print_article_line(i + 1, article);
    }

    let with_abstracts: Vec<_> = articles
        .iter()
        .filter(|article| article.abstract_text.is_some())
        .collect();
    if !with_abstracts.is_empty() {
        println!("\nAbstracts:");
        for article in with_abstracts {
            if let Some(abstract_text) = &article.abstract_text {
                println!("\n{}", article.title);
                println!("  {}", truncate(abstract_text, 500));
            }
        }
    }

    Ok(())
}

async fn run_ask(config: &Config, question: &str, max_articles: u32) -> Result<()> {
    if config.agent.api_key.trim().is_empty() {
        bail!("OpenAI API key is required for AI responses. Set OPENAI_API_KEY");
    }

    println!("Researching your question...");
    let response = answer_research_question(question, max_articles, config).await;

    println!("\nAnswer");
    println!("{}", "-".repeat(50));
    println!("{}", response.answer);

    if !response.articles.is_empty() {
        println!("\nReferenced Articles:");
        for (i, article) in response.articles.iter().enumerate() {
            print_article_line(i + 1, article);
        }
    }

    if !response.summary.is_empty() {
        println!("\nSummary");
        println!("{}", "-".repeat(50));
        println!("{}", response.summary);
    }

    Ok(())
}

async fn run_config(config: &Config, check: bool) -> Result<()> {
    println!("Configuration Status");
    println!("{}", "-".repeat(50));

    if config.provider.api_key.is_empty() {
        println!("[x] Elsevier API Key: Not set");
    } else {
        println!(
            "[+] Elsevier API Key: {}",
            mask_key(&config.provider.api_key)
        );
    }

    match &config.provider.inst_token {
        Some(_) => println!("[+] Institutional Token: Set"),
        None => println!("[o] Institutional Token: Not set (optional)"),
    }

    if config.agent.api_key.is_empty() {
        println!("[x] OpenAI API Key: Not set");
    } else {
        println!("[+] OpenAI API Key: {}", mask_key(&config.agent.api_key));
    }

    println!("[i] Default Model: {}", config.agent.model);
    println!("[i] Provider URL: {}", config.provider.base_url);
    if config.debug {
        println!("[i] Debug mode: enabled");
    }

    if check {
        let client = ScienceDirectClient::new(config)?;
        println!("\nIssuing a test search to verify credentials...");
        if client.health_check().await {
            println!("[+] ScienceDirect API access confirmed");
        } else {
            println!("[x] ScienceDirect API check failed (rerun with --debug for details)");
        }
    }

    Ok(())
}

fn print_article_line(index: usize, article: &Article) {
    println!("{index}. {}", article.title);
    if !article.authors.is_empty() {
        let mut authors = article
            .authors
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if article.authors.len() > 3 {
            authors.push_str(" et al.");
        }
        println!("   Authors: {authors}");
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
    if let Some(pii) = &article.pii {
        println!("   PII: {pii}");
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max_chars).collect();
        format!("{prefix}...")
    }
}
