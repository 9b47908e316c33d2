//! Response normalization for ScienceDirect JSON envelopes.
//!
//! The provider returns two wrapper shapes: a search envelope with an ordered
//! list of entries, and a full-text envelope with one coredata object. Field
//! presence is irregular and the dc:creator field is polymorphic (a string,
//! an object carrying a `$` text field, or a list mixing either). Everything
//! here is pure: parsed JSON in, Article values out.

use super::{Article, PLACEHOLDER_TITLE};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "search-results", default)]
    results: SearchResults,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    #[serde(default)]
    entry: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<Creator>,
    #[serde(rename = "prism:teaser")]
    teaser: Option<String>,
    #[serde(rename = "dc:description")]
    description: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    pii: Option<String>,
    #[serde(rename = "prism:publicationName")]
    publication_name: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
    #[serde(default)]
    link: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct ArticleEnvelope {
    #[serde(rename = "full-text-retrieval-response", default)]
    response: FullTextResponse,
}

#[derive(Debug, Default, Deserialize)]
struct FullTextResponse {
    #[serde(default)]
    coredata: Option<CoreData>,
    /// Opaque provider subtree; only the raw-text path is consulted
    #[serde(rename = "originalText", default)]
    original_text: Value,
}

#[derive(Debug, Deserialize)]
struct CoreData {
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<Creator>,
    #[serde(rename = "dc:description")]
    description: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    pii: Option<String>,
    #[serde(rename = "prism:publicationName")]
    publication_name: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
    #[serde(default)]
    link: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
}

/// The three creator shapes the provider emits. Anything unrecognized is
/// dropped rather than failing the whole envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Creator {
    Name(String),
    Tagged(CreatorObject),
    Many(Vec<CreatorItem>),
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreatorItem {
    Name(String),
    Tagged(CreatorObject),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct CreatorObject {
    #[serde(rename = "$")]
    text: Option<String>,
}

impl Creator {
    fn into_authors(self) -> Vec<String> {
        let items = match self {
            Self::Name(name) => vec![CreatorItem::Name(name)],
            Self::Tagged(object) => vec![CreatorItem::Tagged(object)],
            Self::Many(items) => items,
            Self::Other(_) => Vec::new(),
        };
        items.into_iter().filter_map(CreatorItem::into_name).collect()
    }
}

impl CreatorItem {
    fn into_name(self) -> Option<String> {
        let name = match self {
            Self::Name(name) => name,
            Self::Tagged(object) => object.text?,
            Self::Other(_) => return None,
        };
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn authors(creator: Option<Creator>) -> Vec<String> {
    creator.map_or_else(Vec::new, Creator::into_authors)
}

fn first_link(links: Vec<Link>) -> Option<String> {
    links.into_iter().next().and_then(|link| link.href)
}

/// Normalize a search envelope into zero or more articles.
/// A missing envelope or entry list yields an empty vector, not an error.
pub fn search_results(data: Value) -> Result<Vec<Article>> {
    let envelope: SearchEnvelope = serde_json::from_value(data).map_err(|e| Error::Parse {
        context: "search-results".to_string(),
        message: e.to_string(),
    })?;

    Ok(envelope
        .results
        .entry
        .into_iter()
        .map(|entry| Article {
            title: entry
                .title
                .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            authors: authors(entry.creator),
            abstract_text: entry.teaser.or(entry.description),
            doi: entry.doi,
            pii: entry.pii,
            publication_name: entry.publication_name,
            cover_date: entry.cover_date,
            url: first_link(entry.link),
        })
        .collect())
}

/// Normalize a full-text envelope into a single article.
/// The abstract prefers the originalText raw-text node when it is a
/// non-empty string, then falls back to dc:description.
pub fn full_text_article(data: Value) -> Result<Article> {
    let envelope: ArticleEnvelope = serde_json::from_value(data).map_err(|e| Error::Parse {
        context: "full-text-retrieval-response".to_string(),
        message: e.to_string(),
    })?;

    let raw_text = raw_text_abstract(&envelope.response.original_text);
    let core = envelope.response.coredata;

    Ok(match core {
        Some(core) => Article {
            title: core
                .title
                .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            authors: authors(core.creator),
            abstract_text: raw_text.or(core.description),
            doi: core.doi,
            pii: core.pii,
            publication_name: core.publication_name,
            cover_date: core.cover_date,
            url: first_link(core.link),
        },
        None => Article {
            abstract_text: raw_text,
            ..Article::new(PLACEHOLDER_TITLE.to_string())
        },
    })
}

fn raw_text_abstract(original_text: &Value) -> Option<String> {
    let text = original_text
        .get("xocs:doc")?
        .get("xocs:serial-item")?
        .get("xocs:raw-text")?
        .as_str()?;
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
