pub mod normalize;
pub mod sciencedirect;

pub use sciencedirect::{ScienceDirectClient, PROVIDER_MAX_RESULTS};

use crate::error::{Error, Result};

/// Placeholder used when the provider omits a title. The upstream API does
/// return entries without dc:title; they are kept rather than dropped.
pub const PLACEHOLDER_TITLE: &str = "No title";

/// PII (Publisher Item Identifier) wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pii(String);

impl Pii {
    /// Create a new PII from a string, rejecting blank input
    pub fn new(pii: &str) -> Result<Self> {
        let cleaned = pii.trim();

        if cleaned.is_empty() {
            return Err(Error::InvalidInput {
                field: "pii".to_string(),
                reason: "PII cannot be empty".to_string(),
            });
        }

        Ok(Self(cleaned.to_string()))
    }

    /// Get the PII string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to a URL-safe path segment
    #[must_use]
    pub fn url_encoded(&self) -> String {
        urlencoding::encode(&self.0).to_string()
    }
}

impl std::fmt::Display for Pii {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Pii {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Article record normalized from ScienceDirect responses
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct Article {
    /// Article title, or the "No title" placeholder when absent upstream
    pub title: String,
    /// Author names in citation order, may be empty
    #[serde(default)]
    pub authors: Vec<String>,
    /// Abstract or teaser text
    pub abstract_text: Option<String>,
    /// Digital Object Identifier
    pub doi: Option<String>,
    /// Publisher Item Identifier
    pub pii: Option<String>,
    /// Journal or publication name
    pub publication_name: Option<String>,
    /// Cover date as returned by the provider, free-form
    pub cover_date: Option<String>,
    /// Link to the article landing page
    pub url: Option<String>,
}

impl Article {
    /// Create an article with just a title, everything else absent
    #[must_use]
    pub const fn new(title: String) -> Self {
        Self {
            title,
            authors: Vec::new(),
            abstract_text: None,
            doi: None,
            pii: None,
            publication_name: None,
            cover_date: None,
            url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_pii_validation() {
        assert!(Pii::new("S0021925818303313").is_ok());
        assert!(Pii::new("  S0021925818303313  ").is_ok());
        assert!(Pii::new("").is_err());
        assert!(Pii::new("   ").is_err());
    }

    #[test]
    fn test_pii_trims_whitespace() {
        let pii = Pii::new("  S0021925818303313 ").unwrap();
        assert_eq!(pii.as_str(), "S0021925818303313");
        assert_eq!(pii.to_string(), "S0021925818303313");
    }

    #[test]
    fn test_pii_url_encoding() {
        let pii = Pii::new("S0021-9258(18)30331/3").unwrap();
        let encoded = pii.url_encoded();
        assert!(!encoded.contains('('));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_pii_from_str() {
        let pii = Pii::from_str("S0021925818303313").unwrap();
        assert_eq!(pii.as_str(), "S0021925818303313");
        assert!(Pii::from_str(" ").is_err());
    }

    #[test]
    fn test_article_new_has_no_optionals() {
        let article = Article::new("A title".to_string());
        assert!(article.authors.is_empty());
        assert!(article.abstract_text.is_none());
        assert!(article.doi.is_none());
        assert!(article.pii.is_none());
        assert!(article.publication_name.is_none());
        assert!(article.cover_date.is_none());
        assert!(article.url.is_none());
    }
}
