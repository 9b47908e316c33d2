//! ScienceDirect content API client: one search endpoint, one by-PII
//! endpoint, header-based authentication, no retries.

use super::{normalize, Article, Pii};
use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Documented ceiling on the count parameter of the search endpoint
pub const PROVIDER_MAX_RESULTS: u32 = 200;

const API_KEY_HEADER: &str = "X-ELS-APIKey";
const AUTH_TOKEN_HEADER: &str = "X-ELS-Authtoken";
const INST_TOKEN_HEADER: &str = "X-ELS-Insttoken";

/// Client for the ScienceDirect search and article retrieval APIs.
///
/// Each call issues a single request on the shared connection-pooling
/// client; there is no state across calls, so one instance may be used
/// concurrently.
#[derive(Debug, Clone)]
pub struct ScienceDirectClient {
    http: Client,
    base_url: String,
    debug: bool,
}

impl ScienceDirectClient {
    /// Create a new client. Fails with a configuration error when no API
    /// key is present, before any network traffic.
    pub fn new(config: &Config) -> Result<Self> {
        let provider = &config.provider;

        if provider.api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, header_value("api_key", &provider.api_key)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &provider.auth_token {
            headers.insert(AUTH_TOKEN_HEADER, header_value("auth_token", token)?);
        }
        if let Some(token) = &provider.inst_token {
            headers.insert(INST_TOKEN_HEADER, header_value("inst_token", token)?);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(provider.timeout_secs))
            .default_headers(headers)
            .user_agent(concat!(
                "sciencedirect-agent/",
                env!("CARGO_PKG_VERSION"),
                " (Academic Research Tool)"
            ))
            .build()
            .map_err(|e| Error::Transport {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            debug: config.debug,
        })
    }

    /// Search for articles. The outgoing count parameter is clamped to the
    /// provider ceiling; zero matches yield an empty vector, not an error.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Article>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput {
                field: "query".to_string(),
                reason: "query cannot be empty".to_string(),
            });
        }
        if query.len() > 1000 {
            return Err(Error::InvalidInput {
                field: "query".to_string(),
                reason: "query too long (max 1000 characters)".to_string(),
            });
        }
        if limit == 0 {
            return Err(Error::InvalidInput {
                field: "limit".to_string(),
                reason: "limit must be at least 1".to_string(),
            });
        }

        let count = limit.min(PROVIDER_MAX_RESULTS);
        let url = self.search_url(query, count)?;
        debug!("Searching ScienceDirect: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        debug!("Search response status: {}", status);

        if !status.is_success() {
            return Err(self.upstream_error(status, response, None).await);
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to decode search response body");
            Error::Parse {
                context: "search response".to_string(),
                message: e.to_string(),
            }
        })?;

        let articles = normalize::search_results(value)?;
        info!(
            "ScienceDirect search returned {} articles for '{}'",
            articles.len(),
            query
        );
        Ok(articles)
    }

    /// Retrieve one article by PII. A 404 from upstream maps to NotFound.
    pub async fn article(&self, pii: &Pii) -> Result<Article> {
        let url = self.article_url(pii)?;
        debug!("Fetching article by PII: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        debug!("Article response status: {}", status);

        if !status.is_success() {
            return Err(self.upstream_error(status, response, Some(pii)).await);
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to decode article response body");
            Error::Parse {
                context: "article response".to_string(),
                message: e.to_string(),
            }
        })?;

        normalize::full_text_article(value)
    }

    /// Credential probe: a one-result search proves the key is accepted.
    /// A rate-limit answer still means the credentials were recognized.
    pub async fn health_check(&self) -> bool {
        match self.search("test", 1).await {
            Ok(_) | Err(Error::RateLimited { .. }) => true,
            Err(e) => {
                warn!("ScienceDirect health check failed: {}", e);
                false
            }
        }
    }

    fn search_url(&self, query: &str, count: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/search/sciencedirect", self.base_url))
            .map_err(|e| Error::InvalidInput {
                field: "base_url".to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("count", &count.to_string())
            .append_pair("httpAccept", "application/json");
        Ok(url)
    }

    fn article_url(&self, pii: &Pii) -> Result<Url> {
        Url::parse(&format!(
            "{}/article/pii/{}",
            self.base_url,
            pii.url_encoded()
        ))
        .map_err(|e| Error::InvalidInput {
            field: "base_url".to_string(),
            reason: e.to_string(),
        })
    }

    async fn upstream_error(
        &self,
        status: StatusCode,
        response: reqwest::Response,
        pii: Option<&Pii>,
    ) -> Error {
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        let detail = self.error_detail(status, &headers, &body);
        warn!("ScienceDirect request failed with status {}", status);

        match status.as_u16() {
            401 => Error::AuthenticationFailed { detail },
            429 => Error::RateLimited { detail },
            404 if pii.is_some() => Error::NotFound {
                pii: pii.map(ToString::to_string).unwrap_or_default(),
                detail,
            },
            code => Error::Upstream {
                status: code,
                detail,
            },
        }
    }

    fn error_detail(&self, status: StatusCode, headers: &HeaderMap, body: &str) -> String {
        if self.debug {
            let truncated: String = body.chars().take(500).collect();
            format!("status={status}, body={truncated:?}, headers={headers:?}")
        } else {
            "enable debug mode for details".to_string()
        }
    }
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidInput {
        field: field.to_string(),
        reason: "value contains characters not allowed in an HTTP header".to_string(),
    })
}

fn transport_error(e: &reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request failed: {e}")
    };
    Error::Transport { message }
}
