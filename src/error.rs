use thiserror::Error;

/// Error taxonomy for the ScienceDirect client and the research agent
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("ScienceDirect API key is required. Set ELSEVIER_API_KEY or pass --api-key")]
    MissingApiKey,

    // Client errors (permanent - don't retry)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Authentication failed: {detail}")]
    AuthenticationFailed { detail: String },

    #[error("Rate limit exceeded, please try again later: {detail}")]
    RateLimited { detail: String },

    #[error("Article with PII {pii} not found: {detail}")]
    NotFound { pii: String, detail: String },

    // Upstream errors (any other non-2xx)
    #[error("API request failed with status {status}: {detail}")]
    Upstream { status: u16, detail: String },

    // Network errors (transient - callers may retry)
    #[error("Transport failure: {message}")]
    Transport { message: String },

    // Parse errors
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Agent-side chat completion failures
    #[error("Chat model error: {0}")]
    Llm(String),
}

/// Error categorization for callers that wrap the client in a retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Permanent errors - should not retry
    Permanent,
    /// Transient errors - safe to retry
    Transient,
    /// Rate limited - retry with backoff
    RateLimited,
}

impl Error {
    /// Categorize error for retry logic
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_)
            | Self::MissingApiKey
            | Self::InvalidInput { .. }
            | Self::AuthenticationFailed { .. }
            | Self::NotFound { .. }
            | Self::Parse { .. }
            | Self::Serde(_) => ErrorCategory::Permanent,

            Self::RateLimited { .. } => ErrorCategory::RateLimited,

            Self::Transport { .. } | Self::Io(_) | Self::Llm(_) => ErrorCategory::Transient,

            // 4xx client errors are permanent, everything else is worth retrying
            Self::Upstream { status, .. } => match *status {
                400..=499 => ErrorCategory::Permanent,
                _ => ErrorCategory::Transient,
            },
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::RateLimited
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_categorization() {
        let client_err = Error::Upstream {
            status: 400,
            detail: "bad request".to_string(),
        };
        assert_eq!(client_err.category(), ErrorCategory::Permanent);
        assert!(!client_err.is_retryable());

        let server_err = Error::Upstream {
            status: 503,
            detail: "unavailable".to_string(),
        };
        assert_eq!(server_err.category(), ErrorCategory::Transient);
        assert!(server_err.is_retryable());
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = Error::RateLimited {
            detail: "enable debug mode for details".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::RateLimited);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_auth_failure_is_permanent() {
        let err = Error::AuthenticationFailed {
            detail: "invalid key".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
