use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Default ScienceDirect content API base URL
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.elsevier.com/content";

/// Default OpenAI-compatible chat completion endpoint
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when DEFAULT_MODEL is not configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Application configuration, layered from defaults, an optional TOML file,
/// environment variables and CLI overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub agent: AgentConfig,
    /// Enrich upstream failure messages with status, body and headers
    pub debug: bool,
}

/// ScienceDirect API access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Elsevier API key, sent as X-ELS-APIKey
    pub api_key: String,
    /// Optional session token, sent as X-ELS-Authtoken
    pub auth_token: Option<String>,
    /// Optional institutional token, sent as X-ELS-Insttoken
    pub inst_token: Option<String>,
    pub timeout_secs: u64,
}

/// Research agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub base_url: String,
    /// Chat API key, read from OPENAI_API_KEY when not set here
    pub api_key: String,
    pub model: String,
    /// Upper bound on tool-call rounds per question
    pub max_steps: u32,
    /// Default number of articles the agent is asked to consult
    pub max_articles: u32,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            agent: AgentConfig::default(),
            debug: false,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            api_key: String::new(),
            auth_token: None,
            inst_token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_steps: 8,
            max_articles: 5,
            timeout_secs: 120,
        }
    }
}

/// CLI-level configuration overrides, applied after file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub inst_token: Option<String>,
    pub model: Option<String>,
    pub debug: Option<bool>,
}

impl Config {
    /// Load configuration: defaults, then an optional TOML file, then
    /// environment variables, then CLI overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        let file = overrides
            .config_path
            .clone()
            .or_else(Self::default_config_file);
        if let Some(path) = file {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(config::File::from(path));
            } else if overrides.config_path.is_some() {
                return Err(Error::InvalidInput {
                    field: "config".to_string(),
                    reason: format!("configuration file not found: {}", path.display()),
                });
            }
        }

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        cfg.apply_env();
        cfg.apply_overrides(overrides);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Default configuration file location under the user config directory
    #[must_use]
    pub fn default_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sciencedirect-agent").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Some(value) = non_empty_env("ELSEVIER_API_KEY") {
            self.provider.api_key = value;
        }
        if let Some(value) = non_empty_env("ELSEVIER_AUTH_TOKEN") {
            self.provider.auth_token = Some(value);
        }
        if let Some(value) = non_empty_env("ELSEVIER_INST_TOKEN") {
            self.provider.inst_token = Some(value);
        }
        if let Some(value) = non_empty_env("OPENAI_API_KEY") {
            self.agent.api_key = value;
        }
        if let Some(value) = non_empty_env("DEFAULT_MODEL") {
            self.agent.model = value;
        }
        if let Ok(value) = env::var("DEBUG") {
            if parse_truthy(&value) {
                self.debug = true;
            }
        }
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(key) = &overrides.api_key {
            self.provider.api_key = key.clone();
        }
        if let Some(token) = &overrides.auth_token {
            self.provider.auth_token = Some(token.clone());
        }
        if let Some(token) = &overrides.inst_token {
            self.provider.inst_token = Some(token.clone());
        }
        if let Some(model) = &overrides.model {
            self.agent.model = model.clone();
        }
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
    }

    /// Validate structural settings. API key presence is checked when the
    /// client is constructed, so the status command works without credentials.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.provider.base_url).map_err(|e| Error::InvalidInput {
            field: "provider.base_url".to_string(),
            reason: e.to_string(),
        })?;
        Url::parse(&self.agent.base_url).map_err(|e| Error::InvalidInput {
            field: "agent.base_url".to_string(),
            reason: e.to_string(),
        })?;
        if self.provider.timeout_secs == 0 {
            return Err(Error::InvalidInput {
                field: "provider.timeout_secs".to_string(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        if self.agent.timeout_secs == 0 {
            return Err(Error::InvalidInput {
                field: "agent.timeout_secs".to_string(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        if self.agent.model.trim().is_empty() {
            return Err(Error::InvalidInput {
                field: "agent.model".to_string(),
                reason: "model cannot be empty".to_string(),
            });
        }
        if self.agent.max_steps == 0 {
            return Err(Error::InvalidInput {
                field: "agent.max_steps".to_string(),
                reason: "at least one tool-call round is required".to_string(),
            });
        }
        if self.agent.max_articles == 0 || self.agent.max_articles > 200 {
            return Err(Error::InvalidInput {
                field: "agent.max_articles".to_string(),
                reason: "must be between 1 and 200".to_string(),
            });
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// DEBUG-style environment truthiness: true, 1 or yes
#[must_use]
pub fn parse_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Mask a credential for display, keeping a short prefix and suffix
#[must_use]
pub fn mask_key(key: &str) -> String {
    if key.len() > 12 && key.is_ascii() {
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider.base_url, DEFAULT_PROVIDER_BASE_URL);
        assert_eq!(config.provider.timeout_secs, 30);
        assert!(config.provider.api_key.is_empty());
        assert_eq!(config.agent.model, DEFAULT_MODEL);
        assert_eq!(config.agent.max_articles, 5);
        assert!(!config.debug);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.provider.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidInput { .. })
        ));
        config.provider.base_url = DEFAULT_PROVIDER_BASE_URL.to_string();

        config.provider.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.provider.timeout_secs = 30;

        config.agent.model = "  ".to_string();
        assert!(config.validate().is_err());
        config.agent.model = DEFAULT_MODEL.to_string();

        config.agent.max_articles = 201;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = ConfigOverrides {
            api_key: Some("cli-key".to_string()),
            inst_token: Some("cli-inst".to_string()),
            model: Some("gpt-4o".to_string()),
            debug: Some(true),
            ..ConfigOverrides::default()
        };
        let mut config = Config::default();
        config.apply_overrides(&overrides);
        assert_eq!(config.provider.api_key, "cli-key");
        assert_eq!(config.provider.inst_token.as_deref(), Some("cli-inst"));
        assert_eq!(config.agent.model, "gpt-4o");
        assert!(config.debug);
    }

    #[test]
    fn test_config_file_layer() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[provider]\napi_key = \"file-key\"\ntimeout_secs = 10\n\n[agent]\nmodel = \"gpt-4o\"\n"
        )
        .unwrap();

        let overrides = ConfigOverrides {
            config_path: Some(file.path().to_path_buf()),
            ..ConfigOverrides::default()
        };
        let config = Config::load(&overrides).unwrap();
        assert_eq!(config.provider.timeout_secs, 10);
        assert_eq!(config.agent.model, "gpt-4o");
        // Environment may override the file key on developer machines
        if std::env::var("ELSEVIER_API_KEY").is_err() {
            assert_eq!(config.provider.api_key, "file-key");
        }
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let overrides = ConfigOverrides {
            config_path: Some(PathBuf::from("/definitely/not/here.toml")),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            Config::load(&overrides),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_parse_truthy() {
        assert!(parse_truthy("true"));
        assert!(parse_truthy("TRUE"));
        assert!(parse_truthy("1"));
        assert!(parse_truthy("yes"));
        assert!(!parse_truthy("false"));
        assert!(!parse_truthy("0"));
        assert!(!parse_truthy(""));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcdefgh12345678"), "abcdefgh...5678");
        assert_eq!(mask_key("short"), "***");
        assert_eq!(mask_key(""), "***");
    }
}
