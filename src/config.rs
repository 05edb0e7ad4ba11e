use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub hacker_news: HackerNewsConfig,
    pub rate_limit: RateLimitConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HackerNewsConfig {
    pub api_base: String,
    pub search_base: String,
    pub web_base: String,
    pub user_agent: String,
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://hacker-news.firebaseio.com/v0".to_string(),
            search_base: "https://hn.algolia.com/api/v1".to_string(),
            web_base: "https://news.ycombinator.com".to_string(),
            user_agent: format!("hn-mcp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum spacing between two outbound requests.
    pub min_interval_ms: u64,
    /// Upper bound on in-flight item fetches for one tool invocation.
    pub max_concurrent_fetches: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 100,
            max_concurrent_fetches: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-hacker-news".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the path in `HN_MCP_CONFIG`, or `config.toml`.
    ///
    /// A missing file is not an error: MCP clients usually spawn the server
    /// from an arbitrary directory, so built-in defaults apply.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("HN_MCP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Override with environment variables if set
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(base) = std::env::var("HN_API_BASE") {
            self.hacker_news.api_base = base;
        }
        if let Ok(base) = std::env::var("HN_SEARCH_BASE") {
            self.hacker_news.search_base = base;
        }
        if let Ok(ms) = std::env::var("HN_MIN_INTERVAL_MS") {
            self.rate_limit.min_interval_ms = ms
                .parse()
                .with_context(|| format!("HN_MIN_INTERVAL_MS is not a number: {}", ms))?;
        }
        Ok(())
    }
}
