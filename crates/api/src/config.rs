//! Environment-driven configuration for the booknaru service.

use std::env;
use std::time::Duration;

use booknaru_discovery::PipelineConfig;

/// Service configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Base URL of the library open-data API.
    pub library_api_url: String,
    /// Auth key for the library open-data API. Required at startup.
    pub library_auth_key: Option<String>,
    /// Base URL of the OpenAI-compatible chat API.
    pub openai_api_url: String,
    /// API key for the AI provider. Required at startup.
    pub openai_api_key: Option<String>,
    /// Model used for candidate generation and insights.
    pub openai_model: String,
    /// Outer budget for AI calls.
    pub ai_timeout: Duration,
    /// Per-request timeout for catalog calls.
    pub catalog_timeout: Duration,
    /// Per-call budget for holdings lookups.
    pub availability_timeout: Duration,
    /// TTL for cached aggregated-search envelopes.
    pub ai_search_cache_ttl: Duration,
    /// TTL for cached keyword-search responses.
    pub search_cache_ttl: Duration,
    /// Maximum number of cached response bodies.
    pub cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("BOOKNARU_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            library_api_url: env::var("LIBRARY_API_URL")
                .unwrap_or_else(|_| "https://data4library.kr/api".to_string()),
            library_auth_key: env::var("LIBRARY_AUTH_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ai_timeout: duration_from_env("AI_TIMEOUT_SECS", 8),
            catalog_timeout: duration_from_env("CATALOG_TIMEOUT_SECS", 5),
            availability_timeout: duration_from_env("AVAILABILITY_TIMEOUT_SECS", 2),
            ai_search_cache_ttl: duration_from_env("AI_SEARCH_CACHE_TTL_SECS", 24 * 60 * 60),
            search_cache_ttl: duration_from_env("SEARCH_CACHE_TTL_SECS", 60 * 60),
            cache_capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

impl Config {
    /// Pipeline tuning derived from this configuration.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            model: self.openai_model.clone(),
            ai_timeout: self.ai_timeout,
            availability_timeout: self.availability_timeout,
            cache_ttl: self.ai_search_cache_ttl,
            ..PipelineConfig::default()
        }
    }
}

fn duration_from_env(var: &str, default_secs: u64) -> Duration {
    let secs = env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}
