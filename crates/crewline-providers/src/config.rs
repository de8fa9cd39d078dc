//! Provider configuration from the process environment.

use std::time::Duration;

use crate::error::{ProviderError, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SERPER_URL: &str = "https://google.serper.dev/search";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";
pub const SERPER_URL: &str = "SERPER_URL";
pub const HTTP_TIMEOUT_SECS: &str = "CREWLINE_HTTP_TIMEOUT_SECS";

/// Credentials and endpoints for the generation and search providers.
#[derive(Clone)]
pub struct ProviderConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    /// Web search is disabled when unset.
    pub serper_api_key: Option<String>,
    pub serper_url: String,
    pub http_timeout_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("serper_api_key", &self.serper_api_key.as_ref().map(|_| "<redacted>"))
            .field("serper_url", &self.serper_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    /// Config with an OpenAI key and every other setting at its default.
    pub fn new(openai_api_key: impl Into<String>) -> Self {
        Self {
            openai_api_key: openai_api_key.into(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            serper_api_key: None,
            serper_url: DEFAULT_SERPER_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    pub fn with_serper_key(mut self, key: impl Into<String>) -> Self {
        self.serper_api_key = Some(key.into());
        self
    }

    /// Read the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let openai_api_key =
            get(OPENAI_API_KEY).ok_or(ProviderError::MissingCredential(OPENAI_API_KEY))?;
        let http_timeout_secs = match get(HTTP_TIMEOUT_SECS) {
            None => DEFAULT_HTTP_TIMEOUT_SECS,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ProviderError::InvalidSetting {
                    name: HTTP_TIMEOUT_SECS,
                    value: raw,
                })?,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: get(OPENAI_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            serper_api_key: get(SERPER_API_KEY),
            serper_url: get(SERPER_URL).unwrap_or_else(|| DEFAULT_SERPER_URL.to_string()),
            http_timeout_secs,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn search_enabled(&self) -> bool {
        self.serper_api_key.is_some()
    }
}
