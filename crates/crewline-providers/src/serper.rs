//! Serper web search.

use async_trait::async_trait;
use crewline_core::{CapabilityError, SearchHit, SearchTool};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::http;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Search tool backed by the Serper Google search API.
pub struct SerperSearch {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl SerperSearch {
    /// Fails when no Serper key is configured.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .serper_api_key
            .clone()
            .ok_or(ProviderError::MissingCredential(crate::config::SERPER_API_KEY))?;
        Ok(Self {
            client: http::build_client(config.http_timeout())?,
            url: config.serper_url.clone(),
            api_key,
            timeout_secs: config.http_timeout_secs,
        })
    }
}

#[async_trait]
impl SearchTool for SerperSearch {
    async fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> std::result::Result<Vec<SearchHit>, CapabilityError> {
        debug!(query = %query, limit = limit, "Searching the web");

        let response = self
            .client
            .post(&self.url)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest { q: query, num: limit })
            .send()
            .await
            .map_err(|e| http::transport_error(&e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| http::transport_error(&e, self.timeout_secs))?;
        if !status.is_success() {
            return Err(http::status_error(status.as_u16(), &text));
        }
        parse_results(&text, limit)
    }
}

/// Map the `organic` results of a Serper response to at most `limit` hits.
pub fn parse_results(
    body: &str,
    limit: u32,
) -> std::result::Result<Vec<SearchHit>, CapabilityError> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
        CapabilityError::MalformedResponse(format!("invalid search body: {e}"))
    })?;

    Ok(response
        .organic
        .into_iter()
        .take(limit as usize)
        .map(|r| SearchHit {
            title: r.title,
            snippet: r.snippet,
            source: r.link,
        })
        .collect())
}
