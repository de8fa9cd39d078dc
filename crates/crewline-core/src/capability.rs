//! Collaborator traits: text generation and web search.
//!
//! The core only invokes these; concrete providers live in
//! `crewline-providers`, in-memory stand-ins in [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Backend model identifier.
    pub model: String,
    /// Persona and action instructions.
    pub system: String,
    /// Task context.
    pub user: String,
}

/// Text generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CapabilityError>;
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    /// Where the snippet came from, usually a URL.
    pub source: String,
}

/// Bounded web search.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Return at most `limit` hits for `query`, best first. An empty result
    /// is not an error.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, CapabilityError>;
}
