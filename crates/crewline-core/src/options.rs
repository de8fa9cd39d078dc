//! Run-scoped options.
//!
//! Built once by the caller and passed by reference into a run; the executor
//! never reads process state on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default number of results per search.
pub const DEFAULT_SEARCH_RESULT_LIMIT: u32 = 5;

/// Largest accepted search result bound.
pub const MAX_SEARCH_RESULT_LIMIT: u32 = 100;

/// Default delegation ceiling.
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 3;

/// Options for a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Identifier selecting the generation backend model.
    pub model: String,
    /// Results per search, `1..=MAX_SEARCH_RESULT_LIMIT`.
    pub search_result_limit: u32,
    /// Send progress notifications to the observer.
    pub verbose: bool,
    /// Maximum nesting of delegations, and maximum delegation rounds per role invocation.
    pub max_delegation_depth: usize,
    /// Wall-time bound for one stage, delegations and searches included.
    pub stage_timeout_secs: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            search_result_limit: DEFAULT_SEARCH_RESULT_LIMIT,
            verbose: true,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            stage_timeout_secs: None,
        }
    }
}

impl RunOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_search_result_limit(mut self, limit: u32) -> Self {
        self.search_result_limit = limit;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    pub fn with_stage_timeout_secs(mut self, secs: u64) -> Self {
        self.stage_timeout_secs = Some(secs);
        self
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the options on their own, independent of any pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if self.search_result_limit == 0 || self.search_result_limit > MAX_SEARCH_RESULT_LIMIT {
            return Err(ConfigError::SearchLimitOutOfRange {
                limit: self.search_result_limit,
                max: MAX_SEARCH_RESULT_LIMIT,
            });
        }
        if self.max_delegation_depth == 0 {
            return Err(ConfigError::InvalidDelegationDepth);
        }
        if self.stage_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidStageTimeout);
        }
        Ok(())
    }
}
