//! Worker vocabulary: `Role` and its typed `ToolBinding`s.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::options::MAX_SEARCH_RESULT_LIMIT;
use crate::prompt::interpolate;

/// An external capability a role may invoke while working on a unit.
///
/// Bindings are fixed when the role is built; nothing is attached at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolBinding {
    /// Web search. `max_results` narrows the run-wide result bound for this
    /// role; it may never exceed it.
    Search {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_results: Option<u32>,
    },
}

impl ToolBinding {
    /// Search bound by the run-wide result limit.
    pub fn search() -> Self {
        ToolBinding::Search { max_results: None }
    }

    /// Search with a role-specific result bound.
    pub fn search_with_limit(max_results: u32) -> Self {
        ToolBinding::Search {
            max_results: Some(max_results),
        }
    }
}

impl std::fmt::Display for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolBinding::Search { max_results: None } => write!(f, "search"),
            ToolBinding::Search {
                max_results: Some(n),
            } => write!(f, "search(max {n})"),
        }
    }
}

/// An autonomous worker definition.
///
/// Once handed to a [`Pipeline`](crate::pipeline::Pipeline) a role is only
/// reachable through shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Identity, unique within a pipeline.
    pub name: String,
    /// Goal statement; `{topic}` is replaced by the run's topic.
    pub goal: String,
    /// Static persona context.
    pub backstory: String,
    /// Whether this role may hand part of its work to a coworker.
    #[serde(default)]
    pub allow_delegation: bool,
    #[serde(default)]
    pub tools: Vec<ToolBinding>,
    /// Capture intermediate steps in the stage trace.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

fn default_verbose() -> bool {
    true
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            allow_delegation: false,
            tools: Vec::new(),
            verbose: true,
        }
    }

    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn with_tool(mut self, tool: ToolBinding) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The goal with the run's topic substituted.
    pub fn goal_for(&self, topic: &str) -> String {
        interpolate(&self.goal, topic)
    }

    /// The role's own search bound, if it binds search at all.
    ///
    /// Returns `Some(None)` for a search binding without its own limit.
    pub fn search_binding(&self) -> Option<Option<u32>> {
        self.tools.iter().find_map(|tool| match tool {
            ToolBinding::Search { max_results } => Some(*max_results),
        })
    }

    pub fn can_search(&self) -> bool {
        self.search_binding().is_some()
    }

    /// Effective number of results for one search by this role.
    ///
    /// The role's own bound is used as given; a bound of zero or one above
    /// `run_limit` is an error, never clamped.
    pub fn search_limit(&self, run_limit: u32) -> Result<u32, ConfigError> {
        if run_limit == 0 || run_limit > MAX_SEARCH_RESULT_LIMIT {
            return Err(ConfigError::SearchLimitOutOfRange {
                limit: run_limit,
                max: MAX_SEARCH_RESULT_LIMIT,
            });
        }
        match self.search_binding() {
            Some(Some(own)) if own == 0 || own > run_limit => {
                Err(ConfigError::RoleSearchLimitExceeded {
                    role: self.name.clone(),
                    requested: own,
                    limit: run_limit,
                })
            }
            Some(Some(own)) => Ok(own),
            _ => Ok(run_limit),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
