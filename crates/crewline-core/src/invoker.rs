//! Role capability invocation.
//!
//! [`RoleInvoker`] turns a role plus its stage context into calls against the
//! generation and search collaborators. It runs the search rounds a role's
//! bindings permit and hands back the final text together with any
//! delegation request, leaving the decision to delegate to the executor.

use std::sync::Arc;

use tracing::debug;

use crate::capability::{GenerationRequest, Generator, SearchTool};
use crate::error::{CapabilityError, StageError};
use crate::options::RunOptions;
use crate::prompt;
use crate::result::TraceStep;
use crate::role::Role;

/// Maximum searches a role may issue within one invocation.
pub const MAX_SEARCH_ROUNDS: usize = 4;

/// A request from one role to hand work to a coworker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRequest {
    pub coworker: String,
    pub request: String,
}

/// Parsed action of a single model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Answer(String),
    Search { query: String },
    Delegate(DelegationRequest),
}

/// Outcome of one role invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The answer, or the full response text when it carries a delegation.
    pub text: String,
    pub delegation: Option<DelegationRequest>,
    pub steps: Vec<TraceStep>,
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

/// Parse a response into a [`Directive`].
///
/// Recognises `Final Answer:`, `Action: search` and `Action: delegate`
/// (with `Coworker:`), each followed by `Action Input:`. Anything else is an
/// answer as written.
pub fn parse_directive(text: &str) -> Directive {
    let trimmed = text.trim();
    let lines: Vec<&str> = trimmed.lines().collect();

    let mut action: Option<String> = None;
    let mut coworker: Option<String> = None;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if let Some(rest) = strip_prefix_ci(line, "final answer:") {
            let body = std::iter::once(rest)
                .chain(lines[i + 1..].iter().copied())
                .collect::<Vec<_>>()
                .join("\n");
            return Directive::Answer(body.trim().to_string());
        }
        if let Some(rest) = strip_prefix_ci(line, "action input:") {
            let input = std::iter::once(rest)
                .chain(lines[i + 1..].iter().copied())
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string();
            return match (action.as_deref(), coworker) {
                (Some("search"), _) if !input.is_empty() => Directive::Search { query: input },
                (Some("delegate"), Some(coworker)) if !input.is_empty() => {
                    Directive::Delegate(DelegationRequest {
                        coworker,
                        request: input,
                    })
                }
                _ => Directive::Answer(trimmed.to_string()),
            };
        }
        if let Some(rest) = strip_prefix_ci(line, "action:") {
            action = Some(rest.trim().to_ascii_lowercase());
        } else if let Some(rest) = strip_prefix_ci(line, "coworker:") {
            coworker = Some(rest.trim().to_string());
        }
    }

    Directive::Answer(trimmed.to_string())
}

/// Adapter between roles and the external capabilities.
#[derive(Clone)]
pub struct RoleInvoker {
    generator: Arc<dyn Generator>,
    search: Option<Arc<dyn SearchTool>>,
}

impl RoleInvoker {
    pub fn new(generator: Arc<dyn Generator>, search: Option<Arc<dyn SearchTool>>) -> Self {
        Self { generator, search }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchTool>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Invoke `role` once on `context`.
    ///
    /// `coworkers` are the roles this one may delegate to. Search requests
    /// are served here for roles with a search binding; responses from other
    /// roles that look like search requests are taken as answers. A search
    /// bound outside the run's limit fails with
    /// [`StageError::Configuration`] before anything is generated.
    pub async fn invoke<'a>(
        &self,
        role: &Role,
        coworkers: impl IntoIterator<Item = &'a Role>,
        topic: &str,
        context: &str,
        options: &RunOptions,
    ) -> Result<Invocation, StageError> {
        let system = prompt::persona(role, topic, coworkers);
        let search = match (role.can_search(), self.search.as_ref()) {
            (true, Some(tool)) => Some((tool, role.search_limit(options.search_result_limit)?)),
            _ => None,
        };

        let mut steps = Vec::new();
        let mut observations = String::new();

        for round in 0..=MAX_SEARCH_ROUNDS {
            let mut user = format!("{context}{observations}");
            if search.is_some() && round == MAX_SEARCH_ROUNDS {
                user.push_str(prompt::SEARCH_BUDGET_EXHAUSTED);
            }
            let request = GenerationRequest {
                model: options.model.clone(),
                system: system.clone(),
                user,
            };

            let raw = self.generator.generate(&request).await?;
            if raw.trim().is_empty() {
                return Err(CapabilityError::EmptyOutput.into());
            }
            steps.push(TraceStep::Response {
                role: role.name.clone(),
                text: raw.clone(),
            });

            match (parse_directive(&raw), search) {
                (Directive::Search { query }, Some((tool, limit))) => {
                    if round == MAX_SEARCH_ROUNDS {
                        return Err(CapabilityError::MalformedResponse(format!(
                            "role '{}' kept searching after {} searches",
                            role.name, MAX_SEARCH_ROUNDS
                        ))
                        .into());
                    }
                    debug!(role = %role.name, query = %query, limit = limit, "Running search");
                    let mut hits = tool.search(&query, limit).await?;
                    hits.truncate(limit as usize);
                    steps.push(TraceStep::Search {
                        role: role.name.clone(),
                        query: query.clone(),
                        limit,
                        hits: hits.len(),
                    });
                    observations.push_str(&prompt::search_observation(&query, &hits));
                }
                (Directive::Delegate(delegation), _) => {
                    return Ok(Invocation {
                        text: raw.trim().to_string(),
                        delegation: Some(delegation),
                        steps,
                    });
                }
                (Directive::Answer(text), _) => {
                    if text.is_empty() {
                        return Err(CapabilityError::EmptyOutput.into());
                    }
                    return Ok(Invocation {
                        text,
                        delegation: None,
                        steps,
                    });
                }
                (Directive::Search { .. }, None) => {
                    return Ok(Invocation {
                        text: raw.trim().to_string(),
                        delegation: None,
                        steps,
                    });
                }
            }
        }

        Err(CapabilityError::MalformedResponse(format!(
            "role '{}' produced no final answer",
            role.name
        ))
        .into())
    }
}
