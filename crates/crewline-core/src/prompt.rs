//! Prompt assembly: topic substitution, persona, stage context and the
//! observations appended between invocation rounds.

use std::fmt::Write as _;

use crate::capability::SearchHit;
use crate::result::StageOutput;
use crate::role::Role;
use crate::work_unit::WorkUnit;

/// Placeholder replaced by the run's topic in goals and descriptions.
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

/// Replace every `{topic}` in `template`.
pub fn interpolate(template: &str, topic: &str) -> String {
    template.replace(TOPIC_PLACEHOLDER, topic)
}

/// System prompt for `role`: persona, goal and the actions it may take.
pub fn persona<'a>(
    role: &Role,
    topic: &str,
    coworkers: impl IntoIterator<Item = &'a Role>,
) -> String {
    let mut out = format!(
        "You are {}. {}\nYour personal goal is: {}\n",
        role.name,
        role.backstory,
        role.goal_for(topic)
    );

    let coworkers: Vec<&str> = if role.allow_delegation {
        coworkers.into_iter().map(|r| r.name.as_str()).collect()
    } else {
        Vec::new()
    };

    if !role.can_search() && coworkers.is_empty() {
        out.push_str("\nRespond with your complete final answer.\n");
        return out;
    }

    out.push_str("\nYou may take one action per response, using exactly one of these formats:\n");
    if role.can_search() {
        out.push_str("\nAction: search\nAction Input: <search query>\n");
    }
    if !coworkers.is_empty() {
        let _ = write!(
            out,
            "\nAction: delegate\nCoworker: <one of: {}>\nAction Input: <the complete request, \
             including all context the coworker needs>\n",
            coworkers.join(", ")
        );
    }
    out.push_str(
        "\nWhen you have the final answer, respond with:\n\nFinal Answer: <your complete answer>\n",
    );
    out
}

/// Effective prompt context for `unit`: the instruction with the topic
/// substituted, the acceptance criterion, then every prior stage output
/// verbatim, labelled by the unit and role that produced it.
pub fn task_context(unit: &WorkUnit, topic: &str, prior: &[StageOutput]) -> String {
    let mut out = format!(
        "{}\n\nThis is the expected criteria for your final answer: {}\n\
         You must return the actual complete content as the final answer, not a summary.\n",
        unit.description_for(topic),
        unit.expected_output
    );

    if !prior.is_empty() {
        out.push_str("\nThis is the context you're working with:\n");
        for stage in prior {
            let _ = write!(
                out,
                "\n### Output of work unit `{}` ({})\n{}\n",
                stage.unit, stage.role, stage.output
            );
        }
    }
    out
}

/// Context handed to a coworker when `from` delegates `request` to it.
pub fn delegated_context(from: &Role, request: &str, context: &str) -> String {
    format!(
        "{request}\n\nThis request comes from your coworker {}, \
         who is working on the following task:\n\n{context}",
        from.name
    )
}

/// Append a coworker's answer to the delegating role's context.
pub fn with_coworker_answer(context: &str, coworker: &str, request: &str, answer: &str) -> String {
    format!(
        "{context}\nAction taken: delegated to {coworker}: {request}\nCoworker answer:\n{answer}\n"
    )
}

/// Render search results as an observation block.
pub fn search_observation(query: &str, hits: &[SearchHit]) -> String {
    let mut out = format!("\nAction taken: search \"{query}\"\nObservation:\n");
    if hits.is_empty() {
        out.push_str("No results found.\n");
        return out;
    }
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(out, "{}. {} ({})\n   {}", i + 1, hit.title, hit.source, hit.snippet);
    }
    out
}

/// Appended on the last allowed round so the model stops searching.
pub const SEARCH_BUDGET_EXHAUSTED: &str =
    "\nYou have used all available searches. Respond now with your Final Answer.\n";
