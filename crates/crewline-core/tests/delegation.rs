//! Delegation between roles during a stage.

use std::sync::Arc;

use crewline_core::fakes::ScriptedGenerator;
use crewline_core::{Pipeline, PipelineExecutor, Role, RunOptions, RunStatus, TraceStep, WorkUnit};

fn delegate_to(coworker: &str, request: &str) -> String {
    format!("Thought: I need help\nAction: delegate\nCoworker: {coworker}\nAction Input: {request}")
}

fn lead_and_helper() -> Pipeline {
    Pipeline::new(
        vec![
            Role::new("Lead", "Lead work on {topic}", "Organised.").with_delegation(true),
            Role::new("Helper", "Assist with {topic}", "Diligent."),
        ],
        vec![WorkUnit::new("lead", "Produce a report on {topic}", "A report", "Lead")],
    )
    .unwrap()
}

fn ping_pong() -> Pipeline {
    Pipeline::new(
        vec![
            Role::new("A", "Goal A", "Backstory A.").with_delegation(true),
            Role::new("B", "Goal B", "Backstory B.").with_delegation(true),
        ],
        vec![WorkUnit::new("work", "Do {topic}", "Result", "A")],
    )
    .unwrap()
}

fn ping_pong_generator() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .respond_to("A", vec![delegate_to("B", "please handle it"); 5])
        .respond_to("B", vec![delegate_to("A", "no, you handle it"); 5])
}

#[tokio::test]
async fn test_delegation_round_trip() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_to(
                "Lead",
                [
                    delegate_to("Helper", "Summarise the latest statistics"),
                    "Final Answer: REPORT built on HELPER-ANSWER".to_string(),
                ],
            )
            .respond_to("Helper", ["HELPER-ANSWER"]),
    );
    let executor = PipelineExecutor::new(generator.clone());

    let result = executor
        .run(&lead_and_helper(), "AI", &RunOptions::default())
        .await
        .unwrap();

    assert!(result.is_completed());
    assert_eq!(result.final_output, "REPORT built on HELPER-ANSWER");

    let calls = generator.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[1].system.starts_with("You are Helper."));
    assert!(calls[1].user.starts_with("Summarise the latest statistics"));
    assert!(calls[1].user.contains("Produce a report on AI"));
    assert!(calls[2].user.contains("HELPER-ANSWER"));

    let steps = &result.stage_outputs[0].steps;
    assert!(steps.iter().any(|s| matches!(
        s,
        TraceStep::Delegation { from, to, depth: 1, .. } if from == "Lead" && to == "Helper"
    )));
}

#[tokio::test]
async fn test_only_delegating_roles_see_the_roster() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_to("Lead", [delegate_to("Helper", "help"), "Final Answer: done".to_string()])
            .respond_to("Helper", ["helped"]),
    );
    PipelineExecutor::new(generator.clone())
        .run(&lead_and_helper(), "AI", &RunOptions::default())
        .await
        .unwrap();

    let calls = generator.calls();
    assert!(calls[0].system.contains("Coworker: <one of: Helper>"));
    assert!(!calls[1].system.contains("Action: delegate"));
}

#[tokio::test]
async fn test_nested_delegation_beyond_ceiling_fails() {
    let generator = Arc::new(ping_pong_generator());
    let executor = PipelineExecutor::new(generator.clone());

    let result = executor
        .run(&ping_pong(), "AI", &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(
        result.status,
        RunStatus::Failed {
            unit: "work".to_string(),
            reason: "delegation chain from role 'B' exceeded the ceiling of 3".to_string(),
        }
    );
    assert!(result.stage_outputs.is_empty());
    assert_eq!(generator.calls().len(), 4);
}

#[tokio::test]
async fn test_delegation_ceiling_is_configurable() {
    let generator = Arc::new(ping_pong_generator());
    let executor = PipelineExecutor::new(generator.clone());

    let result = executor
        .run(
            &ping_pong(),
            "AI",
            &RunOptions::default().with_max_delegation_depth(1),
        )
        .await
        .unwrap();

    assert!(matches!(
        result.status,
        RunStatus::Failed { ref reason, .. } if reason.contains("ceiling of 1")
    ));
    assert_eq!(generator.calls().len(), 2);
}

#[tokio::test]
async fn test_repeated_delegation_rounds_are_bounded() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond_to("Lead", vec![delegate_to("Helper", "again"); 5])
            .respond_to("Helper", vec!["partial"; 5]),
    );
    let executor = PipelineExecutor::new(generator.clone());

    let result = executor
        .run(&lead_and_helper(), "AI", &RunOptions::default())
        .await
        .unwrap();

    assert!(matches!(
        result.status,
        RunStatus::Failed { ref reason, .. } if reason.contains("role 'Lead'")
    ));
    assert_eq!(generator.calls_matching("Helper"), 3);
    assert_eq!(generator.calls_matching("Lead"), 4);
}

#[tokio::test]
async fn test_unknown_coworker_fails_the_stage() {
    let generator =
        Arc::new(ScriptedGenerator::new().respond_to("Lead", [delegate_to("Ghost", "help")]));

    let result = PipelineExecutor::new(generator)
        .run(&lead_and_helper(), "AI", &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(
        result.status,
        RunStatus::Failed {
            unit: "lead".to_string(),
            reason: "role 'Lead' delegated to unknown coworker 'Ghost'".to_string(),
        }
    );
}

#[tokio::test]
async fn test_self_delegation_is_rejected() {
    let generator =
        Arc::new(ScriptedGenerator::new().respond_to("Lead", [delegate_to("Lead", "help")]));

    let result = PipelineExecutor::new(generator)
        .run(&lead_and_helper(), "AI", &RunOptions::default())
        .await
        .unwrap();

    assert!(matches!(
        result.status,
        RunStatus::Failed { ref reason, .. } if reason.contains("unknown coworker 'Lead'")
    ));
}

#[tokio::test]
async fn test_role_without_delegation_never_recurses() {
    let pipeline = Pipeline::new(
        vec![
            Role::new("Lead", "Lead", "Organised.").with_delegation(true),
            Role::new("Helper", "Assist", "Diligent."),
        ],
        vec![WorkUnit::new("assist", "Assist with {topic}", "Notes", "Helper")],
    )
    .unwrap();
    let reply = delegate_to("Lead", "do it for me");
    let generator = Arc::new(ScriptedGenerator::new().respond_to("Helper", [reply.clone()]));
    let executor = PipelineExecutor::new(generator.clone());

    let result = executor
        .run(&pipeline, "AI", &RunOptions::default())
        .await
        .unwrap();

    assert!(result.is_completed());
    assert_eq!(result.final_output, reply);
    assert_eq!(generator.calls_matching("Lead"), 0);
}

#[tokio::test]
async fn test_trace_follows_the_stage_role_verbosity() {
    let replies = || {
        ScriptedGenerator::new()
            .respond_to("Lead", [delegate_to("Helper", "help"), "Final Answer: done".to_string()])
            .respond_to("Helper", ["helped"])
    };
    let pipeline = |lead_verbose: bool, helper_verbose: bool| {
        Pipeline::new(
            vec![
                Role::new("Lead", "Lead", "Organised.")
                    .with_delegation(true)
                    .with_verbose(lead_verbose),
                Role::new("Helper", "Assist", "Diligent.").with_verbose(helper_verbose),
            ],
            vec![WorkUnit::new("lead", "Report on {topic}", "A report", "Lead")],
        )
        .unwrap()
    };

    let quiet_owner = PipelineExecutor::new(Arc::new(replies()))
        .run(&pipeline(false, true), "AI", &RunOptions::default())
        .await
        .unwrap();
    assert!(quiet_owner.is_completed());
    assert!(quiet_owner.stage_outputs[0].steps.is_empty());

    let verbose_owner = PipelineExecutor::new(Arc::new(replies()))
        .run(&pipeline(true, false), "AI", &RunOptions::default())
        .await
        .unwrap();
    let steps = &verbose_owner.stage_outputs[0].steps;
    assert!(steps.iter().any(|s| matches!(
        s,
        TraceStep::Response { role, .. } if role == "Helper"
    )));
    assert!(steps.iter().any(|s| matches!(s, TraceStep::Delegation { .. })));
}
