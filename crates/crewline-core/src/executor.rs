//! Sequential pipeline execution.
//!
//! [`PipelineExecutor`] runs a pipeline's work units strictly in declared
//! order. Each stage sees the verbatim output of every stage before it. The
//! first stage failure ends the run with [`RunStatus::Failed`]; structural
//! problems are returned as `Err` before anything is invoked.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::capability::{Generator, SearchTool};
use crate::error::{ConfigError, Result, SequencingError, StageError};
use crate::invoker::RoleInvoker;
use crate::observer::{
    emit_run_finished, emit_run_started, emit_stage_completed, emit_stage_failed,
    emit_stage_started, NoopObserver, ProgressObserver,
};
use crate::options::RunOptions;
use crate::pipeline::Pipeline;
use crate::prompt;
use crate::result::{single_line, ExecutionResult, RunStatus, StageOutput, TraceStep};
use crate::role::Role;
use crate::work_unit::WorkUnit;

/// Executes pipelines against a fixed set of collaborators.
///
/// An executor holds no per-run state, so one instance may serve any number
/// of concurrent runs.
#[derive(Clone)]
pub struct PipelineExecutor {
    invoker: RoleInvoker,
    observer: Arc<dyn ProgressObserver>,
}

impl PipelineExecutor {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            invoker: RoleInvoker::new(generator, None),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Provide the search capability used by roles with a search binding.
    pub fn with_search(mut self, search: Arc<dyn SearchTool>) -> Self {
        self.invoker = self.invoker.with_search(search);
        self
    }

    /// Receive progress messages while `verbose` is set on a run.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run `pipeline` on `topic`.
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        topic: &str,
        options: &RunOptions,
    ) -> Result<ExecutionResult> {
        self.run_with_cancel(pipeline, topic, options, &CancelSignal::never())
            .await
    }

    /// Run `pipeline` on `topic`, checking `cancel` before every work unit.
    #[instrument(
        skip_all,
        fields(topic = %topic.trim(), units = pipeline.len(), run_id = tracing::field::Empty)
    )]
    pub async fn run_with_cancel(
        &self,
        pipeline: &Pipeline,
        topic: &str,
        options: &RunOptions,
        cancel: &CancelSignal,
    ) -> Result<ExecutionResult> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ConfigError::EmptyTopic.into());
        }
        options.validate()?;
        pipeline.check_capabilities(options, self.invoker.has_search())?;
        let bindings = resolve_bindings(pipeline)?;

        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();
        tracing::Span::current().record("run_id", run_id_str.as_str());

        let start = Instant::now();
        let total = bindings.len();
        emit_run_started(&run_id_str, topic, total, &options.model);
        self.notify(
            options,
            format!(
                "Starting run on \"{topic}\": {total} work unit(s), model {}",
                options.model
            ),
        );

        let mut stages: Vec<StageOutput> = Vec::with_capacity(total);
        let mut status = RunStatus::Completed;

        for (position, (unit, role)) in bindings.into_iter().enumerate() {
            if cancel.is_cancelled() {
                info!(unit = %unit.name, "Run cancelled before work unit");
                self.notify(
                    options,
                    format!("Run cancelled before work unit '{}'", unit.name),
                );
                status = RunStatus::Cancelled {
                    before_unit: unit.name.clone(),
                };
                break;
            }

            emit_stage_started(position, &unit.name, &role.name);
            self.notify(
                options,
                format!(
                    "[{}/{}] Work unit '{}' assigned to {}",
                    position + 1,
                    total,
                    unit.name,
                    role.name
                ),
            );

            let context = prompt::task_context(unit, topic, &stages);
            self.notify(
                options,
                format!(
                    "Prompt for '{}' built from {} prior output(s), {} chars",
                    unit.name,
                    stages.len(),
                    context.len()
                ),
            );

            let started_at = Utc::now();
            let stage_start = Instant::now();
            let mut steps = Vec::new();
            let trace = role.verbose.then_some(&mut steps);
            let work = self.resolve(pipeline, role, topic, context, options, 0, trace);
            let outcome = match options.stage_timeout() {
                Some(limit) => tokio::time::timeout(limit, work)
                    .await
                    .unwrap_or(Err(StageError::Timeout {
                        secs: limit.as_secs(),
                    })),
                None => work.await,
            };

            match outcome {
                Ok(output) => {
                    let duration_ms = stage_start.elapsed().as_millis() as u64;
                    emit_stage_completed(&unit.name, duration_ms, output.len());
                    self.notify(
                        options,
                        format!(
                            "Work unit '{}' completed by {} in {} ms",
                            unit.name, role.name, duration_ms
                        ),
                    );
                    stages.push(StageOutput {
                        unit: unit.name.clone(),
                        role: role.name.clone(),
                        output,
                        steps,
                        started_at,
                        duration_ms,
                    });
                }
                Err(err) => {
                    let reason = single_line(&err.to_string());
                    emit_stage_failed(&unit.name, &reason);
                    self.notify(
                        options,
                        format!("Work unit '{}' failed: {}", unit.name, reason),
                    );
                    status = RunStatus::Failed {
                        unit: unit.name.clone(),
                        reason,
                    };
                    break;
                }
            }
        }

        let final_output = match status {
            RunStatus::Completed => stages
                .last()
                .map(|s| s.output.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let success = matches!(status, RunStatus::Completed);
        emit_run_finished(&run_id_str, duration_ms, stages.len(), success);
        if success {
            self.notify(options, format!("Run completed in {duration_ms} ms"));
        }

        Ok(ExecutionResult {
            run_id,
            topic: topic.to_string(),
            final_output,
            stage_outputs: stages,
            status,
            duration_ms,
        })
    }

    /// Produce `role`'s final text for `context`, following delegations.
    ///
    /// `depth` is the number of delegations above this call. A role may
    /// delegate while `depth < max_delegation_depth`, at most
    /// `max_delegation_depth` times per call.
    ///
    /// `trace` is set only when the stage's own role is verbose; coworkers
    /// record into it regardless of their own flag.
    #[allow(clippy::too_many_arguments)]
    fn resolve<'a>(
        &'a self,
        pipeline: &'a Pipeline,
        role: &'a Role,
        topic: &'a str,
        context: String,
        options: &'a RunOptions,
        depth: usize,
        trace: Option<&'a mut Vec<TraceStep>>,
    ) -> BoxFuture<'a, std::result::Result<String, StageError>> {
        async move {
            let mut context = context;
            let mut trace = trace;
            let mut rounds = 0usize;

            loop {
                let invocation = self
                    .invoker
                    .invoke(
                        role,
                        pipeline.coworkers_of(&role.name),
                        topic,
                        &context,
                        options,
                    )
                    .await?;

                for step in &invocation.steps {
                    if let TraceStep::Search { query, hits, .. } = step {
                        self.notify(
                            options,
                            format!("{} searched \"{}\" ({} result(s))", role.name, query, hits),
                        );
                    }
                }
                if let Some(steps) = trace.as_deref_mut() {
                    steps.extend(invocation.steps);
                }

                let Some(delegation) = invocation.delegation else {
                    return Ok(invocation.text);
                };
                if !role.allow_delegation {
                    debug!(
                        role = %role.name,
                        coworker = %delegation.coworker,
                        "Delegation disabled for role, using response as output"
                    );
                    return Ok(invocation.text);
                }
                if depth >= options.max_delegation_depth || rounds >= options.max_delegation_depth {
                    return Err(StageError::DelegationLoop {
                        role: role.name.clone(),
                        ceiling: options.max_delegation_depth,
                    });
                }

                let coworker = pipeline
                    .role(&delegation.coworker)
                    .filter(|c| c.name != role.name)
                    .ok_or_else(|| StageError::UnknownCoworker {
                        role: role.name.clone(),
                        coworker: delegation.coworker.clone(),
                    })?;

                info!(from = %role.name, to = %coworker.name, depth = depth + 1, "Delegating work");
                self.notify(
                    options,
                    format!(
                        "{} delegated to {}: {}",
                        role.name,
                        coworker.name,
                        delegation.request.lines().next().unwrap_or_default()
                    ),
                );

                let derived = prompt::delegated_context(role, &delegation.request, &context);
                let answer = self
                    .resolve(
                        pipeline,
                        coworker,
                        topic,
                        derived,
                        options,
                        depth + 1,
                        trace.as_deref_mut(),
                    )
                    .await?;

                if let Some(steps) = trace.as_deref_mut() {
                    steps.push(TraceStep::Delegation {
                        from: role.name.clone(),
                        to: coworker.name.clone(),
                        request: delegation.request.clone(),
                        answer: answer.clone(),
                        depth: depth + 1,
                    });
                }
                context = prompt::with_coworker_answer(
                    &context,
                    &coworker.name,
                    &delegation.request,
                    &answer,
                );
                rounds += 1;
            }
        }
        .boxed()
    }

    fn notify(&self, options: &RunOptions, message: impl AsRef<str>) {
        if options.verbose {
            self.observer.on_progress(message.as_ref());
        }
    }
}

/// Pair every unit with its role, in sequence order.
fn resolve_bindings(
    pipeline: &Pipeline,
) -> std::result::Result<Vec<(&WorkUnit, &Role)>, SequencingError> {
    pipeline
        .units()
        .iter()
        .map(|unit| {
            pipeline
                .role(&unit.role)
                .map(|role| (unit, role))
                .ok_or_else(|| SequencingError::UnknownRole {
                    unit: unit.name.clone(),
                    role: unit.role.clone(),
                })
        })
        .collect()
}
