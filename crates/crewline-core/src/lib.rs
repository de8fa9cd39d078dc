//! crewline core: roles, work units and sequential pipeline execution.
//!
//! A [`Pipeline`] binds each [`WorkUnit`] to one [`Role`]. The
//! [`PipelineExecutor`] runs the units in declared order, feeding every prior
//! output into the next stage's prompt, and returns an [`ExecutionResult`]
//! holding the final text and the per-stage trace.
//!
//! Language-model generation and web search are reached through the
//! [`Generator`] and [`SearchTool`] traits; concrete providers live outside
//! this crate.

pub mod blueprint;
pub mod cancel;
pub mod capability;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod invoker;
pub mod observer;
pub mod options;
pub mod pipeline;
pub mod prompt;
pub mod result;
pub mod role;
pub mod telemetry;
pub mod work_unit;

pub use cancel::{CancelSignal, Canceller};
pub use capability::{GenerationRequest, Generator, SearchHit, SearchTool};
pub use error::{
    CapabilityError, ConfigError, PipelineError, Result, SequencingError, StageError,
};
pub use executor::PipelineExecutor;
pub use invoker::{DelegationRequest, Directive, Invocation, RoleInvoker, MAX_SEARCH_ROUNDS};
pub use observer::{NoopObserver, ProgressObserver};
pub use options::{
    RunOptions, DEFAULT_MAX_DELEGATION_DEPTH, DEFAULT_MODEL, DEFAULT_SEARCH_RESULT_LIMIT,
    MAX_SEARCH_RESULT_LIMIT,
};
pub use pipeline::{Pipeline, PipelineDefinition, PlannedStep};
pub use result::{ExecutionResult, RunStatus, StageOutput, TraceStep};
pub use role::{Role, ToolBinding};
pub use work_unit::WorkUnit;

/// crewline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
