//! Error taxonomy for pipeline construction and execution.
//!
//! Structural errors ([`ConfigError`], [`SequencingError`]) are returned as
//! `Err` before any stage runs. Runtime errors ([`CapabilityError`],
//! [`StageError`]) never escape a run; they end it with
//! [`RunStatus::Failed`](crate::result::RunStatus::Failed).

/// Invalid run options or capability wiring, detected before execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("model identifier must not be empty")]
    EmptyModel,

    #[error("search result limit {limit} is outside the allowed range 1..={max}")]
    SearchLimitOutOfRange { limit: u32, max: u32 },

    #[error("role '{role}' requests {requested} search results but the run allows at most {limit}")]
    RoleSearchLimitExceeded {
        role: String,
        requested: u32,
        limit: u32,
    },

    #[error("role '{role}' binds a search tool but no search capability was provided")]
    MissingSearchCapability { role: String },

    #[error("delegation depth ceiling must be at least 1")]
    InvalidDelegationDepth,

    #[error("stage timeout must be at least one second")]
    InvalidStageTimeout,
}

/// A pipeline whose structure cannot be executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencingError {
    #[error("pipeline has no work units")]
    EmptyPipeline,

    #[error("role '{0}' is defined more than once")]
    DuplicateRole(String),

    #[error("work unit '{0}' is defined more than once")]
    DuplicateUnit(String),

    #[error("work unit '{unit}' references unknown role '{role}'")]
    UnknownRole { unit: String, role: String },
}

/// Failure reported by an external generation or search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("capability quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("capability returned an empty output")]
    EmptyOutput,
}

/// Why a single stage could not produce an output.
///
/// The `Display` form is the single-line reason stored in the run status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("{0}")]
    Capability(#[from] CapabilityError),

    /// Capability wiring rejected when the role was invoked.
    #[error("{0}")]
    Configuration(#[from] ConfigError),

    #[error("delegation chain from role '{role}' exceeded the ceiling of {ceiling}")]
    DelegationLoop { role: String, ceiling: usize },

    #[error("role '{role}' delegated to unknown coworker '{coworker}'")]
    UnknownCoworker { role: String, coworker: String },

    #[error("stage timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Structural errors that prevent a run from starting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("sequencing error: {0}")]
    Sequencing(#[from] SequencingError),
}

/// Result type for pipeline construction and run entry points.
pub type Result<T> = std::result::Result<T, PipelineError>;
