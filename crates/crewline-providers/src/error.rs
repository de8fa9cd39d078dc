//! Provider setup errors.

/// Failure to configure or construct a provider.
///
/// Errors raised while a provider serves a request are reported as
/// [`crewline_core::CapabilityError`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
