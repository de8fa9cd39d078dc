//! HTTP providers for crewline's generation and search capabilities.
//!
//! - [`OpenAiGenerator`]: any OpenAI-compatible chat-completions endpoint.
//! - [`SerperSearch`]: Google results through the Serper API.
//!
//! Both are configured from a [`ProviderConfig`], usually read once with
//! [`ProviderConfig::from_env`].

pub mod config;
pub mod error;
mod http;
pub mod openai;
pub mod serper;

pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use openai::OpenAiGenerator;
pub use serper::SerperSearch;
