//! Shared HTTP plumbing: client construction and error mapping.

use std::time::Duration;

use crewline_core::CapabilityError;

use crate::error::Result;

/// Longest provider error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("crewline/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Map a non-success HTTP status and its body to a capability error.
pub(crate) fn status_error(status: u16, body: &str) -> CapabilityError {
    let message = format!("HTTP {status}: {}", api_message(body));
    match status {
        401 | 403 => CapabilityError::Unauthorized(message),
        429 => CapabilityError::QuotaExceeded(message),
        500..=599 => CapabilityError::ProviderUnavailable(message),
        _ => CapabilityError::MalformedResponse(message),
    }
}

/// Map a transport failure to a capability error.
pub(crate) fn transport_error(err: &reqwest::Error, timeout_secs: u64) -> CapabilityError {
    if err.is_timeout() {
        CapabilityError::Timeout { secs: timeout_secs }
    } else if err.is_decode() {
        CapabilityError::MalformedResponse(err.to_string())
    } else {
        CapabilityError::ProviderUnavailable(err.to_string())
    }
}

/// The `error.message` of a JSON error body, or the body itself, shortened.
fn api_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            let error = json.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        return "no response body".to_string();
    }
    match message.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message,
    }
}
