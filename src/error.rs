//! ==============================================================================
//! error.rs - client failure taxonomy
//! ==============================================================================
//!
//! purpose:
//!     one classified error per HTTP failure class, so callers (and the UI
//!     layer above them) can react differently to "server said no" versus
//!     "server never answered".
//!
//! relationships:
//!     - produced by: client.rs (classify_status / dispatch path)
//!     - consumed by: main.rs and any embedding application
//!
//! ==============================================================================

use serde_json::Value;

/// Errors surfaced by [`crate::SessionClient`] operations.
///
/// `NetworkUnreachable` means no HTTP response was received at all, which is
/// the signal for "check the configured URL". Everything else carries the
/// status class the server answered with, plus its message when one was
/// present in the body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("authentication failed{}", fmt_detail(.0))]
    AuthenticationFailed(Option<String>),

    /// 409 - registration only ("username taken")
    #[error("conflict{}", fmt_detail(.0))]
    Conflict(Option<String>),

    /// 400 - the server rejected the request payload
    #[error("invalid input{}", fmt_detail(.0))]
    InvalidInput(Option<String>),

    /// 5xx or any unrecognized status
    #[error("server error (status {status}){}", fmt_detail(.message))]
    ServerError {
        status: u16,
        message: Option<String>,
    },

    /// 2xx response whose body did not parse as the expected type
    #[error("malformed response body: {0}")]
    Decode(String),
}

fn fmt_detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}

impl ApiError {
    /// Server-supplied human-readable message, when one was present.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::AuthenticationFailed(m)
            | ApiError::Conflict(m)
            | ApiError::InvalidInput(m) => m.as_deref(),
            ApiError::ServerError { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend is not consistent here: 409 arrives as a plain-text body,
/// generic errors as `{"message": ...}`, and 400 validation failures as a
/// JSON array of `{field, message}` entries. Empty bodies yield `None`.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) => Some(s),
        Ok(Value::Object(map)) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        Ok(Value::Array(entries)) => {
            let joined: Vec<String> = entries
                .iter()
                .filter_map(|e| {
                    let field = e.get("field").and_then(|v| v.as_str());
                    let message = e.get("message").and_then(|v| v.as_str())?;
                    Some(match field {
                        Some(f) => format!("{}: {}", f, message),
                        None => message.to_string(),
                    })
                })
                .collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join("; "))
            }
        }
        _ => Some(trimmed.to_string()),
    }
}
