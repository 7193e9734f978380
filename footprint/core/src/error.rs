//! Lookup Errors
//!
//! Every failure a search can end in. All of them are recovered locally: the
//! orchestrator renders them, alerts the host and returns the view to idle.

use std::time::Duration;

use thiserror::Error;

/// How a search settled
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Settlement {
    /// Backend answered with a usable payload
    Success,
    /// HTTP, transport or payload failure
    Error,
    /// The request deadline fired first
    Timeout,
}

/// Errors produced while validating, sending or classifying a search
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The trimmed username was empty
    #[error("Please enter a username.")]
    Validation,

    /// Backend answered with a non-2xx status
    #[error("{message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the body, or synthesized from the status
        message: String,
    },

    /// The request never produced a response
    #[error("Network error: {message}")]
    Network {
        /// Underlying transport failure
        message: String,
    },

    /// The deadline fired and the request was aborted
    #[error("Request timed out after {} s", .after.as_secs())]
    Timeout {
        /// Deadline that was exceeded
        after: Duration,
    },

    /// A 2xx response whose body is not JSON
    #[error("Unexpected response from server: {}", display_excerpt(.body_excerpt, .detail))]
    MalformedPayload {
        /// Parser error
        detail: String,
        /// Leading part of the raw body, if any was readable
        body_excerpt: Option<String>,
    },

    /// A newer search took over the view before this one settled
    #[error("Search superseded by a newer request")]
    Superseded,

    /// The HTTP client could not be constructed
    #[error("HTTP client unavailable: {message}")]
    Client {
        /// Builder error
        message: String,
    },
}

fn display_excerpt<'a>(excerpt: &'a Option<String>, detail: &'a str) -> &'a str {
    match excerpt {
        Some(text) if !text.trim().is_empty() => text,
        _ => detail,
    }
}

impl LookupError {
    /// Map this error to the settled state it produces
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        match self {
            Self::Timeout { .. } => Settlement::Timeout,
            _ => Settlement::Error,
        }
    }

    /// Whether the user can fix this by changing the input
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation)
    }

    /// Text shown in the results area and the host alert
    #[must_use]
    pub fn display_message(&self) -> String {
        self.to_string()
    }

    /// Display message cut to `max_chars` characters for the status log
    #[must_use]
    pub fn summary(&self, max_chars: usize) -> String {
        truncate_chars(&self.display_message(), max_chars)
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with an ellipsis
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

/// `err` followed by every distinct cause in its source chain
///
/// reqwest's `Display` only shows the outermost layer.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        if err.is_builder() {
            return Self::Client { message };
        }
        Self::Network { message }
    }
}
