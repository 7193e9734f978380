//! Lookup Backend Traits
//!
//! The orchestrator talks to the remote lookup service only through
//! [`LookupBackend`]. The production implementation is HTTP; tests plug in
//! in-memory backends.
//!
//! # Design Philosophy
//!
//! A backend performs transport and nothing else. It hands back the status
//! line and the raw body text; classifying that into success or a
//! [`LookupError`] is the orchestrator's job, so every backend gets the same
//! error semantics.

use async_trait::async_trait;

use crate::error::LookupError;
use crate::result::SearchQuery;

/// What came back from the lookup service, before classification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase for `status` (may be empty)
    pub reason: String,
    /// Body text, `None` if it could not be read
    pub body: Option<String>,
}

impl RawResponse {
    /// Build a response with a readable body
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: Some(body.into()),
        }
    }

    /// 200 OK with `body`
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, "OK", body)
    }

    /// Drop the body, as if reading it failed
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Status is in the 2xx range
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Lookup backend trait
///
/// Implement this trait to point the orchestrator at a different service.
#[async_trait]
pub trait LookupBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool;

    /// Issue one search request
    ///
    /// Must not apply its own deadline; the orchestrator owns the timeout and
    /// drops this future when it fires.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Network`] when no response was received and
    /// [`LookupError::Client`] when the request could not be built.
    async fn fetch(&self, query: &SearchQuery) -> Result<RawResponse, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(RawResponse::ok("{}").is_success());
        assert!(RawResponse::new(204, "No Content", "").is_success());
        assert!(!RawResponse::new(301, "Moved Permanently", "").is_success());
        assert!(!RawResponse::new(404, "Not Found", "").is_success());
        assert!(!RawResponse::new(500, "Internal Server Error", "").is_success());
    }

    #[test]
    fn test_without_body() {
        let raw = RawResponse::new(502, "Bad Gateway", "oops").without_body();
        assert_eq!(raw.body, None);
        assert_eq!(raw.status, 502);
    }
}
