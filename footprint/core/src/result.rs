//! Search Query and Result Model
//!
//! The data contract with the lookup backend. The backend makes no promises
//! about field shapes, so [`SearchResult`] is built from any JSON value: every
//! field is optional, arrays keep only their string elements, and anything
//! with the wrong shape falls back to its default.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LookupError;

/// A validated username: trimmed and never empty
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Trim `raw` and reject it if nothing is left
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Validation`] for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::Validation);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The username as sent to the backend
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed backend response
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct SearchResult {
    /// Echoed username
    pub username: Option<String>,
    /// Sites the username was found on, in backend order
    pub found_on: Vec<String>,
    /// Human-readable breach descriptions, in backend order
    pub breaches: Vec<String>,
    /// How many sources the backend checked, when reported
    pub total_sites_checked: Option<u64>,
    /// Backend error or annotation
    pub error: Option<String>,
}

impl From<Value> for SearchResult {
    fn from(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        Self {
            username: string_field(map.get("username")),
            found_on: string_list(map.get("found_on")),
            breaches: string_list(map.get("breaches")),
            total_sites_checked: map.get("total_sites_checked").and_then(Value::as_u64),
            error: string_field(map.get("error")).filter(|e| !e.is_empty()),
        }
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Overall verdict shown at the bottom of the summary
///
/// Only produced when no breaches were found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// No leaks, but profiles exist
    CleanFootprintLimited,
    /// No leaks and no profiles
    FullyClean,
}

impl Verdict {
    /// Human-readable verdict line
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::CleanFootprintLimited => "Clean, footprint limited",
            Self::FullyClean => "Fully clean",
        }
    }

    /// Longer explanation for the verdict
    #[must_use]
    pub fn detail(&self) -> &'static str {
        match self {
            Self::CleanFootprintLimited => {
                "No leaks found, but public profiles exist for this username."
            }
            Self::FullyClean => "No profiles and no leaks found. All clear!",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl SearchResult {
    /// Parse a response body
    ///
    /// # Errors
    ///
    /// Fails only when `body` is not JSON at all. Any JSON value is accepted.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(body).map(Self::from)
    }

    /// An error with nothing else to show
    #[must_use]
    pub fn has_hard_error(&self) -> bool {
        self.error.is_some() && !self.has_profiles() && !self.has_breaches()
    }

    /// An error reported alongside real data
    #[must_use]
    pub fn soft_error(&self) -> Option<&str> {
        if self.has_hard_error() {
            return None;
        }
        self.error.as_deref()
    }

    /// At least one site matched
    #[must_use]
    pub fn has_profiles(&self) -> bool {
        !self.found_on.is_empty()
    }

    /// At least one leak matched
    #[must_use]
    pub fn has_breaches(&self) -> bool {
        !self.breaches.is_empty()
    }

    /// Reported source count; zero counts as unknown
    #[must_use]
    pub fn sites_checked(&self) -> Option<u64> {
        self.total_sites_checked.filter(|&n| n > 0)
    }

    /// Verdict line, absent whenever breaches exist
    #[must_use]
    pub fn verdict(&self) -> Option<Verdict> {
        if self.has_breaches() {
            None
        } else if self.has_profiles() {
            Some(Verdict::CleanFootprintLimited)
        } else {
            Some(Verdict::FullyClean)
        }
    }
}
