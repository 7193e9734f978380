//! Progress Narration
//!
//! Cosmetic status messages shown while a lookup request is in flight. Each
//! step fires at a fixed offset from the moment the request starts. The
//! schedule never gates the request; the orchestrator aborts the narration
//! task as soon as the search settles.

use std::time::Duration;

use tokio::time::Instant;

use crate::result::SearchQuery;

/// One scheduled message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrationStep {
    /// Delay from request start
    pub offset: Duration,
    /// Status line text
    pub text: String,
}

/// Ordered schedule of progress messages
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Narration {
    steps: Vec<NarrationStep>,
}

impl Narration {
    /// The schedule used for every search
    #[must_use]
    pub fn standard(query: &SearchQuery) -> Self {
        let at = |ms: u64, text: String| NarrationStep {
            offset: Duration::from_millis(ms),
            text,
        };
        Self {
            steps: vec![
                at(0, "Connecting to lookup service...".to_string()),
                at(300, format!("Request sent for \"{query}\"")),
                at(1_500, "Scanning social networks...".to_string()),
                at(4_000, "Checking leak databases...".to_string()),
                at(8_000, "Cross-referencing sources...".to_string()),
                at(15_000, "Aggregating results...".to_string()),
            ],
        }
    }

    /// Build a schedule from explicit steps
    ///
    /// Steps are sorted by offset; equal offsets keep their order.
    #[must_use]
    pub fn from_steps(mut steps: Vec<NarrationStep>) -> Self {
        steps.sort_by_key(|s| s.offset);
        Self { steps }
    }

    /// Scheduled steps in firing order
    #[must_use]
    pub fn steps(&self) -> &[NarrationStep] {
        &self.steps
    }

    /// Emit every step at its offset from now
    ///
    /// Offsets are measured from the call, not from the previous step, so a
    /// slow `emit` does not push later steps back.
    pub async fn play<F>(self, mut emit: F)
    where
        F: FnMut(&str),
    {
        let start = Instant::now();
        for step in self.steps {
            tokio::time::sleep_until(start + step.offset).await;
            emit(&step.text);
        }
    }
}
