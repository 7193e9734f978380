//! Request Orchestrator
//!
//! Owns the lifecycle of one search:
//!
//! ```text
//! Idle -> Validating -> InFlight -> Settled(Success | Error | Timeout) -> Idle
//!            |
//!            +-> Idle (empty query, no request)
//! ```
//!
//! On entry to `InFlight` the previous result and status log are torn down,
//! the loading indicator is shown, the submit control is disabled and the
//! narration task starts. The request races the configured deadline and,
//! under [`OverlapPolicy::CancelPrevious`], a cancel signal from a newer
//! search. Whatever the outcome, the `ViewRelease` guard hides the loader
//! and re-enables submit exactly once.
//!
//! # Ownership of the view
//!
//! Every accepted search takes a generation number. Only the search whose
//! generation is current may write to the view sink; a superseded search
//! settles quietly and its guard leaves the view alone.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::backend::{LookupBackend, RawResponse};
use crate::config::{LookupConfig, OverlapPolicy};
use crate::error::{truncate_chars, LookupError, Settlement};
use crate::narration::Narration;
use crate::render::{render_failure, render_result, ResultView, SectionKind};
use crate::result::{SearchQuery, SearchResult};
use crate::status::StatusReporter;
use crate::view::ViewSink;

/// Longest body excerpt carried by [`LookupError::MalformedPayload`]
const BODY_EXCERPT_CHARS: usize = 200;

/// Unique identifier of an accepted search
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchId(Uuid);

impl SearchId {
    /// Generate a new random id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SearchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SearchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of the orchestrator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    /// Waiting for input
    Idle,
    /// Checking the submitted username
    Validating,
    /// Request sent, waiting for settlement
    InFlight,
    /// Request settled; the view is about to return to idle
    Settled(Settlement),
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::InFlight => write!(f, "in-flight"),
            Self::Settled(Settlement::Success) => write!(f, "settled-success"),
            Self::Settled(Settlement::Error) => write!(f, "settled-error"),
            Self::Settled(Settlement::Timeout) => write!(f, "settled-timeout"),
        }
    }
}

/// Outcome of a successful search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchReport {
    /// Search identifier
    pub id: SearchId,
    /// Username that was looked up
    pub query: SearchQuery,
    /// Parsed backend payload
    pub result: SearchResult,
    /// View that was shown
    pub view: ResultView,
    /// Time from request start to settlement
    pub elapsed: Duration,
}

/// Bookkeeping for the search that currently holds the request slot
struct ActiveSearch {
    generation: u64,
    cancel: oneshot::Sender<()>,
    narration: Option<JoinHandle<()>>,
}

/// Drives searches against a [`LookupBackend`] and writes to a [`ViewSink`]
pub struct SearchOrchestrator<B: LookupBackend> {
    backend: B,
    sink: Arc<dyn ViewSink>,
    status: Arc<StatusReporter>,
    config: LookupConfig,
    generation: Arc<AtomicU64>,
    state: Mutex<SearchState>,
    active: Mutex<Option<ActiveSearch>>,
    slot: tokio::sync::Mutex<()>,
    attached: AtomicBool,
    last_view: Mutex<Option<ResultView>>,
}

impl<B: LookupBackend> SearchOrchestrator<B> {
    /// Create an orchestrator
    ///
    /// Must be called inside a Tokio runtime context before the first search;
    /// the status reveal worker is spawned lazily on it.
    pub fn new(backend: B, sink: Arc<dyn ViewSink>, config: LookupConfig) -> Self {
        let status = Arc::new(StatusReporter::new(
            Arc::clone(&sink),
            config.reveal_timing(),
        ));
        Self {
            backend,
            sink,
            status,
            config,
            generation: Arc::new(AtomicU64::new(0)),
            state: Mutex::new(SearchState::Idle),
            active: Mutex::new(None),
            slot: tokio::sync::Mutex::new(()),
            attached: AtomicBool::new(false),
            last_view: Mutex::new(None),
        }
    }

    /// Signal the host that the app is ready and should fill the viewport
    ///
    /// Only the first call has any effect.
    pub fn attach(&self) {
        if self.attached.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(backend = self.backend.name(), "Attaching to host");
        self.sink.host_ready();
        self.sink.expand_viewport();
        self.sink.state_changed(None, SearchState::Idle);
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SearchState {
        *self.state.lock()
    }

    /// Status reporter feeding the status log
    #[must_use]
    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Lookup backend
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Most recently shown result view
    #[must_use]
    pub fn last_view(&self) -> Option<ResultView> {
        self.last_view.lock().clone()
    }

    /// Toggle a section of the shown result and redraw it
    ///
    /// Returns the new open state, or `None` if no such section is shown.
    pub fn toggle_section(&self, kind: SectionKind) -> Option<bool> {
        let mut last = self.last_view.lock();
        let view = last.as_mut()?;
        let open = view.section_mut(kind)?.toggle();
        self.sink.show_results(view);
        Some(open)
    }

    /// Run one search for `raw_input`
    ///
    /// # Errors
    ///
    /// - [`LookupError::Validation`] if the trimmed input is empty; no request
    ///   is made.
    /// - [`LookupError::Superseded`] if a newer search took over the view.
    /// - Any error the request settled with. These have already been rendered,
    ///   alerted and logged to the status log by the time they are returned.
    pub async fn perform_search(&self, raw_input: &str) -> Result<SearchReport, LookupError> {
        let query = self.validate(raw_input)?;
        let id = SearchId::new();

        let generation = match self.config.overlap_policy {
            OverlapPolicy::CancelPrevious => {
                let generation = self.next_generation();
                self.cancel_active();
                generation
            }
            OverlapPolicy::Queue => 0,
        };
        let _slot = self.slot.lock().await;
        let generation = match self.config.overlap_policy {
            OverlapPolicy::CancelPrevious => {
                // a newer search arrived while this one waited for the slot
                if !self.owns_view(generation) {
                    tracing::debug!(search_id = %id, username = %query, "Superseded before start");
                    return Err(LookupError::Superseded);
                }
                generation
            }
            OverlapPolicy::Queue => self.next_generation(),
        };

        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        *self.active.lock() = Some(ActiveSearch {
            generation,
            cancel: cancel_tx,
            narration: None,
        });
        let release = ViewRelease {
            orchestrator: self,
            generation,
            id: id.clone(),
        };

        self.enter_in_flight(&id, &query, generation);

        let start = Instant::now();
        let timeout = self.config.request_timeout;
        let outcome = tokio::select! {
            biased;
            Ok(()) = &mut cancel_rx => Err(LookupError::Superseded),
            fetched = tokio::time::timeout(timeout, self.backend.fetch(&query)) => match fetched {
                Ok(Ok(raw)) => classify_response(raw),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(LookupError::Timeout { after: timeout }),
            },
        };
        let elapsed = start.elapsed();
        self.stop_narration(generation);

        match outcome {
            Ok(mut result) => {
                if result.username.is_none() {
                    result.username = Some(query.to_string());
                }
                tracing::info!(
                    search_id = %id,
                    username = %query,
                    profiles = result.found_on.len(),
                    breaches = result.breaches.len(),
                    elapsed_ms = millis(elapsed),
                    "Search settled"
                );
                self.set_state(&id, generation, SearchState::Settled(Settlement::Success));

                if !self.config.render_delay.is_zero() {
                    tokio::select! {
                        biased;
                        Ok(()) = &mut cancel_rx => return Err(LookupError::Superseded),
                        () = tokio::time::sleep(self.config.render_delay) => {}
                    }
                }
                if !self.owns_view(generation) {
                    return Err(LookupError::Superseded);
                }

                let view = render_result(&result);
                self.show(&view);
                if let Some(error) = result.error.as_deref().filter(|_| result.has_hard_error()) {
                    self.status.append_error(truncate_chars(
                        &format!("Lookup finished with an error: {error}"),
                        self.config.status_summary_chars,
                    ));
                } else {
                    self.status.append(format!(
                        "Search complete: {} profiles, {} leaks",
                        result.found_on.len(),
                        result.breaches.len()
                    ));
                }
                drop(release);

                Ok(SearchReport {
                    id,
                    query,
                    result,
                    view,
                    elapsed,
                })
            }
            Err(LookupError::Superseded) => {
                tracing::debug!(search_id = %id, username = %query, "Search superseded");
                Err(LookupError::Superseded)
            }
            Err(e) => {
                tracing::warn!(
                    search_id = %id,
                    username = %query,
                    status = %SearchState::Settled(e.settlement()),
                    elapsed_ms = millis(elapsed),
                    error = %e,
                    "Search failed"
                );
                self.set_state(&id, generation, SearchState::Settled(e.settlement()));
                if self.owns_view(generation) {
                    self.show(&render_failure(&e));
                    self.sink
                        .alert(&format!("Search error: {}", e.display_message()));
                    self.status
                        .append_error(e.summary(self.config.status_summary_chars));
                }
                drop(release);
                Err(e)
            }
        }
    }

    fn validate(&self, raw_input: &str) -> Result<SearchQuery, LookupError> {
        let busy = self.active.lock().is_some();
        if !busy {
            self.publish_state(None, SearchState::Validating);
        }
        match SearchQuery::parse(raw_input) {
            Ok(query) => Ok(query),
            Err(e) => {
                tracing::debug!("Rejected empty username");
                self.sink.alert(&e.display_message());
                self.status.append_error(e.display_message());
                if !busy {
                    self.publish_state(None, SearchState::Idle);
                }
                Err(e)
            }
        }
    }

    fn enter_in_flight(&self, id: &SearchId, query: &SearchQuery, generation: u64) {
        self.status.reset();
        self.sink.clear_results();
        *self.last_view.lock() = None;
        self.sink.set_loading(true);
        self.sink.set_submit_enabled(false);
        self.set_state(id, generation, SearchState::InFlight);
        tracing::debug!(search_id = %id, username = %query, "Request started");

        self.status.append_title(format!("Looking up \"{query}\""));
        if self.config.narration {
            let status = Arc::clone(&self.status);
            let current = Arc::clone(&self.generation);
            let narration = Narration::standard(query);
            let handle = tokio::spawn(narration.play(move |text| {
                if current.load(Ordering::SeqCst) == generation {
                    status.append(text);
                }
            }));
            if let Some(active) = self.active.lock().as_mut() {
                active.narration = Some(handle);
            } else {
                handle.abort();
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn owns_view(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Signal the search holding the slot to stop and silence its narration
    fn cancel_active(&self) {
        if let Some(active) = self.active.lock().take() {
            if let Some(handle) = active.narration {
                handle.abort();
            }
            let _ = active.cancel.send(());
            tracing::debug!(generation = active.generation, "Cancelled in-flight search");
        }
    }

    fn stop_narration(&self, generation: u64) {
        let mut active = self.active.lock();
        if let Some(active) = active.as_mut().filter(|a| a.generation == generation) {
            if let Some(handle) = active.narration.take() {
                handle.abort();
            }
        }
    }

    fn show(&self, view: &ResultView) {
        self.sink.show_results(view);
        *self.last_view.lock() = Some(view.clone());
    }

    fn set_state(&self, id: &SearchId, generation: u64, state: SearchState) {
        if self.owns_view(generation) {
            self.publish_state(Some(id), state);
        }
    }

    fn publish_state(&self, id: Option<&SearchId>, state: SearchState) {
        *self.state.lock() = state;
        tracing::debug!(search_id = ?id.map(ToString::to_string), status = %state, "State changed");
        self.sink.state_changed(id, state);
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Returns the view to idle when a search ends, however it ends
///
/// Only acts while its search still owns the view, so the loader and submit
/// control are released exactly once per search.
struct ViewRelease<'a, B: LookupBackend> {
    orchestrator: &'a SearchOrchestrator<B>,
    generation: u64,
    id: SearchId,
}

impl<B: LookupBackend> Drop for ViewRelease<'_, B> {
    fn drop(&mut self) {
        let orchestrator = self.orchestrator;
        {
            let mut active = orchestrator.active.lock();
            if active.as_ref().is_some_and(|a| a.generation == self.generation) {
                if let Some(handle) = active.take().and_then(|a| a.narration) {
                    handle.abort();
                }
            }
        }
        if orchestrator.owns_view(self.generation) {
            orchestrator.sink.set_loading(false);
            orchestrator.sink.set_submit_enabled(true);
            orchestrator.publish_state(Some(&self.id), SearchState::Idle);
        }
    }
}

/// Turn a raw backend response into a result or a classified error
///
/// # Errors
///
/// - [`LookupError::Http`] for a non-2xx status. The message is the JSON
///   `error` field, else the JSON body itself, else the raw body text, else
///   `Network error: {status} {reason}`.
/// - [`LookupError::MalformedPayload`] for a 2xx body that is not JSON.
pub fn classify_response(raw: RawResponse) -> Result<SearchResult, LookupError> {
    if !raw.is_success() {
        let message = http_error_message(&raw);
        return Err(LookupError::Http {
            status: raw.status,
            message,
        });
    }

    let Some(body) = raw.body else {
        return Err(LookupError::MalformedPayload {
            detail: "response body could not be read".to_string(),
            body_excerpt: None,
        });
    };
    SearchResult::from_json(&body).map_err(|e| LookupError::MalformedPayload {
        detail: e.to_string(),
        body_excerpt: Some(body.trim())
            .filter(|text| !text.is_empty())
            .map(|text| truncate_chars(text, BODY_EXCERPT_CHARS)),
    })
}

fn http_error_message(raw: &RawResponse) -> String {
    let text = raw.body.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return format!("Network error: {} {}", raw.status, raw.reason)
            .trim_end()
            .to_string();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => value
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map_or_else(|| value.to_string(), str::to_string),
        Err(_) => text.to_string(),
    }
}
