//! View Sink
//!
//! The only way the core touches a surface. The orchestrator, the status
//! reveal worker and the renderer all write through [`ViewSink`]; a surface
//! (terminal, web view, test harness) implements it.
//!
//! # Design Philosophy
//!
//! Surfaces are dumb renderers. They own the loading indicator, the submit
//! control, the results container and the status log container, and they show
//! what they are told. The core never reads them back.
//!
//! [`ChannelSink`] turns every call into a serializable [`ViewUpdate`] and
//! forwards it over a channel, so a surface can live on another task (or
//! another process) and consume updates at its own pace.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::orchestrator::{SearchId, SearchState};
use crate::render::ResultView;
use crate::status::StatusLine;

/// Output side of a surface
///
/// Methods take `&self`; implementations use interior mutability. They must be
/// cheap and must not block: they are called from async tasks.
pub trait ViewSink: Send + Sync {
    /// Host runtime: the app finished loading
    fn host_ready(&self) {}

    /// Host runtime: expand to the full viewport
    fn expand_viewport(&self) {}

    /// Host runtime: modal alert
    fn alert(&self, message: &str);

    /// Orchestrator moved to a new state
    fn state_changed(&self, _search: Option<&SearchId>, _state: SearchState) {}

    /// Show or hide the loading indicator
    fn set_loading(&self, loading: bool);

    /// Enable or disable the submit control
    fn set_submit_enabled(&self, enabled: bool);

    /// Hide and empty the results container
    fn clear_results(&self);

    /// Replace the results container with `view`
    fn show_results(&self, view: &ResultView);

    /// Status log was emptied
    fn status_cleared(&self);

    /// Status line `index` was created or changed
    fn status_line_updated(&self, index: usize, line: &StatusLine);

    /// Scroll the status log to its latest entry
    fn status_scrolled_to_end(&self) {}
}

/// Sink that discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ViewSink for NullSink {
    fn alert(&self, _message: &str) {}
    fn set_loading(&self, _loading: bool) {}
    fn set_submit_enabled(&self, _enabled: bool) {}
    fn clear_results(&self) {}
    fn show_results(&self, _view: &ResultView) {}
    fn status_cleared(&self) {}
    fn status_line_updated(&self, _index: usize, _line: &StatusLine) {}
}

/// One sink call, as data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ViewUpdate {
    /// Host runtime: app ready
    HostReady,
    /// Host runtime: expand viewport
    ExpandViewport,
    /// Host runtime: modal alert
    Alert {
        /// Alert text
        message: String,
    },
    /// Orchestrator state change
    State {
        /// Search the change belongs to, if any
        search: Option<SearchId>,
        /// New state
        state: SearchState,
    },
    /// Loading indicator visibility
    Loading {
        /// Visible
        loading: bool,
    },
    /// Submit control availability
    SubmitEnabled {
        /// Enabled
        enabled: bool,
    },
    /// Results container cleared
    ResultsCleared,
    /// Results container replaced
    Results {
        /// New content
        view: ResultView,
    },
    /// Status log cleared
    StatusCleared,
    /// Status line created or changed
    StatusLine {
        /// Line index
        index: usize,
        /// Line contents
        line: StatusLine,
    },
    /// Status log scrolled to the end
    StatusScrolled,
}

/// Sink that forwards every call as a [`ViewUpdate`]
///
/// Updates sent after the receiver is dropped are discarded.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ViewUpdate>,
}

impl ChannelSink {
    /// Create a sink and the receiver its updates arrive on
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ViewUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, update: ViewUpdate) {
        if self.tx.send(update).is_err() {
            tracing::trace!("View update dropped, surface receiver closed");
        }
    }
}

impl ViewSink for ChannelSink {
    fn host_ready(&self) {
        self.send(ViewUpdate::HostReady);
    }

    fn expand_viewport(&self) {
        self.send(ViewUpdate::ExpandViewport);
    }

    fn alert(&self, message: &str) {
        self.send(ViewUpdate::Alert {
            message: message.to_string(),
        });
    }

    fn state_changed(&self, search: Option<&SearchId>, state: SearchState) {
        self.send(ViewUpdate::State {
            search: search.cloned(),
            state,
        });
    }

    fn set_loading(&self, loading: bool) {
        self.send(ViewUpdate::Loading { loading });
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.send(ViewUpdate::SubmitEnabled { enabled });
    }

    fn clear_results(&self) {
        self.send(ViewUpdate::ResultsCleared);
    }

    fn show_results(&self, view: &ResultView) {
        self.send(ViewUpdate::Results { view: view.clone() });
    }

    fn status_cleared(&self) {
        self.send(ViewUpdate::StatusCleared);
    }

    fn status_line_updated(&self, index: usize, line: &StatusLine) {
        self.send(ViewUpdate::StatusLine {
            index,
            line: line.clone(),
        });
    }

    fn status_scrolled_to_end(&self) {
        self.send(ViewUpdate::StatusScrolled);
    }
}
