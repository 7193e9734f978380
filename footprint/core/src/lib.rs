//! Footprint Core - Headless Username Exposure Lookup
//!
//! This crate holds the whole search pipeline of footprint: it validates a
//! username, asks the remote lookup service whether that username shows up on
//! tracked sites or in leaked-credential databases, narrates progress in a
//! typewriter-style status log, and turns the answer into an escaped,
//! collapsible result view. It knows nothing about terminals, DOMs or host
//! runtimes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Surfaces                             │
//! │   ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │   │  Terminal   │   │   Web view   │   │  Test harness    │  │
//! │   │ (footprint) │   │  (mini-app)  │   │  (recording)     │  │
//! │   └──────┬──────┘   └──────┬───────┘   └────────┬─────────┘  │
//! │          └─────────────────┼────────────────────┘            │
//! │               perform_search (down)  ViewSink (up)           │
//! └────────────────────────────┼─────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┼─────────────────────────────────┐
//! │                      FOOTPRINT CORE                           │
//! │  ┌─────────────────────────┴──────────────────────────────┐  │
//! │  │                  SearchOrchestrator                     │  │
//! │  │  ┌───────────┐  ┌────────────┐  ┌──────────┐  ┌──────┐ │  │
//! │  │  │  Status   │  │ Narration  │  │ Renderer │  │Lookup│ │  │
//! │  │  │ Reporter  │  │            │  │          │  │Backnd│ │  │
//! │  │  └───────────┘  └────────────┘  └──────────┘  └──────┘ │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`SearchOrchestrator`]: runs one search at a time against a backend
//! - [`LookupBackend`]: transport to the lookup service ([`HttpLookupBackend`])
//! - [`ViewSink`]: everything the core shows goes through this trait
//! - [`SearchResult`]: tolerant model of the backend payload
//! - [`ResultView`]: rendered summary plus collapsible sections
//! - [`StatusReporter`]: queued typewriter reveal of progress lines
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use footprint_core::{
//!     load_config, ChannelSink, HttpLookupBackend, SearchOrchestrator, ViewUpdate,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let backend = HttpLookupBackend::from_config(&config)?;
//!     let (sink, mut updates) = ChannelSink::channel();
//!     let orchestrator = SearchOrchestrator::new(backend, Arc::new(sink), config);
//!
//!     orchestrator.attach();
//!     tokio::spawn(async move {
//!         while let Some(update) = updates.recv().await {
//!             // Draw the update
//!         }
//!     });
//!
//!     let report = orchestrator.perform_search("alice").await?;
//!     println!("{}", report.view.to_text());
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`escape`]: HTML escaping and the markup writer
//! - [`result`]: search query and backend result model
//! - [`status`]: status log model and reveal worker
//! - [`narration`]: progress messages shown while a request is in flight
//! - [`render`]: result view tree, HTML and text output
//! - [`orchestrator`]: request lifecycle, timeout and overlap handling
//! - [`backend`]: lookup backend trait and HTTP implementation
//! - [`view`]: view sink trait and channel sink
//! - [`config`]: TOML, environment and CLI configuration
//! - [`error`]: lookup error taxonomy
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on terminal or UI frameworks.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod escape;
pub mod narration;
pub mod orchestrator;
pub mod render;
pub mod result;
pub mod status;
pub mod view;

// Re-exports for convenience
pub use backend::{HttpLookupBackend, LookupBackend, RawResponse};
pub use config::{
    default_config_path, load_config, load_config_from_path, load_config_with_env, ConfigError,
    ConfigOverrides, ConfigSource, FootprintToml, LookupConfig, OverlapPolicy,
    DEFAULT_BACKEND_URL,
};
pub use error::{LookupError, Settlement};
pub use escape::{escape_html, escape_html_opt};
pub use narration::{Narration, NarrationStep};
pub use orchestrator::{classify_response, SearchId, SearchOrchestrator, SearchReport, SearchState};
pub use render::{
    render_failure, render_result, CollapsibleSection, ResultView, SectionKind, Severity,
    SourcesChecked, Summary,
};
pub use result::{SearchQuery, SearchResult, Verdict};
pub use status::{LineKind, RevealTiming, StatusLine, StatusLog, StatusReporter};
pub use view::{ChannelSink, NullSink, ViewSink, ViewUpdate};
