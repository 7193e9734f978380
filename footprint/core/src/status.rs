//! Status Reporter
//!
//! A simulated console of progress lines with a typewriter reveal.
//!
//! # Design
//!
//! [`StatusLog`] is the plain model: an append-only list of [`StatusLine`]s.
//! [`StatusReporter`] feeds it through an explicit FIFO queue drained by one
//! spawned reveal worker, one character per tick. Messages therefore appear
//! strictly in the order they were appended, and [`StatusReporter::reset`]
//! can drop everything still pending by aborting the worker.
//!
//! ```text
//! append("a") ─┐
//! append("b") ─┼─► mpsc queue ─► reveal worker ─► StatusLog ─► ViewSink
//! flush()     ─┘                  (interval ticks)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::escape::HtmlWriter;
use crate::view::ViewSink;

/// Trailing marker shown after the most recently completed line
pub const CURSOR_MARKER: char = '▌';

/// Visual flavour of a status line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    /// Regular progress message
    Normal,
    /// Search banner, revealed with the faster tick
    Title,
    /// Failure summary
    Error,
}

impl LineKind {
    fn css_class(self) -> &'static str {
        match self {
            Self::Normal => "status-line",
            Self::Title => "status-line status-title",
            Self::Error => "status-line status-error",
        }
    }
}

/// One line of the status log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusLine {
    /// Characters revealed so far
    pub text: String,
    /// Full text this line is revealing towards
    pub target: String,
    /// Visual flavour
    pub kind: LineKind,
    /// Fully revealed
    pub complete: bool,
    /// Carries the trailing cursor marker
    pub cursor: bool,
    /// When the line was created
    pub created_at: DateTime<Local>,
}

impl StatusLine {
    fn new(kind: LineKind) -> Self {
        Self {
            text: String::new(),
            target: String::new(),
            kind,
            complete: false,
            cursor: false,
            created_at: Local::now(),
        }
    }

    /// Revealed text plus the cursor marker when this line holds it
    #[must_use]
    pub fn display(&self) -> String {
        let mut out = self.text.clone();
        if self.cursor {
            out.push(CURSOR_MARKER);
        }
        out
    }

    /// Creation time as `HH:MM:SS`
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.created_at.format("%H:%M:%S").to_string()
    }
}

/// Append-only list of status lines
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusLog {
    lines: Vec<StatusLine>,
}

/// Where [`StatusLog::begin_line`] put the next message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSlot {
    /// Index of the line receiving the message
    pub index: usize,
    /// A new line was appended (as opposed to reusing the last one)
    pub created: bool,
    /// Line that lost the cursor marker, if any
    pub cursor_moved_from: Option<usize>,
}

impl StatusLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the line that will receive `target`
    ///
    /// A fully revealed, non-empty last line is left alone and a fresh line is
    /// appended. An empty or still-revealing last line is reused.
    pub fn begin_line(&mut self, target: &str, kind: LineKind) -> LineSlot {
        let cursor_moved_from = self.lines.iter().position(|l| l.cursor);
        if let Some(idx) = cursor_moved_from {
            self.lines[idx].cursor = false;
        }

        let reuse = self
            .lines
            .last()
            .is_some_and(|last| !(last.complete && !last.text.is_empty()));

        if reuse {
            let index = self.lines.len() - 1;
            let line = &mut self.lines[index];
            line.complete = false;
            line.kind = kind;
            line.target = format!("{}{}", line.text, target);
            return LineSlot {
                index,
                created: false,
                cursor_moved_from,
            };
        }

        let mut line = StatusLine::new(kind);
        line.target = target.to_string();
        self.lines.push(line);
        LineSlot {
            index: self.lines.len() - 1,
            created: true,
            cursor_moved_from,
        }
    }

    /// Reveal one more character on line `index`
    pub fn push_char(&mut self, index: usize, ch: char) -> Option<StatusLine> {
        let line = self.lines.get_mut(index)?;
        line.text.push(ch);
        Some(line.clone())
    }

    /// Mark line `index` as fully revealed and give it the cursor
    pub fn complete(&mut self, index: usize) -> Option<StatusLine> {
        let line = self.lines.get_mut(index)?;
        line.text.clone_from(&line.target);
        line.complete = true;
        line.cursor = true;
        Some(line.clone())
    }

    /// All lines, oldest first
    #[must_use]
    pub fn lines(&self) -> &[StatusLine] {
        &self.lines
    }

    /// Line at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StatusLine> {
        self.lines.get(index)
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// No lines yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Revealed text of every line, oldest first
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.text.clone()).collect()
    }

    /// Render the log as escaped markup
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut w = HtmlWriter::new();
        w.tag(r#"<div class="status-log">"#);
        for line in &self.lines {
            w.tag(r#"<p class=""#)
                .tag(line.kind.css_class())
                .tag(r#""><span class="status-time">["#)
                .text(&line.timestamp())
                .tag("]</span> &gt; ")
                .text(&line.display())
                .tag("</p>");
        }
        w.tag("</div>");
        w.finish()
    }
}

/// Tick lengths for the reveal effect
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealTiming {
    /// Per-character delay for regular lines
    pub tick: Duration,
    /// Per-character delay for title lines
    pub title_tick: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(30),
            title_tick: Duration::from_millis(20),
        }
    }
}

impl RevealTiming {
    /// Reveal everything at once
    #[must_use]
    pub fn instant() -> Self {
        Self {
            tick: Duration::ZERO,
            title_tick: Duration::ZERO,
        }
    }

    fn tick_for(self, kind: LineKind) -> Duration {
        match kind {
            LineKind::Title => self.title_tick,
            LineKind::Normal | LineKind::Error => self.tick,
        }
    }
}

enum RevealJob {
    Line { text: String, kind: LineKind },
    Barrier(oneshot::Sender<()>),
}

struct RevealWorker {
    tx: mpsc::UnboundedSender<RevealJob>,
    handle: JoinHandle<()>,
}

/// Queue-driven typewriter feeding a [`StatusLog`] and a [`ViewSink`]
///
/// Must be used from inside a Tokio runtime; the reveal worker is spawned on
/// first use and respawned after every [`reset`](Self::reset).
pub struct StatusReporter {
    sink: Arc<dyn ViewSink>,
    timing: RevealTiming,
    log: Arc<Mutex<StatusLog>>,
    /// Bumped on every reset, under the log lock
    epoch: Arc<AtomicU64>,
    worker: Mutex<Option<RevealWorker>>,
}

impl StatusReporter {
    /// Create a reporter writing to `sink`
    #[must_use]
    pub fn new(sink: Arc<dyn ViewSink>, timing: RevealTiming) -> Self {
        Self {
            sink,
            timing,
            log: Arc::new(Mutex::new(StatusLog::new())),
            epoch: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    /// Queue a regular progress line
    pub fn append(&self, text: impl Into<String>) {
        self.enqueue(RevealJob::Line {
            text: text.into(),
            kind: LineKind::Normal,
        });
    }

    /// Queue a title line (fast reveal)
    pub fn append_title(&self, text: impl Into<String>) {
        self.enqueue(RevealJob::Line {
            text: text.into(),
            kind: LineKind::Title,
        });
    }

    /// Queue an error line
    pub fn append_error(&self, text: impl Into<String>) {
        self.enqueue(RevealJob::Line {
            text: text.into(),
            kind: LineKind::Error,
        });
    }

    /// Wait until every line queued before this call is fully revealed
    ///
    /// Returns early if the queue is reset in the meantime.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(RevealJob::Barrier(done_tx));
        let _ = done_rx.await;
    }

    /// Abort any reveal in progress, drop pending lines and clear the log
    pub fn reset(&self) {
        let mut worker = self.worker.lock();
        if let Some(worker) = worker.take() {
            worker.handle.abort();
        }
        // an aborted worker may still be between two awaits; the epoch bump
        // makes whatever it does next a no-op
        let mut log = self.log.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        log.clear();
        self.sink.status_cleared();
    }

    /// Copy of the log as it stands
    #[must_use]
    pub fn snapshot(&self) -> StatusLog {
        self.log.lock().clone()
    }

    fn enqueue(&self, job: RevealJob) {
        let mut slot = self.worker.lock();
        let worker = slot.get_or_insert_with(|| self.spawn_worker());
        if let Err(mpsc::error::SendError(job)) = worker.tx.send(job) {
            tracing::debug!("Reveal worker gone, restarting");
            *worker = self.spawn_worker();
            let _ = worker.tx.send(job);
        }
    }

    fn spawn_worker(&self) -> RevealWorker {
        let (tx, rx) = mpsc::unbounded_channel();
        let target = RevealTarget {
            log: Arc::clone(&self.log),
            epoch: Arc::clone(&self.epoch),
            started_in: self.epoch.load(Ordering::SeqCst),
            sink: Arc::clone(&self.sink),
        };
        let handle = tokio::spawn(run_reveal_worker(rx, target, self.timing));
        RevealWorker { tx, handle }
    }
}

impl Drop for StatusReporter {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.handle.abort();
        }
    }
}

/// Log and sink as seen by one reveal worker
struct RevealTarget {
    log: Arc<Mutex<StatusLog>>,
    epoch: Arc<AtomicU64>,
    started_in: u64,
    sink: Arc<dyn ViewSink>,
}

impl RevealTarget {
    /// Run `f` on the log unless it was reset since this worker started
    fn update<T>(&self, f: impl FnOnce(&mut StatusLog, &dyn ViewSink) -> T) -> Option<T> {
        let mut log = self.log.lock();
        if self.epoch.load(Ordering::SeqCst) != self.started_in {
            return None;
        }
        Some(f(&mut log, self.sink.as_ref()))
    }
}

async fn run_reveal_worker(
    mut rx: mpsc::UnboundedReceiver<RevealJob>,
    target: RevealTarget,
    timing: RevealTiming,
) {
    while let Some(job) = rx.recv().await {
        match job {
            RevealJob::Line { text, kind } => {
                reveal_line(&text, kind, &target, timing.tick_for(kind)).await;
            }
            RevealJob::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn reveal_line(text: &str, kind: LineKind, target: &RevealTarget, tick: Duration) {
    let begun = target.update(|log, sink| {
        let slot = log.begin_line(text, kind);
        if let Some(idx) = slot.cursor_moved_from {
            if let Some(line) = log.get(idx) {
                sink.status_line_updated(idx, line);
            }
        }
        if let Some(line) = log.get(slot.index) {
            sink.status_line_updated(slot.index, line);
        }
        if slot.created {
            sink.status_scrolled_to_end();
        }
        slot.index
    });
    let Some(index) = begun else {
        return;
    };

    if !tick.is_zero() {
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        for ch in text.chars() {
            ticker.tick().await;
            let revealed = target.update(|log, sink| {
                if let Some(line) = log.push_char(index, ch) {
                    sink.status_line_updated(index, &line);
                }
            });
            if revealed.is_none() {
                return;
            }
        }
    }

    target.update(|log, sink| {
        if let Some(line) = log.complete(index) {
            sink.status_line_updated(index, &line);
        }
    });
}
