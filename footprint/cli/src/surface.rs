//! Terminal Surface
//!
//! Consumes [`ViewUpdate`]s from the core and prints them. Rendered results
//! go to stdout; status lines, host callouts and alerts go to stderr so the
//! output can be piped.

use std::collections::HashSet;

use clap::ValueEnum;
use tokio::io::{AsyncWriteExt, Stderr, Stdout};
use tokio::sync::mpsc;

use footprint_core::{ResultView, StatusLine, ViewUpdate};

/// How rendered results are printed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text with `[+]`/`[-]` section markers
    #[default]
    Text,
    /// Escaped HTML fragment
    Html,
}

impl OutputFormat {
    fn render(self, view: &ResultView) -> String {
        match self {
            Self::Text => view.to_text(),
            Self::Html => {
                let mut html = view.to_html();
                html.push('\n');
                html
            }
        }
    }
}

/// Where a printed chunk goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// Rendered result
    Stdout(String),
    /// Status, host callouts, alerts
    Stderr(String),
}

/// Turns updates into printable chunks
///
/// Status lines are printed once, when they first complete.
#[derive(Debug, Default)]
pub struct Terminal {
    format: OutputFormat,
    printed_lines: HashSet<usize>,
}

impl Terminal {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            printed_lines: HashSet::new(),
        }
    }

    pub fn describe(&mut self, update: &ViewUpdate) -> Option<Output> {
        match update {
            ViewUpdate::HostReady => Some(Output::Stderr("[host] ready\n".to_string())),
            ViewUpdate::ExpandViewport => Some(Output::Stderr("[host] expand\n".to_string())),
            ViewUpdate::Alert { message } => {
                Some(Output::Stderr(format!("[host] alert: {message}\n")))
            }
            ViewUpdate::State { search, state } => {
                tracing::trace!(search_id = ?search, status = %state, "Surface saw state change");
                None
            }
            ViewUpdate::Results { view } => Some(Output::Stdout(self.format.render(view))),
            ViewUpdate::StatusCleared => {
                self.printed_lines.clear();
                None
            }
            ViewUpdate::StatusLine { index, line } => self.status_line(*index, line),
            ViewUpdate::Loading { .. }
            | ViewUpdate::SubmitEnabled { .. }
            | ViewUpdate::ResultsCleared
            | ViewUpdate::StatusScrolled => None,
        }
    }

    fn status_line(&mut self, index: usize, line: &StatusLine) -> Option<Output> {
        if !line.complete || !self.printed_lines.insert(index) {
            return None;
        }
        Some(Output::Stderr(format!(
            "[{}] > {}\n",
            line.timestamp(),
            line.text
        )))
    }
}

/// Print updates until every sender is gone
pub async fn print_updates(mut updates: mpsc::UnboundedReceiver<ViewUpdate>, format: OutputFormat) {
    let mut terminal = Terminal::new(format);
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();

    while let Some(update) = updates.recv().await {
        if let Some(output) = terminal.describe(&update) {
            if let Err(e) = write_output(&mut stdout, &mut stderr, output).await {
                tracing::warn!(error = %e, "Failed to write to terminal");
            }
        }
    }
}

async fn write_output(
    stdout: &mut Stdout,
    stderr: &mut Stderr,
    output: Output,
) -> std::io::Result<()> {
    match output {
        Output::Stdout(text) => {
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await
        }
        Output::Stderr(text) => {
            stderr.write_all(text.as_bytes()).await?;
            stderr.flush().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footprint_core::{render_result, SearchResult, StatusLog, LineKind};
    use pretty_assertions::assert_eq;

    fn completed_line(text: &str) -> StatusLine {
        let mut log = StatusLog::new();
        let slot = log.begin_line(text, LineKind::Normal);
        log.complete(slot.index).unwrap()
    }

    #[test]
    fn test_host_callouts_go_to_stderr() {
        let mut terminal = Terminal::new(OutputFormat::Text);
        assert_eq!(
            terminal.describe(&ViewUpdate::HostReady),
            Some(Output::Stderr("[host] ready\n".into()))
        );
        assert_eq!(
            terminal.describe(&ViewUpdate::Alert {
                message: "Please enter a username.".into()
            }),
            Some(Output::Stderr("[host] alert: Please enter a username.\n".into()))
        );
        assert_eq!(terminal.describe(&ViewUpdate::Loading { loading: true }), None);
    }

    #[test]
    fn test_status_line_printed_once_when_complete() {
        let mut terminal = Terminal::new(OutputFormat::Text);
        let line = completed_line("Connecting...");

        let mut partial = line.clone();
        partial.complete = false;
        partial.text = "Conn".into();
        assert_eq!(
            terminal.describe(&ViewUpdate::StatusLine {
                index: 0,
                line: partial
            }),
            None
        );

        let update = ViewUpdate::StatusLine {
            index: 0,
            line: line.clone(),
        };
        let expected = format!("[{}] > Connecting...\n", line.timestamp());
        assert_eq!(terminal.describe(&update), Some(Output::Stderr(expected.clone())));
        // cursor moving off the line re-sends it
        assert_eq!(terminal.describe(&update), None);

        terminal.describe(&ViewUpdate::StatusCleared);
        assert_eq!(terminal.describe(&update), Some(Output::Stderr(expected)));
    }

    #[test]
    fn test_results_use_selected_format() {
        let result = SearchResult::from_json(r#"{"username":"<b>","found_on":["A"]}"#).unwrap();
        let view = render_result(&result);
        let update = ViewUpdate::Results { view: view.clone() };

        let mut text = Terminal::new(OutputFormat::Text);
        assert_eq!(text.describe(&update), Some(Output::Stdout(view.to_text())));

        let mut html = Terminal::new(OutputFormat::Html);
        let Some(Output::Stdout(out)) = html.describe(&update) else {
            panic!("expected stdout output");
        };
        assert!(out.contains("Results for: &lt;b&gt;"));
        assert!(out.ends_with('\n'));
    }
}
