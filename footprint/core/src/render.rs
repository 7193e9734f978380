//! Result Renderer
//!
//! Turns a [`SearchResult`] (or a failed search) into a [`ResultView`] tree:
//! a summary block followed by collapsible sections. Rendering never fails;
//! missing or malformed fields were already normalized by the result model.
//!
//! The tree holds raw text. Markup is produced by [`ResultView::to_html`],
//! which routes every dynamic string through the escaper.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::escape::HtmlWriter;
use crate::result::{SearchResult, Verdict};

/// Shown when the backend did not report how many sources it checked
pub const SOURCES_PLACEHOLDER: &str = "50+";

/// Fixed warning shown at the top of the leaked-credentials section
pub const BREACH_BANNER: &str = "Data linked to this username may have been compromised. \
     Change the passwords on every related account!";

/// Severity tag of a collapsible section
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Informational
    Info,
    /// Needs attention
    Warning,
    /// Action required
    Danger,
}

impl Severity {
    fn css_class(self) -> &'static str {
        match self {
            Self::Info => "result-section severity-info",
            Self::Warning => "result-section severity-warning",
            Self::Danger => "result-section severity-danger",
        }
    }
}

/// Which section a [`CollapsibleSection`] is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// Sites the username was found on
    Footprint,
    /// Leaked-credential matches
    Breaches,
}

impl SectionKind {
    fn data_attr(self) -> &'static str {
        match self {
            Self::Footprint => "footprint",
            Self::Breaches => "breaches",
        }
    }
}

/// A togglable block with a title, a severity and a list of items
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsibleSection {
    /// Section identity
    pub kind: SectionKind,
    /// Header text
    pub title: String,
    /// Severity tag
    pub severity: Severity,
    /// Expanded
    pub open: bool,
    /// Optional warning shown above the items
    pub banner: Option<String>,
    /// List entries, in backend order
    pub items: Vec<String>,
}

impl CollapsibleSection {
    /// Flip the open state, returning the new state
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Force the open state
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    fn write_html(&self, w: &mut HtmlWriter) {
        w.tag(r#"<details class=""#)
            .tag(self.severity.css_class())
            .tag(r#"" data-section=""#)
            .tag(self.kind.data_attr())
            .tag(r#"""#);
        if self.open {
            w.tag(" open");
        }
        w.tag("><summary>").text(&self.title).tag("</summary>");
        if let Some(ref banner) = self.banner {
            w.tag(r#"<p class="warning-message">"#)
                .text(banner)
                .tag("</p>");
        }
        w.tag("<ul>");
        for item in &self.items {
            w.tag("<li>").text(item).tag("</li>");
        }
        w.tag("</ul></details>");
    }

    fn write_text(&self, out: &mut String) {
        let marker = if self.open { "[-]" } else { "[+]" };
        let _ = writeln!(out, "{marker} {}", self.title);
        if !self.open {
            return;
        }
        if let Some(ref banner) = self.banner {
            let _ = writeln!(out, "    ! {banner}");
        }
        for item in &self.items {
            let _ = writeln!(out, "    - {item}");
        }
    }
}

/// Number of sources the backend checked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourcesChecked {
    /// Reported by the backend
    Count(u64),
    /// Not reported (or zero)
    Placeholder,
}

impl std::fmt::Display for SourcesChecked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Placeholder => f.write_str(SOURCES_PLACEHOLDER),
        }
    }
}

/// Summary block at the top of a report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Sources checked
    pub sources_checked: SourcesChecked,
    /// Number of sites matched
    pub profile_count: usize,
    /// Number of leaks matched
    pub breach_count: usize,
    /// Overall verdict, absent when leaks were found
    pub verdict: Option<Verdict>,
    /// Backend annotation that came with real data
    pub note: Option<String>,
}

impl Summary {
    /// Profile status line
    #[must_use]
    pub fn profile_status(&self) -> String {
        if self.profile_count > 0 {
            format!("Profiles found: {}", self.profile_count)
        } else {
            "No profiles found on tracked sites".to_string()
        }
    }

    /// Breach status line
    #[must_use]
    pub fn breach_status(&self) -> String {
        if self.breach_count > 0 {
            format!("Possible leaks found: {}", self.breach_count)
        } else {
            "No signs of leaked data".to_string()
        }
    }

    /// Sources line
    #[must_use]
    pub fn sources_status(&self) -> String {
        format!("Sources checked: {}", self.sources_checked)
    }
}

/// Everything the results container shows after a search
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultView {
    /// Only an error message
    Failure {
        /// Error text
        message: String,
    },
    /// Summary plus sections
    Report {
        /// Username the report is for
        username: String,
        /// Summary block
        summary: Summary,
        /// Sections in display order
        sections: Vec<CollapsibleSection>,
    },
}

impl ResultView {
    /// Summary block, if this is a report
    #[must_use]
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Self::Report { summary, .. } => Some(summary),
            Self::Failure { .. } => None,
        }
    }

    /// Sections in display order (empty for failures)
    #[must_use]
    pub fn sections(&self) -> &[CollapsibleSection] {
        match self {
            Self::Report { sections, .. } => sections,
            Self::Failure { .. } => &[],
        }
    }

    /// Section of the given kind
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> Option<&CollapsibleSection> {
        self.sections().iter().find(|s| s.kind == kind)
    }

    /// Mutable section of the given kind, for user toggles
    pub fn section_mut(&mut self, kind: SectionKind) -> Option<&mut CollapsibleSection> {
        match self {
            Self::Report { sections, .. } => sections.iter_mut().find(|s| s.kind == kind),
            Self::Failure { .. } => None,
        }
    }

    /// Error message, if this is a failure
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failure { message } => Some(message),
            Self::Report { .. } => None,
        }
    }

    /// Escaped markup for the results container
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut w = HtmlWriter::new();
        match self {
            Self::Failure { message } => {
                w.tag(r#"<p class="error-message">"#)
                    .text(message)
                    .tag("</p>");
            }
            Self::Report {
                username,
                summary,
                sections,
            } => {
                w.tag(r#"<div class="results"><h2>Results for: "#)
                    .text(username)
                    .tag("</h2>");
                write_summary_html(&mut w, summary);
                for section in sections {
                    section.write_html(&mut w);
                }
                w.tag("</div>");
            }
        }
        w.finish()
    }

    /// Plain-text rendering for terminals
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Failure { message } => {
                let _ = writeln!(out, "Error: {message}");
            }
            Self::Report {
                username,
                summary,
                sections,
            } => {
                let _ = writeln!(out, "Results for: {username}");
                let _ = writeln!(out, "  {}", summary.sources_status());
                let _ = writeln!(out, "  {}", summary.profile_status());
                let _ = writeln!(out, "  {}", summary.breach_status());
                if let Some(ref note) = summary.note {
                    let _ = writeln!(out, "  Note: {note}");
                }
                if let Some(verdict) = summary.verdict {
                    let _ = writeln!(out, "  Verdict: {verdict}. {}", verdict.detail());
                }
                for section in sections {
                    section.write_text(&mut out);
                }
            }
        }
        out
    }
}

fn write_summary_html(w: &mut HtmlWriter, summary: &Summary) {
    w.tag(r#"<div class="summary"><p class="summary-sources">Sources checked: <strong>"#);
    match summary.sources_checked {
        SourcesChecked::Count(n) => {
            w.number(n);
        }
        SourcesChecked::Placeholder => {
            w.tag(SOURCES_PLACEHOLDER);
        }
    }
    w.tag(r#"</strong></p><p class="summary-profiles">"#)
        .text(&summary.profile_status())
        .tag(r#"</p><p class="summary-breaches">"#)
        .text(&summary.breach_status())
        .tag("</p>");
    if let Some(ref note) = summary.note {
        w.tag(r#"<p class="summary-note warning-message">"#)
            .text(note)
            .tag("</p>");
    }
    if let Some(verdict) = summary.verdict {
        w.tag(r#"<p class="verdict success-message"><strong>"#)
            .text(verdict.label())
            .tag("</strong> ")
            .text(verdict.detail())
            .tag("</p>");
    }
    w.tag("</div>");
}

/// Build the view for a settled, successful search
#[must_use]
pub fn render_result(result: &SearchResult) -> ResultView {
    if result.has_hard_error() {
        return ResultView::Failure {
            message: result.error.clone().unwrap_or_default(),
        };
    }

    let summary = Summary {
        sources_checked: result
            .sites_checked()
            .map_or(SourcesChecked::Placeholder, SourcesChecked::Count),
        profile_count: result.found_on.len(),
        breach_count: result.breaches.len(),
        verdict: result.verdict(),
        note: result.soft_error().map(str::to_string),
    };

    let mut sections = Vec::new();
    if result.has_profiles() {
        sections.push(CollapsibleSection {
            kind: SectionKind::Footprint,
            title: format!("Digital footprint ({})", result.found_on.len()),
            severity: Severity::Info,
            open: true,
            banner: None,
            items: result.found_on.clone(),
        });
    }
    if result.has_breaches() {
        sections.push(CollapsibleSection {
            kind: SectionKind::Breaches,
            title: format!("Leaked credentials ({})", result.breaches.len()),
            severity: Severity::Danger,
            open: true,
            banner: Some(BREACH_BANNER.to_string()),
            items: result.breaches.clone(),
        });
    }

    ResultView::Report {
        username: result.username.clone().unwrap_or_default(),
        summary,
        sections,
    }
}

/// Build the view for a failed search
#[must_use]
pub fn render_failure(error: &LookupError) -> ResultView {
    ResultView::Failure {
        message: format!("Search failed: {}", error.display_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(body: &str) -> SearchResult {
        SearchResult::from_json(body).unwrap()
    }

    #[test]
    fn test_profiles_without_breaches() {
        let view = render_result(&parse(
            r#"{"username":"alice","found_on":["siteA","siteB"],"breaches":[]}"#,
        ));

        let summary = view.summary().unwrap();
        assert_eq!(summary.profile_count, 2);
        assert_eq!(summary.breach_count, 0);
        assert_eq!(summary.verdict, Some(Verdict::CleanFootprintLimited));
        assert_eq!(summary.verdict.unwrap().label(), "Clean, footprint limited");

        let footprint = view.section(SectionKind::Footprint).unwrap();
        assert_eq!(footprint.items, vec!["siteA", "siteB"]);
        assert!(footprint.open);
        assert!(view.section(SectionKind::Breaches).is_none());
    }

    #[test]
    fn test_breaches_hide_verdict() {
        let view = render_result(&parse(
            r#"{"username":"bob","found_on":[],"breaches":["LeakDB 2019"]}"#,
        ));

        let breaches = view.section(SectionKind::Breaches).unwrap();
        assert_eq!(breaches.items, vec!["LeakDB 2019"]);
        assert_eq!(breaches.severity, Severity::Danger);
        assert_eq!(breaches.banner.as_deref(), Some(BREACH_BANNER));
        assert!(breaches.open);

        assert_eq!(view.summary().unwrap().verdict, None);
        assert!(!view.to_html().contains(Verdict::FullyClean.label()));
        assert!(!view.to_text().contains(Verdict::FullyClean.label()));
    }

    #[test]
    fn test_hard_error_renders_only_message() {
        let view = render_result(&parse(r#"{"error":"not found","found_on":[],"breaches":[]}"#));

        assert_eq!(
            view,
            ResultView::Failure {
                message: "not found".into()
            }
        );
        assert!(view.summary().is_none());
        assert!(view.sections().is_empty());
        assert_eq!(view.to_html(), r#"<p class="error-message">not found</p>"#);
    }

    #[test]
    fn test_soft_error_becomes_note() {
        let view = render_result(&parse(
            r#"{"username":"c","found_on":["GitHub"],"error":"3 sites timed out"}"#,
        ));
        let summary = view.summary().unwrap();
        assert_eq!(summary.note.as_deref(), Some("3 sites timed out"));
        assert_eq!(view.sections().len(), 1);
    }

    #[test]
    fn test_absent_found_on_renders_like_empty() {
        let absent = render_result(&parse(r#"{"username":"d","breaches":[]}"#));
        let empty = render_result(&parse(r#"{"username":"d","found_on":[],"breaches":[]}"#));
        assert_eq!(absent, empty);
        assert_eq!(absent.to_html(), empty.to_html());
    }

    #[test]
    fn test_nothing_found_is_fully_clean() {
        let view = render_result(&parse(r#"{"username":"e"}"#));
        let summary = view.summary().unwrap();
        assert_eq!(summary.verdict, Some(Verdict::FullyClean));
        assert!(view.sections().is_empty());
        assert_eq!(summary.profile_status(), "No profiles found on tracked sites");
        assert_eq!(summary.breach_status(), "No signs of leaked data");
    }

    #[test]
    fn test_sources_checked_placeholder() {
        let view = render_result(&parse(r#"{"username":"f","total_sites_checked":0}"#));
        assert_eq!(
            view.summary().unwrap().sources_checked,
            SourcesChecked::Placeholder
        );
        assert!(view.to_html().contains("<strong>50+</strong>"));

        let view = render_result(&parse(r#"{"username":"f","total_sites_checked":37}"#));
        assert_eq!(
            view.summary().unwrap().sources_checked,
            SourcesChecked::Count(37)
        );
        assert!(view.to_html().contains("<strong>37</strong>"));
    }

    #[test]
    fn test_section_order_is_fixed() {
        let view = render_result(&parse(
            r#"{"username":"g","breaches":["B"],"found_on":["A"]}"#,
        ));
        let kinds: Vec<SectionKind> = view.sections().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SectionKind::Footprint, SectionKind::Breaches]);
    }

    #[test]
    fn test_dynamic_strings_are_escaped_in_html() {
        let view = render_result(&parse(
            r#"{"username":"<u>","found_on":["<img src=x>"],"breaches":["a & 'b'"],"error":"\"quoted\""}"#,
        ));
        let html = view.to_html();
        assert!(html.contains("Results for: &lt;u&gt;"));
        assert!(html.contains("<li>&lt;img src=x&gt;</li>"));
        assert!(html.contains("<li>a &amp; &#039;b&#039;</li>"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(!html.contains("<img"));
        assert!(!html.contains("<u>"));
    }

    #[test]
    fn test_failure_message_is_escaped() {
        let view = render_failure(&LookupError::Http {
            status: 502,
            message: "<html>bad gateway</html>".into(),
        });
        assert_eq!(
            view.to_html(),
            r#"<p class="error-message">Search failed: &lt;html&gt;bad gateway&lt;/html&gt;</p>"#
        );
    }

    #[test]
    fn test_missing_username_is_tolerated() {
        let view = render_result(&parse(r#"{"found_on":["GitHub"]}"#));
        assert!(view.to_html().contains("<h2>Results for: </h2>"));
    }

    #[test]
    fn test_toggle_section() {
        let mut view = render_result(&parse(r#"{"username":"h","found_on":["A"]}"#));
        let section = view.section_mut(SectionKind::Footprint).unwrap();
        assert!(!section.toggle());
        assert!(!view.to_html().contains(" open>"));
        assert!(view.to_text().contains("[+] Digital footprint (1)"));
        assert!(!view.to_text().contains("- A"));

        view.section_mut(SectionKind::Footprint).unwrap().set_open(true);
        assert!(view.to_html().contains(r#"data-section="footprint" open>"#));
        assert!(view.to_text().contains("    - A"));
    }

    #[test]
    fn test_text_rendering() {
        let view = render_result(&parse(
            r#"{"username":"alice","found_on":["siteA"],"total_sites_checked":12}"#,
        ));
        assert_eq!(
            view.to_text(),
            "Results for: alice\n\
             \x20 Sources checked: 12\n\
             \x20 Profiles found: 1\n\
             \x20 No signs of leaked data\n\
             \x20 Verdict: Clean, footprint limited. No leaks found, but public profiles exist for this username.\n\
             [-] Digital footprint (1)\n\
             \x20   - siteA\n"
        );
    }
}
