//! HTML Escaping
//!
//! The single sanitization boundary for untrusted text. Every dynamic string
//! that ends up in markup goes through [`escape_html`], and markup itself is
//! only ever assembled by [`HtmlWriter`], which accepts dynamic text through
//! the escaper and tags through `&'static str` literals.

/// Escape the five HTML-significant characters in `input`
///
/// `&` is handled in the same pass as the others, so entities produced here
/// are never escaped a second time within one call. Nothing else changes: no
/// trimming, no case folding.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an optional string; `None` and `""` both map to `""`
#[must_use]
pub fn escape_html_opt(input: Option<&str>) -> String {
    input.map(escape_html).unwrap_or_default()
}

/// Append-only markup builder
///
/// Static structure goes in with [`HtmlWriter::tag`]; every dynamic value goes
/// in with [`HtmlWriter::text`], which escapes it.
#[derive(Debug, Default)]
pub struct HtmlWriter {
    buf: String,
}

impl HtmlWriter {
    /// Create an empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append trusted static markup
    pub fn tag(&mut self, markup: &'static str) -> &mut Self {
        self.buf.push_str(markup);
        self
    }

    /// Append untrusted text, escaped
    pub fn text(&mut self, value: &str) -> &mut Self {
        self.buf.push_str(&escape_html(value));
        self
    }

    /// Append a number
    pub fn number(&mut self, value: u64) -> &mut Self {
        self.buf.push_str(&value.to_string());
        self
    }

    /// Finish and return the markup
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_empty_and_missing_input() {
        assert_eq!(escape_html(""), "");
        assert_eq!(escape_html_opt(None), "");
        assert_eq!(escape_html_opt(Some("")), "");
        assert_eq!(escape_html_opt(Some("a<b")), "a&lt;b");
    }

    #[test]
    fn test_no_other_transformation() {
        let input = "  MiXeD case\twith spaces  ";
        assert_eq!(escape_html(input), input);
        assert_eq!(escape_html("юзер_123"), "юзер_123");
    }

    #[test]
    fn test_escaping_twice_escapes_further() {
        let samples = ["&", "<", ">", "\"", "'", "a & b < c > d \" e ' f"];
        for s in samples {
            let once = escape_html(s);
            let twice = escape_html(&once);
            assert_ne!(once, twice, "escaping {s:?} twice must change the output");
            assert!(!once.contains('<') && !once.contains('>'));
            assert!(!twice.contains('<') && !twice.contains('>'));
        }
    }

    #[test]
    fn test_existing_entities_are_escaped() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_writer_escapes_text_only() {
        let mut w = HtmlWriter::new();
        w.tag("<li>").text("<script>").tag("</li>").number(3);
        assert_eq!(w.finish(), "<li>&lt;script&gt;</li>3");
    }
}
