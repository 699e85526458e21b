// SPDX-License-Identifier: MIT

//! Plain text to HTML formatting
//!
//! Turns the lightly structured text a model writes (headings, bullet and
//! numbered lists, paragraphs) into an HTML fragment. Never fails: any line
//! it does not recognise becomes a paragraph.

use once_cell::sync::Lazy;
use regex::Regex;

static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-•] ").expect("valid regex"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

/// The kind of list currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn open_tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>",
            ListKind::Ordered => "<ol>",
        }
    }

    fn close_tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        }
    }
}

/// Line-oriented text to HTML formatter
#[derive(Debug, Clone)]
pub struct HtmlFormatter {
    /// Marker for a top-level heading, rendered as `<h1>`
    pub heading: String,
    /// Marker for a sub-heading, rendered as `<h2>`
    pub subheading: String,
}

impl Default for HtmlFormatter {
    fn default() -> Self {
        Self {
            heading: "## ".to_string(),
            subheading: "### ".to_string(),
        }
    }
}

impl HtmlFormatter {
    pub fn new(heading: impl Into<String>, subheading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            subheading: subheading.into(),
        }
    }

    /// Format `text` as an HTML fragment, one output element per line
    pub fn format(&self, text: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut open_list: Option<ListKind> = None;

        for raw in text.lines() {
            let line = raw.trim();

            // The longer marker is checked first so "### " is not read as "## "
            let (first, second) = if self.subheading.len() >= self.heading.len() {
                ((&self.subheading, "h2"), (&self.heading, "h1"))
            } else {
                ((&self.heading, "h1"), (&self.subheading, "h2"))
            };

            let heading = [first, second].into_iter().find_map(|(marker, tag)| {
                line.strip_prefix(marker.as_str())
                    .map(|rest| format!("<{tag}>{}</{tag}>", rest.trim()))
            });

            if let Some(heading) = heading {
                if let Some(kind) = open_list.take() {
                    out.push(kind.close_tag().to_string());
                }
                out.push(heading);
            } else if BULLET_ITEM.is_match(line) {
                // Both bullet glyphs are followed by a space; skip glyph + space
                let item = line.chars().skip(2).collect::<String>();
                push_list_item(&mut out, &mut open_list, ListKind::Unordered, item.trim());
            } else if let Some(m) = NUMBERED_ITEM.find(line) {
                let item = &line[m.end()..];
                push_list_item(&mut out, &mut open_list, ListKind::Ordered, item.trim());
            } else {
                if let Some(kind) = open_list.take() {
                    out.push(kind.close_tag().to_string());
                }
                if !line.is_empty() {
                    out.push(format!("<p>{}</p>", line));
                }
            }
        }

        if let Some(kind) = open_list {
            out.push(kind.close_tag().to_string());
        }

        out.join("\n")
    }
}

fn push_list_item(
    out: &mut Vec<String>,
    open_list: &mut Option<ListKind>,
    kind: ListKind,
    item: &str,
) {
    match *open_list {
        Some(current) if current == kind => {}
        Some(current) => {
            out.push(current.close_tag().to_string());
            out.push(kind.open_tag().to_string());
        }
        None => out.push(kind.open_tag().to_string()),
    }
    *open_list = Some(kind);
    out.push(format!("<li>{}</li>", item));
}

/// Format `text` with the default heading markers
pub fn format_text_to_html(text: &str) -> String {
    HtmlFormatter::default().format(text)
}

/// Wrap formatted `text` in a complete HTML document titled `title`
pub fn render_document(title: &str, text: &str) -> String {
    format!(
        "<html>\n<head>\n    <title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        title,
        format_text_to_html(text)
    )
}
