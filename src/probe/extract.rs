//! Content snippet extraction for successful probes
//!
//! A page's snippet is its `<title>` when it has one, otherwise the first
//! words of its visible text, read from the primary content region.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Word budget for body-text snippets
pub const MAX_SNIPPET_WORDS: usize = 120;

/// Regions searched for visible text, most specific first
const CONTENT_REGIONS: &[&str] = &["main", "article", "[role=main]", "body"];

/// Elements whose contents are never visible text
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "embed", "object", "svg", "template", "head",
];

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnippet {
    /// The page title (from the first non-empty `<title>` tag)
    pub title: Option<String>,

    /// Leading visible words, joined by single spaces
    pub text: String,
}

impl PageSnippet {
    /// The value reported for the page: title first, then body text
    pub fn into_content(self) -> String {
        self.title.unwrap_or(self.text)
    }
}

/// Parses an HTML document into a snippet
///
/// Entities are decoded by the HTML parser; whitespace is collapsed.
///
/// # Example
///
/// ```
/// use reach_probe::probe::extract_snippet;
///
/// let html = r#"<html><head><title> Test &amp; Co </title></head><body>Hi</body></html>"#;
/// assert_eq!(extract_snippet(html, 10).into_content(), "Test & Co");
/// ```
pub fn extract_snippet(html: &str, max_words: usize) -> PageSnippet {
    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let text = if title.is_some() {
        String::new()
    } else {
        extract_visible_text(&document, max_words)
    };

    PageSnippet { title, text }
}

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|s| !s.is_empty())
}

/// Extracts up to `max_words` words of visible text
///
/// The first region in [`CONTENT_REGIONS`] that yields any text wins; the
/// whole document is the last resort.
fn extract_visible_text(document: &Html, max_words: usize) -> String {
    for region in CONTENT_REGIONS {
        let Ok(selector) = Selector::parse(region) else {
            continue;
        };

        for element in document.select(&selector) {
            let mut words = Vec::new();
            collect_words(element, &mut words, max_words);
            if !words.is_empty() {
                return words.join(" ");
            }
        }
    }

    let mut words = Vec::new();
    collect_words(document.root_element(), &mut words, max_words);
    words.join(" ")
}

fn collect_words(element: ElementRef<'_>, words: &mut Vec<String>, max_words: usize) {
    for child in element.children() {
        if words.len() >= max_words {
            return;
        }

        match child.value() {
            Node::Text(text) => {
                for word in text.split_whitespace() {
                    if words.len() >= max_words {
                        return;
                    }
                    words.push(word.to_string());
                }
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_words(child_element, words, max_words);
                }
            }
            _ => {}
        }
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
