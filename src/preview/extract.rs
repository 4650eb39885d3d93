// src/preview/extract.rs
// =============================================================================
// This module extracts preview metadata from an HTML document.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Each field has an ordered list of selectors; the first one that yields a
// non-empty trimmed value wins. Title alone has one extra fallback: the
// document's <title> element. Pages publish metadata inconsistently (Open
// Graph, Twitter cards, plain meta tags), so the chains cover the common
// spellings in preference order.
// =============================================================================

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

// Selector chains, in preference order
const TITLE_SELECTORS: &[&str] = &[
    r#"meta[property="og:title"]"#,
    r#"meta[name="twitter:title"]"#,
    r#"meta[name="title"]"#,
];
const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"meta[property="og:description"]"#,
    r#"meta[name="description"]"#,
    r#"meta[name="twitter:description"]"#,
];
const IMAGE_SELECTORS: &[&str] = &[
    r#"meta[property="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
    r#"meta[property="og:image:url"]"#,
];

// The preview record for one link
//
// `url` is always the final URL the fetch actually ended on. The other
// fields are independently optional; a record with only a URL is a valid
// result and still distinct from "no preview at all" (None upstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Final resolved URL after all redirects
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// Extracts metadata from an HTML document
//
// Parameters:
//   html: the HTML content to parse (borrowed as &str)
//   final_url: the URL the document was actually fetched from
//
// Never fails: malformed HTML parses to whatever the parser can recover,
// and missing tags simply leave fields unset.
pub fn extract(html: &str, final_url: &str) -> Metadata {
    let document = Html::parse_document(html);

    let title =
        first_meta_content(&document, TITLE_SELECTORS).or_else(|| title_element_text(&document));
    let description = first_meta_content(&document, DESCRIPTION_SELECTORS);
    let image = first_meta_content(&document, IMAGE_SELECTORS);

    Metadata {
        url: final_url.to_string(),
        title,
        description,
        image,
    }
}

// Walks a selector chain and returns the first non-empty content attribute
fn first_meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        // Selector::parse only fails on invalid CSS; ours are constants
        let selector = Selector::parse(raw).unwrap();
        if let Some(element) = document.select(&selector).next() {
            if let Some(content) = element.value().attr("content") {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

// The <title> element's text, used as the last fallback for the title field
fn title_element_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").unwrap();
    let element = document.select(&selector).next()?;
    let text: String = element.text().collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
