//! Structural queries over one captured markup snapshot.
//!
//! A [`MarkupSnapshot`] is parsed once from the page source and never
//! changes. Queries never fail: an unmatched (or unparsable) selector yields
//! an empty sequence or `None`.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

pub struct MarkupSnapshot {
    document: Html,
}

impl MarkupSnapshot {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// All matches in document order.
    pub fn query(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(sel) => self.document.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// Text of the first match.
    pub fn query_text(&self, selector: &str) -> Option<String> {
        let sel = parse_selector(selector)?;
        self.document.select(&sel).next().map(element_text)
    }

    /// Text of every match, in document order.
    pub fn query_texts(&self, selector: &str) -> Vec<String> {
        self.query(selector).into_iter().map(element_text).collect()
    }

    /// Attribute of the first match that carries it.
    pub fn query_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.query(selector)
            .into_iter()
            .find_map(|el| el.value().attr(attr).map(str::to_string))
    }
}

/// Matches of `selector` below `scope`, in document order.
pub fn query_within<'a>(scope: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(selector) {
        Some(sel) => scope.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Every descendant text node trimmed, empties dropped, concatenated.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<String>()
}

/// Like [`element_text`] but keeps node boundaries as newlines.
pub fn element_text_lines(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First span of `text` matched by `pattern`.
pub fn find_pattern<'t>(text: &'t str, pattern: &Regex) -> Option<&'t str> {
    pattern.find(text).map(|m| m.as_str())
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("invalid selector `{}`: {}", selector, e);
            None
        }
    }
}
