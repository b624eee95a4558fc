//! Ordered extraction strategies over a page snapshot.
//!
//! Each vendor lists its fallbacks as a slice of [`Strategy`] values that are
//! tried in order; the first one producing text wins.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::models::Vendor;

/// Socket names as the vendors print them: SM48D, ASM-TSOP48, FVE4ASM...
pub static SOCKET_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:ASM|FVE|SM)[A-Z0-9-]*\d[A-Z0-9-]*\b").expect("valid socket token regex")
});

/// `Socket Modules: SM48D, SM48DB`
pub static SOCKET_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:socket modules?)\s*:?\s*([A-Z0-9][A-Z0-9, ().-]*)").expect("valid socket label regex")
});

/// A bare product code in link text.
pub static LINK_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{10,}$").expect("valid link token regex"));

pub struct Strategy<C: ?Sized> {
    pub name: &'static str,
    pub run: fn(&Html, &C) -> Option<String>,
}

impl<C: ?Sized> Strategy<C> {
    pub const fn new(name: &'static str, run: fn(&Html, &C) -> Option<String>) -> Self {
        Self { name, run }
    }
}

/// Applies `strategies` in order and returns the first non-empty value.
pub fn first_match<C: ?Sized>(
    vendor: Vendor,
    strategies: &[Strategy<C>],
    document: &Html,
    context: &C,
) -> Option<String> {
    for strategy in strategies {
        match (strategy.run)(document, context) {
            Some(value) if !value.trim().is_empty() => {
                tracing::debug!(vendor = vendor.id(), strategy = strategy.name, value = %value, "Extraction strategy matched");
                return Some(value.trim().to_string());
            }
            _ => {
                tracing::debug!(vendor = vendor.id(), strategy = strategy.name, "Extraction strategy found nothing");
            }
        }
    }
    None
}

/// Parses `selector`, treating an invalid selector as matching nothing.
pub fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

pub fn select_all<'a>(root: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => root.select(&selector).collect(),
        None => Vec::new(),
    }
}

pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => element.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// Visible text of an element with runs of whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every socket-shaped token in `text`, in order of appearance.
pub fn socket_tokens(text: &str) -> Vec<String> {
    SOCKET_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
