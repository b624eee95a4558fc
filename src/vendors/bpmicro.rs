//! BPM Microsystems device search.
//!
//! The search lives in an embedded document with a live-search input. Picking
//! the first suggestion either opens the general product page on the main site
//! or re-renders the embedded document with a device table, so extraction
//! first classifies where the click landed.

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use super::SiteDriver;
use crate::browser::BrowserSession;
use crate::config::BrowserConfig;
use crate::extraction::{
    element_text, first_match, normalize_whitespace, select_all, select_within, socket_tokens, Strategy, LINK_TOKEN,
    SOCKET_LABEL, SOCKET_TOKEN,
};
use crate::models::{ExtractionOutcome, PartNumber, Vendor};
use crate::utils::error::{AppError, Result};

pub const SEARCH_URL: &str = "https://www.bpmmicro.com/device-search/";

const SEARCH_FRAME: &str = "iframe#myIframe";
const SEARCH_INPUT: &str = r#"input[placeholder="Type to search for a device..."]"#;
const SEARCH_RESULTS: &str = "div#search-results";
const FOUND_COUNT: &str = "div#qty_found";
const FIRST_SUGGESTION: &str = "div#search-results ul li";
const NO_RESULTS: &str = "No results found";

const MAIN_HOST: &str = "bpmmicro.com";

/// Row labels that precede the socket list, compared lowercase.
const ROW_LABELS: [&str; 2] = ["socket module", "socket adapter"];

/// Banner and boilerplate fragments that are never a socket name.
const DENYLIST: [&str; 12] = [
    "not found",
    "contact",
    "request a quote",
    "sign up",
    "subscribe",
    "newsletter",
    "cookie",
    "learn more",
    "click here",
    "all rights reserved",
    "call for",
    "coming soon",
];

static FOUND_COUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*)\s+found").expect("valid found count regex"));

static PRODUCT_PAGE: [Strategy<()>; 2] = [
    Strategy::new("labelled_row", labelled_row),
    Strategy::new("table_pattern", table_pattern),
];

static SEARCH_FRAME_PAGE: [Strategy<()>; 4] = [
    Strategy::new("labelled_row", labelled_row),
    Strategy::new("label_pattern", label_pattern),
    Strategy::new("heading_pattern", heading_pattern),
    Strategy::new("link_token", link_token),
];

/// Where clicking the first suggestion took the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    ProductPage,
    SearchFrame,
}

impl Landing {
    pub fn classify(current_url: &str) -> Self {
        let Ok(url) = Url::parse(current_url) else {
            return Landing::SearchFrame;
        };
        let on_main_site = url
            .host_str()
            .is_some_and(|host| host == MAIN_HOST || host.ends_with(".bpmmicro.com"));

        if on_main_site && !url.path().contains("device-search") {
            Landing::ProductPage
        } else {
            Landing::SearchFrame
        }
    }

    /// Classifies the page after the suggestion click. A click that left the
    /// embedded search document where it was stays on the frame path, wherever
    /// that document is hosted.
    pub fn after_click(search_url: &str, current_url: &str) -> Self {
        if current_url == search_url {
            Landing::SearchFrame
        } else {
            Landing::classify(current_url)
        }
    }

    fn strategies(&self) -> &'static [Strategy<()>] {
        match self {
            Landing::ProductPage => &PRODUCT_PAGE,
            Landing::SearchFrame => &SEARCH_FRAME_PAGE,
        }
    }
}

pub struct BpMicroDriver {
    browser: BrowserConfig,
    too_broad_threshold: u64,
}

impl BpMicroDriver {
    pub fn new(browser: BrowserConfig, too_broad_threshold: u64) -> Self {
        Self {
            browser,
            too_broad_threshold,
        }
    }

    /// Reads the live-search summary. `Some` short-circuits the query.
    async fn precheck(&self, session: &dyn BrowserSession, candidate: &PartNumber) -> Result<Option<ExtractionOutcome>> {
        let results = session.text_of(SEARCH_RESULTS).await?.unwrap_or_default();
        if results.contains(NO_RESULTS) {
            tracing::debug!(candidate = %candidate, "No results found");
            return Ok(Some(ExtractionOutcome::NotFound));
        }

        let Some(count) = session.text_of(FOUND_COUNT).await?.as_deref().and_then(parse_found_count) else {
            return Ok(None);
        };
        if count == 0 {
            tracing::debug!(candidate = %candidate, "Search reported 0 found");
            return Ok(Some(ExtractionOutcome::NotFound));
        }
        if count > self.too_broad_threshold {
            tracing::info!(candidate = %candidate, count, "Search too broad");
            return Ok(Some(ExtractionOutcome::TooManyResults));
        }
        Ok(None)
    }
}

#[async_trait]
impl SiteDriver for BpMicroDriver {
    fn vendor(&self) -> Vendor {
        Vendor::BpMicro
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        candidate: &PartNumber,
        original: &PartNumber,
    ) -> Result<ExtractionOutcome> {
        session.goto(SEARCH_URL).await?;

        if !session.enter_frame(SEARCH_FRAME, self.browser.element_timeout()).await? {
            return Err(AppError::timeout(SEARCH_FRAME));
        }
        tokio::time::sleep(self.browser.settle(1)).await;

        if !session.wait_for(SEARCH_INPUT, self.browser.element_timeout()).await? {
            return Err(AppError::timeout("BPMicro search input"));
        }
        session.fill(SEARCH_INPUT, candidate.as_str()).await?;
        tokio::time::sleep(self.browser.settle(3)).await;

        if !session.wait_for(SEARCH_RESULTS, self.browser.result_timeout()).await? {
            tracing::debug!(candidate = %candidate, "No search results appeared");
            return Ok(ExtractionOutcome::NotFound);
        }

        if let Some(outcome) = self.precheck(session, candidate).await? {
            return Ok(outcome);
        }

        if !session.wait_for(FIRST_SUGGESTION, self.browser.result_timeout() / 3).await? {
            tracing::debug!(candidate = %candidate, "No suggestion appeared");
            return Ok(ExtractionOutcome::NotFound);
        }
        let search_url = session.current_url().await?;
        session.click(FIRST_SUGGESTION).await?;
        tokio::time::sleep(self.browser.settle(3)).await;
        if let Err(e) = session.wait_for_navigation(self.browser.result_timeout()).await {
            tracing::debug!(candidate = %candidate, "No navigation after suggestion click: {}", e);
        }
        tokio::time::sleep(self.browser.settle(3)).await;

        let landing = Landing::after_click(&search_url, &session.current_url().await?);
        let html = session.content().await?;
        tracing::debug!(candidate = %candidate, ?landing, "Extracting socket modules");

        Ok(match extract_socket_modules(&html, landing) {
            Some(text) => {
                let text = strip_echoed_part(&text, original.as_str());
                ExtractionOutcome::SocketText(strip_echoed_part(&text, candidate.as_str()))
            }
            None => ExtractionOutcome::NotFound,
        })
    }
}

/// Socket module text from a device page, using the fallbacks for `landing`.
pub fn extract_socket_modules(html: &str, landing: Landing) -> Option<String> {
    let document = Html::parse_document(html);
    first_match(Vendor::BpMicro, landing.strategies(), &document, &())
}

/// The number in "1,234 found".
pub fn parse_found_count(text: &str) -> Option<u64> {
    let captures = FOUND_COUNT_PATTERN.captures(text)?;
    captures[1].replace(',', "").parse().ok()
}

/// Removes tokens equal to `part` (ignoring case) from a comma or space
/// separated list. Text that is a single token, or that would be emptied, is
/// returned unchanged.
pub fn strip_echoed_part(text: &str, part: &str) -> String {
    let tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.len() < 2 || !tokens.iter().any(|token| token.eq_ignore_ascii_case(part)) {
        return text.to_string();
    }

    let kept: Vec<String> = text
        .split(',')
        .map(|segment| {
            segment
                .split_whitespace()
                .filter(|word| !word.eq_ignore_ascii_case(part))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|segment| !segment.is_empty())
        .collect();

    if kept.is_empty() {
        text.to_string()
    } else {
        kept.join(", ")
    }
}

fn is_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    DENYLIST.iter().any(|fragment| lower.contains(fragment))
}

fn has_row_label(text: &str) -> bool {
    let lower = text.to_lowercase();
    ROW_LABELS.iter().any(|label| lower.contains(label))
}

fn is_socket_value(text: &str) -> bool {
    !text.is_empty() && !has_row_label(text) && !is_boilerplate(text) && text.chars().any(|c| c.is_ascii_digit())
}

fn labelled_row(document: &Html, _: &()) -> Option<String> {
    select_all(document, "table tr")
        .into_iter()
        .filter(|row| has_row_label(&element_text(*row)))
        .find_map(|row| {
            select_within(row, "td, th")
                .into_iter()
                .map(element_text)
                .find(|cell| is_socket_value(cell))
        })
}

fn table_pattern(document: &Html, _: &()) -> Option<String> {
    select_all(document, "table").into_iter().find_map(|table| {
        let mut tokens = socket_tokens(&element_text(table));
        let mut seen = HashSet::new();
        tokens.retain(|token| seen.insert(token.clone()));
        (!tokens.is_empty()).then(|| tokens.join(", "))
    })
}

fn label_pattern(document: &Html, _: &()) -> Option<String> {
    select_all(document, "table")
        .into_iter()
        .map(element_text)
        .filter(|text| has_row_label(text))
        .find_map(|text| {
            let captures = SOCKET_LABEL.captures(&text)?;
            let value = captures[1].trim_matches(|c: char| c == ',' || c.is_whitespace()).to_string();
            is_socket_value(&value).then_some(value)
        })
}

fn heading_pattern(document: &Html, _: &()) -> Option<String> {
    select_all(document, "h1, h2, title")
        .into_iter()
        .map(element_text)
        .filter(|text| !is_boilerplate(text))
        .find_map(|text| SOCKET_TOKEN.find(&text).map(|m| m.as_str().to_string()))
}

fn link_token(document: &Html, _: &()) -> Option<String> {
    select_all(document, "a")
        .into_iter()
        .map(|link| normalize_whitespace(&link.text().collect::<String>()))
        .find(|text| LINK_TOKEN.is_match(text))
}
