use async_trait::async_trait;
use scraper::{ElementRef, Html};

use super::SiteDriver;
use crate::browser::BrowserSession;
use crate::config::BrowserConfig;
use crate::extraction::{element_text, first_match, select_all, select_within, Strategy};
use crate::models::{ExtractionOutcome, PartNumber, Vendor};
use crate::telemetry::metric_names;
use crate::utils::error::{AppError, Result};

pub const SEARCH_URL: &str = "https://dataio.com/Support/Device-Search";

// The placeholder typo is the site's own.
const SEARCH_INPUT: &str = r#"input[placeholder="Part #, Adapter or Manfacturer"]"#;
const SEARCH_BUTTON: &str = r#"input[type="button"][value="SEARCH"]"#;
const RESULT_LINK: &str =
    r#"a[id*="dnn_ctr6237_View_lvDeviceSearchResults_ctrl"][id*="lnkDeviceSearchResultDevice"]"#;
const NO_RESULTS_MESSAGE: &str = "div#dnn_ctr6237_View_pnlSearchResults h3";
const NO_RESULTS: &str = "No search results found.";
const DETAIL_ROW: &str = r#"div[class="row"]"#;

const ADAPTER_LABEL: &str = "Standard Adapter";
const STOP_WORDS: [&str; 4] = ["Standard Adapter", "Sockets", "Socket", "Adapter"];
const PAGE_SCAN_LIMIT: usize = 20;

/// Value lookups tried against the containers around the adapter label, then
/// a bounded scan of the whole page.
static STRATEGIES: [Strategy<()>; 5] = [
    Strategy::new("adapter_data_field", adapter_data_field),
    Strategy::new("socket_column", socket_column),
    Strategy::new("value_column", value_column),
    Strategy::new("second_column", second_column),
    Strategy::new("page_wide_fallback", page_wide_fallback),
];

pub struct DataIoDriver {
    browser: BrowserConfig,
}

impl DataIoDriver {
    pub fn new(browser: BrowserConfig) -> Self {
        Self { browser }
    }

    async fn read_detail_page(&self, session: &dyn BrowserSession, candidate: &PartNumber) -> Result<ExtractionOutcome> {
        session.click(RESULT_LINK).await?;
        session.wait_for_navigation(self.browser.result_timeout()).await?;
        tokio::time::sleep(self.browser.settle(3)).await;

        if !session.wait_for(DETAIL_ROW, self.browser.result_timeout()).await? {
            tracing::debug!(candidate = %candidate, "Detail page never rendered its rows");
            return Ok(ExtractionOutcome::NotFound);
        }
        tokio::time::sleep(self.browser.settle(1)).await;

        let html = session.content().await?;
        Ok(match extract_standard_adapter(&html) {
            Some(adapter) => ExtractionOutcome::SocketText(adapter),
            None => ExtractionOutcome::NotFound,
        })
    }
}

#[async_trait]
impl SiteDriver for DataIoDriver {
    fn vendor(&self) -> Vendor {
        Vendor::DataIo
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        candidate: &PartNumber,
        _original: &PartNumber,
    ) -> Result<ExtractionOutcome> {
        session.goto(SEARCH_URL).await?;

        if !session.wait_for(SEARCH_INPUT, self.browser.element_timeout()).await? {
            return Err(AppError::timeout("DataIO search input"));
        }
        session.fill(SEARCH_INPUT, candidate.as_str()).await?;
        tokio::time::sleep(self.browser.settle(2)).await;

        if !session.wait_for(SEARCH_BUTTON, self.browser.element_timeout()).await? {
            return Err(AppError::timeout("DataIO search button"));
        }
        session.click(SEARCH_BUTTON).await?;
        tokio::time::sleep(self.browser.settle(2)).await;

        if session.count(RESULT_LINK).await? > 0 {
            return self.read_detail_page(session, candidate).await;
        }

        match session.text_of(NO_RESULTS_MESSAGE).await? {
            Some(message) if message.contains(NO_RESULTS) => {
                tracing::debug!(candidate = %candidate, "No search results found");
            }
            message => {
                // Neither results nor the explicit message: possibly a layout change.
                tracing::warn!(
                    candidate = %candidate,
                    message = ?message,
                    "Ambiguous search page, treating as not found"
                );
                metrics::counter!(metric_names::AMBIGUOUS_PAGES, "vendor" => Vendor::DataIo.id()).increment(1);
            }
        }
        Ok(ExtractionOutcome::NotFound)
    }
}

/// The value shown next to the "Standard Adapter" label on a device page.
pub fn extract_standard_adapter(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_match(Vendor::DataIo, &STRATEGIES, &document, &())
}

fn find_label(document: &Html) -> Option<ElementRef<'_>> {
    select_all(document, "body *").into_iter().find(|element| {
        element_text(*element) == ADAPTER_LABEL
            && !element
                .children()
                .filter_map(ElementRef::wrap)
                .any(|child| element_text(child) == ADAPTER_LABEL)
    })
}

/// Ancestors of the label that look like layout rows or containers, nearest first.
fn label_containers(document: &Html) -> Vec<ElementRef<'_>> {
    let Some(label) = find_label(document) else {
        return Vec::new();
    };
    label
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|ancestor| {
            ancestor
                .value()
                .attr("class")
                .is_some_and(|class| class.contains("row") || class.contains("container"))
        })
        .collect()
}

fn is_adapter_value(text: &str) -> bool {
    !text.is_empty() && text != ADAPTER_LABEL && !text.contains(ADAPTER_LABEL) && text != "Sockets"
}

fn first_value_in_containers(document: &Html, css: &str, extra: fn(&str) -> bool) -> Option<String> {
    label_containers(document).into_iter().find_map(|container| {
        select_within(container, css)
            .into_iter()
            .map(element_text)
            .find(|text| extra(text) && is_adapter_value(text))
    })
}

fn adapter_data_field(document: &Html, _: &()) -> Option<String> {
    first_value_in_containers(document, r#"div[id*="dataPartNumber"]"#, |_| true)
}

fn socket_column(document: &Html, _: &()) -> Option<String> {
    first_value_in_containers(document, r#"div[class*="col"]"#, |text| text.contains("Socket"))
}

fn value_column(document: &Html, _: &()) -> Option<String> {
    first_value_in_containers(document, r#"div[class*="col-sm-5"]"#, |_| true)
}

fn second_column(document: &Html, _: &()) -> Option<String> {
    first_value_in_containers(document, r#"div[class*="col"]:nth-child(2)"#, |_| true)
}

fn page_wide_fallback(document: &Html, _: &()) -> Option<String> {
    if label_containers(document).is_empty() {
        return None;
    }
    select_all(document, r#"div[id*="dataPartNumber"], span, p"#)
        .into_iter()
        .take(PAGE_SCAN_LIMIT)
        .map(element_text)
        .find(|text| {
            let len = text.chars().count();
            !STOP_WORDS.contains(&text.as_str()) && len > 1 && len < 50
        })
}
