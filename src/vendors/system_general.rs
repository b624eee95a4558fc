use async_trait::async_trait;
use scraper::Html;

use super::SiteDriver;
use crate::browser::BrowserSession;
use crate::config::BrowserConfig;
use crate::extraction::{element_text, first_match, select_all, select_within, Strategy};
use crate::models::{ExtractionOutcome, PartNumber, Vendor};
use crate::utils::error::{AppError, Result};

pub const SEARCH_URL: &str = "https://www.systemgenerallimited.com/device-search";

const SEARCH_FRAME: &str = "iframe.Z8YsjS";
const SEARCH_SECTION: &str = r#"section[data-cb-name="cbTable"]"#;
const PART_INPUT: &str = r#"input[name="Value2_1"]"#;
const SEARCH_BUTTON: &str = r#"input[name="searchID"]"#;
const RESULT_TABLE: &str = "table.cbResultSetTable";
const RECORD_MESSAGE: &str = "p.cbResultSetRecordMessage";
const NO_RECORDS: &str = "No records found";

/// Zero-based position of the "SKB Name" column.
const SKB_COLUMN: usize = 4;

static STRATEGIES: [Strategy<()>; 1] = [Strategy::new("skb_column", skb_column)];

pub struct SystemGeneralDriver {
    browser: BrowserConfig,
}

impl SystemGeneralDriver {
    pub fn new(browser: BrowserConfig) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl SiteDriver for SystemGeneralDriver {
    fn vendor(&self) -> Vendor {
        Vendor::SystemGeneral
    }

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        candidate: &PartNumber,
        _original: &PartNumber,
    ) -> Result<ExtractionOutcome> {
        session.goto(SEARCH_URL).await?;

        if !session.enter_frame(SEARCH_FRAME, self.browser.element_timeout()).await? {
            return Err(AppError::timeout(SEARCH_FRAME));
        }
        if !session.wait_for(SEARCH_SECTION, self.browser.element_timeout()).await? {
            return Err(AppError::timeout(SEARCH_SECTION));
        }

        session.fill(PART_INPUT, candidate.as_str()).await?;
        session.click(SEARCH_BUTTON).await?;

        if !session.wait_for(RESULT_TABLE, self.browser.result_timeout()).await? {
            // Shorter second wait: the message renders together with the empty result set.
            let message_timeout = self.browser.result_timeout() / 2;
            if !session.wait_for(RECORD_MESSAGE, message_timeout).await? {
                tracing::debug!(candidate = %candidate, "Neither results table nor record message appeared");
                return Ok(ExtractionOutcome::NotFound);
            }

            let message = session.text_of(RECORD_MESSAGE).await?.unwrap_or_default();
            if message.contains(NO_RECORDS) {
                tracing::debug!(candidate = %candidate, "No records found");
            } else {
                tracing::debug!(candidate = %candidate, message = %message, "Record message without results table");
            }
            return Ok(ExtractionOutcome::NotFound);
        }

        tokio::time::sleep(self.browser.settle(3)).await;

        let html = session.content().await?;
        Ok(match extract_skb_name(&html) {
            Some(skb) => ExtractionOutcome::SocketText(skb),
            None => ExtractionOutcome::NotFound,
        })
    }
}

/// The SKB name from the first data row of the results table.
pub fn extract_skb_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    first_match(Vendor::SystemGeneral, &STRATEGIES, &document, &())
}

fn skb_column(document: &Html, _: &()) -> Option<String> {
    let table = select_all(document, RESULT_TABLE).into_iter().next()?;
    let row = select_within(table, "tbody tr")
        .into_iter()
        .find(|row| !select_within(*row, "td").is_empty())?;
    let cells = select_within(row, "td");
    cells.get(SKB_COLUMN).map(|cell| element_text(*cell))
}
