//! Plain-text output for the command-line front end.

use chrono::{DateTime, Local};
use std::path::Path;

use crate::models::{PartNumber, VendorOutcome, VendorResult};
use crate::utils::error::Result;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The single-search snapshot written to the result file. Found results
/// record the part number actually used.
pub fn render_result_file(original: &PartNumber, result: &VendorResult, searched_at: DateTime<Local>) -> String {
    let mut out = match result.status {
        VendorOutcome::Found => format!(
            "Part Number: {}\nSKB Name: {}\n",
            result.part_used,
            result.socket_info.as_deref().unwrap_or_default()
        ),
        VendorOutcome::NotFound => format!(
            "Part Number: {}\nWebsite: {}\nStatus: NO RESULTS FOUND\n",
            original,
            result.vendor.id()
        ),
        VendorOutcome::Error => format!(
            "Part Number: {}\nWebsite: {}\nStatus: FAILED\nError: {}\n",
            original,
            result.vendor.id(),
            result.error.as_deref().unwrap_or("unknown error")
        ),
    };
    out.push_str(&format!("Search Date: {}\n", searched_at.format(DATE_FORMAT)));
    out
}

/// Overwrites `path` with the snapshot for `result`.
pub async fn write_result_file(path: impl AsRef<Path>, original: &PartNumber, result: &VendorResult) -> Result<()> {
    let contents = render_result_file(original, result, Local::now());
    tokio::fs::write(path.as_ref(), contents).await?;
    tracing::info!("Result saved to {}", path.as_ref().display());
    Ok(())
}

pub fn render_console_summary(original: &PartNumber, result: &VendorResult) -> String {
    match result.status {
        VendorOutcome::Found => format!(
            "Final Result:\nOriginal Part Number: {}\nPart Number Used: {}\nResult: {}",
            original,
            result.part_used,
            result.socket_info.as_deref().unwrap_or_default()
        ),
        VendorOutcome::NotFound => format!(
            "No results found for part number '{}' on {}",
            original, result.website
        ),
        VendorOutcome::Error => format!(
            "Search failed on {}: {}",
            result.website,
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}
