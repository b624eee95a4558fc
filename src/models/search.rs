use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PartNumber, Vendor};

/// What a single query against one vendor with one candidate produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    SocketText(String),
    NotFound,
    /// The vendor matched too many devices for the first hit to mean anything.
    TooManyResults,
    TransientError(String),
}

impl ExtractionOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionOutcome::SocketText(_) => "socket_text",
            ExtractionOutcome::NotFound => "not_found",
            ExtractionOutcome::TooManyResults => "too_many_results",
            ExtractionOutcome::TransientError(_) => "transient_error",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VendorOutcome {
    Found,
    NotFound,
    Error,
}

impl VendorOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorOutcome::Found => "found",
            VendorOutcome::NotFound => "not_found",
            VendorOutcome::Error => "error",
        }
    }
}

/// Outcome of searching one vendor for one user search. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VendorResult {
    pub vendor: Vendor,
    pub website: String,
    pub status: VendorOutcome,
    pub socket_info: Option<String>,
    pub part_used: String,
    pub modified: bool,
    pub chars_removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VendorResult {
    pub fn found(vendor: Vendor, original: &PartNumber, socket: String, part_used: &PartNumber) -> Self {
        let modified = part_used != original;
        let chars_removed = if modified {
            original.len().saturating_sub(part_used.len())
        } else {
            0
        };

        Self {
            vendor,
            website: vendor.display_name().to_string(),
            status: VendorOutcome::Found,
            socket_info: Some(socket),
            part_used: part_used.to_string(),
            modified,
            chars_removed,
            error: None,
        }
    }

    /// A confirmed negative; the part used is always the original.
    pub fn not_found(vendor: Vendor, original: &PartNumber) -> Self {
        Self {
            vendor,
            website: vendor.display_name().to_string(),
            status: VendorOutcome::NotFound,
            socket_info: None,
            part_used: original.to_string(),
            modified: false,
            chars_removed: 0,
            error: None,
        }
    }

    pub fn error(vendor: Vendor, original: &PartNumber, message: impl Into<String>) -> Self {
        Self {
            vendor,
            website: vendor.display_name().to_string(),
            status: VendorOutcome::Error,
            socket_info: None,
            part_used: original.to_string(),
            modified: false,
            chars_removed: 0,
            error: Some(message.into()),
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == VendorOutcome::Found
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSummary {
    pub total_searched: usize,
    pub found_count: usize,
    pub has_results: bool,
}

impl SearchSummary {
    pub fn from_results(results: &[VendorResult]) -> Self {
        let found_count = results.iter().filter(|r| r.is_found()).count();
        Self {
            total_searched: results.len(),
            found_count,
            has_results: found_count > 0,
        }
    }
}

/// Progress and results of one asynchronous search, as seen by polling clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJob {
    pub id: String,
    pub part_number: String,
    pub websites: Vec<Vendor>,
    pub status: JobStatus,
    pub progress: u8,
    pub current_step: String,
    pub results: Vec<VendorResult>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub summary: Option<SearchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchJob {
    pub fn new(id: String, part_number: &PartNumber, websites: Vec<Vendor>) -> Self {
        Self {
            id,
            part_number: part_number.to_string(),
            websites,
            status: JobStatus::Running,
            progress: 0,
            current_step: format!("Starting search for part number: {}", part_number),
            results: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            summary: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Running
    }

    pub fn complete(&mut self) {
        if self.is_finished() {
            return;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.current_step = "Search completed!".to_string();
        self.summary = Some(SearchSummary::from_results(&self.results));
        self.end_time = Some(Utc::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_finished() {
            return;
        }
        let message = message.into();
        self.status = JobStatus::Error;
        self.current_step = format!("Error: {}", message);
        self.error = Some(message);
        self.end_time = Some(Utc::now());
    }
}
