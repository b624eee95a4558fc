use crate::config::ResolverConfig;
use crate::models::{ExtractionOutcome, PartNumber};
use crate::vendors::VendorSite;

/// What trying every variation of a part number against one vendor produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found { socket: String, part_used: PartNumber },
    /// Every candidate was a confirmed negative or was skipped as too broad.
    NotFound,
    /// No candidate produced an answer either way; carries the last error.
    Failed { error: String },
}

/// Retries a vendor with progressively shorter part numbers until one
/// yields a socket.
#[derive(Debug, Clone)]
pub struct VariationResolver {
    config: ResolverConfig,
}

impl VariationResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn candidates(&self, original: &PartNumber) -> Vec<PartNumber> {
        original.variations(self.config.extra_trims)
    }

    /// Candidates are tried strictly in order and the first success wins, so a
    /// found result always belongs to the longest matching candidate.
    pub async fn resolve(&self, site: &dyn VendorSite, original: &PartNumber) -> Resolution {
        let vendor = site.vendor();
        let candidates = self.candidates(original);
        tracing::debug!(vendor = vendor.id(), ?candidates, "Resolving part number");

        let mut confirmed_negative = false;
        let mut last_error = None;

        for (attempt, candidate) in candidates.iter().enumerate() {
            tracing::debug!(vendor = vendor.id(), attempt = attempt + 1, candidate = %candidate, "Trying candidate");

            let mut outcome = site.query(candidate, original).await;
            if outcome == ExtractionOutcome::TooManyResults {
                tracing::info!(vendor = vendor.id(), candidate = %candidate, "Query too broad, retrying once");
                tokio::time::sleep(self.config.too_broad_retry_delay()).await;
                outcome = site.query(candidate, original).await;
            }

            match outcome {
                ExtractionOutcome::SocketText(socket) if !socket.trim().is_empty() => {
                    tracing::info!(vendor = vendor.id(), candidate = %candidate, socket = %socket.trim(), "Socket found");
                    return Resolution::Found {
                        socket: socket.trim().to_string(),
                        part_used: candidate.clone(),
                    };
                }
                ExtractionOutcome::SocketText(_) | ExtractionOutcome::NotFound => {
                    confirmed_negative = true;
                }
                ExtractionOutcome::TooManyResults => {
                    tracing::info!(vendor = vendor.id(), candidate = %candidate, "Still too broad, skipping candidate");
                    confirmed_negative = true;
                }
                ExtractionOutcome::TransientError(error) => {
                    tracing::warn!(vendor = vendor.id(), candidate = %candidate, "Attempt failed: {}", error);
                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(error) if !confirmed_negative => Resolution::Failed { error },
            _ => {
                tracing::info!(
                    vendor = vendor.id(),
                    part_number = %original,
                    attempts = candidates.len(),
                    "No result for any variation"
                );
                Resolution::NotFound
            }
        }
    }
}
