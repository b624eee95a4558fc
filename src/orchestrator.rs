use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::models::{PartNumber, Vendor, VendorResult};
use crate::resolver::{Resolution, VariationResolver};
use crate::telemetry::metric_names;
use crate::utils::error::{AppError, Result};
use crate::vendors::VendorRegistry;

/// Receives progress as vendors start and finish.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn vendor_started(&self, vendor: Vendor, index: usize, total: usize);

    async fn vendor_finished(&self, result: &VendorResult, completed: usize, total: usize);
}

pub struct NoopReporter;

#[async_trait]
impl ProgressReporter for NoopReporter {
    async fn vendor_started(&self, _vendor: Vendor, _index: usize, _total: usize) {}

    async fn vendor_finished(&self, _result: &VendorResult, _completed: usize, _total: usize) {}
}

/// Fans one search out to the selected vendors, one after another.
#[derive(Clone)]
pub struct SearchOrchestrator {
    registry: Arc<VendorRegistry>,
    resolver: Arc<VariationResolver>,
}

impl SearchOrchestrator {
    pub fn new(registry: Arc<VendorRegistry>, resolver: Arc<VariationResolver>) -> Self {
        Self { registry, resolver }
    }

    /// Runs every selected vendor in priority order. A vendor that fails, or
    /// panics, yields an `Error` result and the remaining vendors still run.
    pub async fn run(
        &self,
        part_number: &PartNumber,
        vendors: &[Vendor],
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<VendorResult>> {
        if vendors.is_empty() {
            return Err(AppError::Validation("At least one website must be selected".to_string()));
        }

        let mut selected = vendors.to_vec();
        selected.sort();
        selected.dedup();
        let total = selected.len();

        tracing::info!(part_number = %part_number, ?selected, "Starting search");

        let mut results = Vec::with_capacity(total);
        for (index, vendor) in selected.into_iter().enumerate() {
            reporter.vendor_started(vendor, index, total).await;

            let started = Instant::now();
            let result = self.search_vendor(vendor, part_number).await;

            metrics::counter!(
                metric_names::VENDOR_RESULTS,
                "vendor" => vendor.id(),
                "status" => result.status.as_str()
            )
            .increment(1);
            metrics::histogram!(metric_names::VENDOR_DURATION, "vendor" => vendor.id())
                .record(started.elapsed().as_secs_f64());
            tracing::info!(
                vendor = vendor.id(),
                status = result.status.as_str(),
                part_used = %result.part_used,
                "Vendor search finished"
            );

            results.push(result);
            reporter.vendor_finished(&results[index], index + 1, total).await;
        }

        Ok(results)
    }

    /// Resolves one vendor inside its own task so a panic stays contained.
    async fn search_vendor(&self, vendor: Vendor, part_number: &PartNumber) -> VendorResult {
        let Some(site) = self.registry.get(vendor) else {
            tracing::warn!(vendor = vendor.id(), "No site registered");
            return VendorResult::error(vendor, part_number, format!("{} search is not available", vendor));
        };

        let resolver = Arc::clone(&self.resolver);
        let original = part_number.clone();
        let handle = tokio::spawn(async move { resolver.resolve(site.as_ref(), &original).await });

        match handle.await {
            Ok(Resolution::Found { socket, part_used }) => VendorResult::found(vendor, part_number, socket, &part_used),
            Ok(Resolution::NotFound) => VendorResult::not_found(vendor, part_number),
            Ok(Resolution::Failed { error }) => VendorResult::error(vendor, part_number, error),
            Err(e) => {
                let error = AppError::from(e);
                tracing::error!(vendor = vendor.id(), "Vendor search aborted: {}", error);
                VendorResult::error(vendor, part_number, error.to_string())
            }
        }
    }
}
