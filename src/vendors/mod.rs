//! The three vendor sites behind a uniform `query(candidate)` capability.

pub mod bpmicro;
pub mod dataio;
pub mod system_general;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::browser::{BrowserSession, SessionFactory};
use crate::config::AppConfig;
use crate::models::{ExtractionOutcome, PartNumber, Vendor};
use crate::telemetry::metric_names;
use crate::utils::error::Result;

pub use bpmicro::BpMicroDriver;
pub use dataio::DataIoDriver;
pub use system_general::SystemGeneralDriver;

/// One vendor's single-candidate lookup. Never fails: automation problems
/// come back as [`ExtractionOutcome::TransientError`]. `candidate` is what
/// gets typed into the vendor search; `original` is the part number the user
/// asked for, which `candidate` may be a trimmed form of.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VendorSite: Send + Sync {
    fn vendor(&self) -> Vendor;

    async fn query(&self, candidate: &PartNumber, original: &PartNumber) -> ExtractionOutcome;
}

/// The browsing steps for one vendor, run against a session it does not own.
#[async_trait]
pub trait SiteDriver: Send + Sync {
    fn vendor(&self) -> Vendor;

    async fn drive(
        &self,
        session: &dyn BrowserSession,
        candidate: &PartNumber,
        original: &PartNumber,
    ) -> Result<ExtractionOutcome>;
}

/// Runs a [`SiteDriver`] in a fresh browser session per query and always
/// tears the session down afterwards.
pub struct BrowserSite<D> {
    driver: D,
    sessions: Arc<dyn SessionFactory>,
}

impl<D: SiteDriver> BrowserSite<D> {
    pub fn new(driver: D, sessions: Arc<dyn SessionFactory>) -> Self {
        Self { driver, sessions }
    }
}

#[async_trait]
impl<D: SiteDriver> VendorSite for BrowserSite<D> {
    fn vendor(&self) -> Vendor {
        self.driver.vendor()
    }

    async fn query(&self, candidate: &PartNumber, original: &PartNumber) -> ExtractionOutcome {
        let vendor = self.driver.vendor();
        let started = Instant::now();

        let session = match self.sessions.open().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(vendor = vendor.id(), "Could not open browser session: {}", e);
                return ExtractionOutcome::TransientError(e.to_string());
            }
        };

        let outcome = match self.driver.drive(session.as_ref(), candidate, original).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(vendor = vendor.id(), candidate = %candidate, "Query failed: {}", e);
                ExtractionOutcome::TransientError(e.to_string())
            }
        };

        if let Err(e) = session.close().await {
            tracing::debug!(vendor = vendor.id(), "Session close failed: {}", e);
        }

        metrics::counter!(
            metric_names::QUERY_OUTCOMES,
            "vendor" => vendor.id(),
            "outcome" => outcome.kind()
        )
        .increment(1);
        tracing::debug!(
            vendor = vendor.id(),
            candidate = %candidate,
            outcome = outcome.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query finished"
        );

        outcome
    }
}

/// Closed mapping from vendor to its site implementation.
#[derive(Clone, Default)]
pub struct VendorRegistry {
    sites: HashMap<Vendor, Arc<dyn VendorSite>>,
}

impl VendorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All three vendors, each driving real browser sessions from `sessions`.
    pub fn with_browser(config: &AppConfig, sessions: Arc<dyn SessionFactory>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BrowserSite::new(
            SystemGeneralDriver::new(config.browser.clone()),
            Arc::clone(&sessions),
        )));
        registry.register(Arc::new(BrowserSite::new(
            DataIoDriver::new(config.browser.clone()),
            Arc::clone(&sessions),
        )));
        registry.register(Arc::new(BrowserSite::new(
            BpMicroDriver::new(config.browser.clone(), config.resolver.too_broad_threshold),
            sessions,
        )));
        registry
    }

    /// Registers `site` under its own vendor, replacing any previous entry.
    pub fn register(&mut self, site: Arc<dyn VendorSite>) {
        let vendor = site.vendor();
        if self.sites.insert(vendor, site).is_some() {
            tracing::debug!("Replaced site for {}", vendor);
        }
    }

    pub fn get(&self, vendor: Vendor) -> Option<Arc<dyn VendorSite>> {
        self.sites.get(&vendor).cloned()
    }

    pub fn is_registered(&self, vendor: Vendor) -> bool {
        self.sites.contains_key(&vendor)
    }

    /// Registered vendors in priority order.
    pub fn vendors(&self) -> Vec<Vendor> {
        let mut vendors: Vec<Vendor> = self.sites.keys().copied().collect();
        vendors.sort();
        vendors
    }
}
