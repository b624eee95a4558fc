// Shared fixtures for the integration tests

pub mod api_tests;
pub mod search_flow_tests;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use socket_finder::{
    config::{JobsConfig, ResolverConfig},
    jobs::SearchJobTracker,
    models::{ExtractionOutcome, PartNumber, Vendor},
    orchestrator::SearchOrchestrator,
    resolver::VariationResolver,
    vendors::{VendorRegistry, VendorSite},
    web::{create_router, AppState},
    AppConfig,
};

/// Vendor site that answers from a fixed table instead of a browser.
pub struct FakeSite {
    vendor: Vendor,
    answers: HashMap<String, ExtractionOutcome>,
    fallback: ExtractionOutcome,
    delay: Duration,
    queried: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new(vendor: Vendor) -> Self {
        Self {
            vendor,
            answers: HashMap::new(),
            fallback: ExtractionOutcome::NotFound,
            delay: Duration::ZERO,
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(mut self, candidate: &str, outcome: ExtractionOutcome) -> Self {
        self.answers.insert(candidate.to_string(), outcome);
        self
    }

    pub fn otherwise(mut self, outcome: ExtractionOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl VendorSite for FakeSite {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    async fn query(&self, candidate: &PartNumber, _original: &PartNumber) -> ExtractionOutcome {
        self.queried.lock().unwrap().push(candidate.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answers
            .get(candidate.as_str())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Test configuration for integration tests
pub fn get_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.resolver.too_broad_retry_delay_ms = 0;
    config.jobs = JobsConfig {
        max_concurrent_jobs: 2,
        ..JobsConfig::default()
    };
    config
}

pub fn create_test_app_state(sites: Vec<Arc<FakeSite>>) -> AppState {
    let config = get_test_config();

    let mut registry = VendorRegistry::new();
    for site in sites {
        registry.register(site);
    }
    let resolver = VariationResolver::new(ResolverConfig {
        too_broad_retry_delay_ms: 0,
        ..config.resolver.clone()
    });
    let orchestrator = SearchOrchestrator::new(Arc::new(registry), Arc::new(resolver));

    AppState {
        tracker: Arc::new(SearchJobTracker::new(orchestrator, config.jobs.clone())),
        config,
        metrics: None,
    }
}

pub fn create_test_app(sites: Vec<FakeSite>) -> Router {
    create_router(create_test_app_state(sites.into_iter().map(Arc::new).collect()))
}

/// Sends one request and returns the status with the decoded JSON body.
pub async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request.body(match body {
        Some(body) => Body::from(body.to_string()),
        None => Body::empty(),
    })?;

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

pub async fn submit(app: &Router, part_number: &str, websites: &[&str]) -> anyhow::Result<String> {
    let (status, body) = make_request(
        app,
        Method::POST,
        "/api/search",
        Some(serde_json::json!({ "part_number": part_number, "websites": websites })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "search rejected: {} {}", status, body);
    body["search_id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("no search_id in {}", body))
}

/// Polls the status endpoint until the job leaves `running`.
pub async fn wait_for_completion(app: &Router, search_id: &str) -> anyhow::Result<Value> {
    let uri = format!("/api/search/{}/status", search_id);
    let poll = async {
        loop {
            let (status, job) = make_request(app, Method::GET, &uri, None).await?;
            anyhow::ensure!(status == StatusCode::OK, "status poll failed: {}", status);
            if job["status"] != "running" {
                return Ok(job);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll).await?
}
