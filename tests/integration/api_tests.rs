use super::*;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let (status, body) = make_request(&app, Method::GET, "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["running_searches"], 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_part_number_rejected() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "part_number": "   ", "websites": ["dataio"] })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Part number is required");
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn test_empty_websites_rejected() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "part_number": "AT89C51", "websites": [] })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least one website must be selected");
    Ok(())
}

#[tokio::test]
async fn test_missing_fields_rejected() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let (status, _) = make_request(&app, Method::POST, "/api/search", Some(json!({}))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_mistyped_body_uses_error_shape() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "part_number": "AT89C51", "websites": "dataio" })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_uses_error_shape() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/search")
        .header("content-type", "application/json")
        .body(Body::from("{\"part_number\": \"AT89C51\""))?;
    let response = app.clone().oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn test_unknown_website_rejected() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "part_number": "AT89C51", "websites": ["dataio", "acme"] })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("acme"));
    Ok(())
}

#[tokio::test]
async fn test_rejected_search_creates_no_job() -> anyhow::Result<()> {
    let state = create_test_app_state(vec![]);
    let app = create_router(state.clone());

    make_request(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "part_number": "", "websites": ["dataio"] })),
    )
    .await?;

    assert_eq!(state.tracker.stats().await.total_jobs, 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_search_id() -> anyhow::Result<()> {
    let app = create_test_app(vec![]);

    let (status, body) = make_request(&app, Method::GET, "/api/search/search_1_deadbeef/status", None).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Search not found");
    Ok(())
}

#[tokio::test]
async fn test_search_started_response() -> anyhow::Result<()> {
    let app = create_test_app(vec![FakeSite::new(Vendor::DataIo)]);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({ "part_number": "AT89C51", "websites": ["dataio"] })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "started");
    assert!(body["search_id"].as_str().unwrap_or_default().starts_with("search_"));
    Ok(())
}

#[tokio::test]
async fn test_running_search_is_visible_while_in_progress() -> anyhow::Result<()> {
    let slow = FakeSite::new(Vendor::SystemGeneral).slow(Duration::from_millis(300));
    let app = create_test_app(vec![slow]);

    let search_id = submit(&app, "AT89C51", &["systemgeneral"]).await?;
    let (status, job) =
        make_request(&app, Method::GET, &format!("/api/search/{}/status", search_id), None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["status"], "running");
    assert!(job["progress"].as_u64().unwrap_or(100) < 100);
    assert!(job["summary"].is_null());

    let job = wait_for_completion(&app, &search_id).await?;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100);
    Ok(())
}
