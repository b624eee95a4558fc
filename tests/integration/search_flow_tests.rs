use super::*;

#[tokio::test]
async fn test_all_vendors_in_priority_order() -> anyhow::Result<()> {
    let app = create_test_app(vec![
        FakeSite::new(Vendor::BpMicro).answer("AT89C51", ExtractionOutcome::SocketText("SM48D".into())),
        FakeSite::new(Vendor::DataIo),
        FakeSite::new(Vendor::SystemGeneral).answer("AT89C51", ExtractionOutcome::SocketText("DIP40".into())),
    ]);

    let search_id = submit(&app, "AT89C51", &["bpmicro", "dataio", "systemgeneral"]).await?;
    let job = wait_for_completion(&app, &search_id).await?;

    let websites: Vec<&str> = job["results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|r| r["website"].as_str())
        .collect();
    assert_eq!(websites, vec!["System General", "DataIO", "BPMicro"]);

    assert_eq!(job["results"][0]["status"], "found");
    assert_eq!(job["results"][1]["status"], "not_found");
    assert_eq!(job["results"][2]["socket_info"], "SM48D");
    assert_eq!(job["summary"]["total_searched"], 3);
    assert_eq!(job["summary"]["found_count"], 2);
    assert_eq!(job["summary"]["has_results"], true);
    Ok(())
}

#[tokio::test]
async fn test_trimmed_candidates_tried_in_order() -> anyhow::Result<()> {
    let dataio = Arc::new(FakeSite::new(Vendor::DataIo));
    let app = create_router(create_test_app_state(vec![Arc::clone(&dataio)]));

    let search_id = submit(&app, "AT89C51AC", &["dataio"]).await?;
    let job = wait_for_completion(&app, &search_id).await?;

    assert_eq!(dataio.queried(), vec!["AT89C51AC", "AT89C51A", "AT89C51", "AT89C5"]);
    assert_eq!(job["results"][0]["status"], "not_found");
    assert_eq!(job["results"][0]["part_used"], "AT89C51AC");
    assert_eq!(job["results"][0]["modified"], false);
    assert_eq!(job["summary"]["has_results"], false);
    Ok(())
}

#[tokio::test]
async fn test_found_on_trimmed_candidate_reports_modification() -> anyhow::Result<()> {
    let app = create_test_app(vec![
        FakeSite::new(Vendor::SystemGeneral).answer("SST39SF04", ExtractionOutcome::SocketText("PLCC32".into())),
    ]);

    let search_id = submit(&app, "SST39SF040", &["systemgeneral"]).await?;
    let job = wait_for_completion(&app, &search_id).await?;

    let result = &job["results"][0];
    assert_eq!(result["status"], "found");
    assert_eq!(result["part_used"], "SST39SF04");
    assert_eq!(result["modified"], true);
    assert_eq!(result["chars_removed"], 1);
    Ok(())
}

#[tokio::test]
async fn test_vendor_ids_are_case_insensitive_and_deduplicated() -> anyhow::Result<()> {
    let bpmicro = Arc::new(FakeSite::new(Vendor::BpMicro));
    let app = create_router(create_test_app_state(vec![Arc::clone(&bpmicro)]));

    let search_id = submit(&app, "AB", &["BPMicro", "bpmicro"]).await?;
    let job = wait_for_completion(&app, &search_id).await?;

    assert_eq!(job["websites"], serde_json::json!(["bpmicro"]));
    assert_eq!(job["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(bpmicro.queried(), vec!["AB", "A"]);
    Ok(())
}

#[tokio::test]
async fn test_too_broad_candidate_is_retried_then_skipped() -> anyhow::Result<()> {
    let bpmicro = Arc::new(
        FakeSite::new(Vendor::BpMicro)
            .answer("AT8", ExtractionOutcome::TooManyResults)
            .answer("AT", ExtractionOutcome::SocketText("SM48D".into())),
    );
    let app = create_router(create_test_app_state(vec![Arc::clone(&bpmicro)]));

    let search_id = submit(&app, "AT8", &["bpmicro"]).await?;
    let job = wait_for_completion(&app, &search_id).await?;

    assert_eq!(bpmicro.queried(), vec!["AT8", "AT8", "AT"]);
    assert_eq!(job["results"][0]["part_used"], "AT");
    Ok(())
}

#[tokio::test]
async fn test_failing_vendor_does_not_stop_the_others() -> anyhow::Result<()> {
    let app = create_test_app(vec![
        FakeSite::new(Vendor::SystemGeneral)
            .otherwise(ExtractionOutcome::TransientError("Browser error: launch failed".into())),
        FakeSite::new(Vendor::DataIo).answer("AT89C51", ExtractionOutcome::SocketText("PA-DIP40".into())),
    ]);

    let search_id = submit(&app, "AT89C51", &["systemgeneral", "dataio"]).await?;
    let job = wait_for_completion(&app, &search_id).await?;

    assert_eq!(job["status"], "completed");
    assert_eq!(job["results"][0]["status"], "error");
    assert_eq!(job["results"][0]["error"], "Browser error: launch failed");
    assert_eq!(job["results"][1]["status"], "found");
    assert_eq!(job["summary"]["found_count"], 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_searches_are_independent() -> anyhow::Result<()> {
    let app = create_test_app(vec![
        FakeSite::new(Vendor::DataIo)
            .answer("AT89C51", ExtractionOutcome::SocketText("PA-DIP40".into()))
            .slow(Duration::from_millis(20)),
    ]);

    let mut ids = Vec::new();
    for part in ["AT89C51", "XYZ", "AT89C51", "QQ"] {
        ids.push((part, submit(&app, part, &["dataio"]).await?));
    }

    for (part, id) in ids {
        let job = wait_for_completion(&app, &id).await?;
        assert_eq!(job["part_number"], part);
        let expected = if part == "AT89C51" { "found" } else { "not_found" };
        assert_eq!(job["results"][0]["status"], expected);
    }
    Ok(())
}
