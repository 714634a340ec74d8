//! Drives the workflow controller against a mock profiling service over real HTTP.

use profiler_view::{
    ChartRequestState, HttpBackend, Notifier, ProfilerResult, Region, ToastKind, ViewState,
    WorkflowController, WorkflowPhase,
};

use serde_json::json;
use std::{
    io::Write,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::runtime::Handle;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

type Controller = WorkflowController<ViewState>;

fn controller(server: &MockServer) -> ProfilerResult<Controller> {
    let backend = HttpBackend::new(&server.uri(), Some(Duration::from_secs(5)))?;
    Ok(WorkflowController::new(
        Arc::new(backend),
        Handle::current(),
        ViewState::new(),
        Notifier::default(),
    ))
}

/// Polls the controller until `done` holds, or panics after a few seconds.
async fn wait_until(controller: &mut Controller, done: impl Fn(&Controller) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        controller.poll();
        if done(controller) {
            return;
        }
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn mount_profiling_service(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("filename=\"sales.csv\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            // Column order is significant and deliberately not alphabetical.
            r#"{"filename": "sales.csv", "columns": {
                "revenue": {"type": "numeric", "cardinality": "high", "unique_count": 340, "missing_percentage": 0},
                "date": {"type": "datetime", "cardinality": "high", "unique_count": 365, "missing_percentage": 0},
                "region": {"type": "categorical", "cardinality": "low", "unique_count": 4, "missing_percentage": 1.5}
            }}"#,
            "application/json",
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/suggest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"title": "Trend of revenue over date", "chart_type": "line", "x": "date", "y": "revenue"},
            {"title": "Revenue by Region", "chart_type": "bar", "x": "region", "y": "revenue", "aggregation": "sum"}
        ])))
        .expect(1)
        .mount(server)
        .await;

    let figure = json!({
        "data": [{"type": "bar", "x": ["North", "South"], "y": [120.5, 98.0]}],
        "layout": {"title": {"text": "Revenue by Region"}}
    });
    Mock::given(method("POST"))
        .and(path("/generate-chart"))
        .and(body_string_contains("\"aggregation\":\"sum\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(figure.to_string())))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn upload_suggest_and_chart_over_http() -> ProfilerResult<()> {
    let server = MockServer::start().await;
    mount_profiling_service(&server).await;

    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("sales.csv");
    let mut file = std::fs::File::create(&file_path)?;
    writeln!(file, "date,region,revenue")?;
    writeln!(file, "2024-01-01,North,120.5")?;

    let mut controller = controller(&server)?;
    controller.select_file(&file_path, Some("%Y-%m-%d".into()));
    controller.submit_upload()?;

    wait_until(&mut controller, |c| c.suggestions().len() == 2).await;

    assert_eq!(controller.phase(), WorkflowPhase::Dashboard);
    let names: Vec<String> = controller
        .view()
        .column_rows()
        .map(|row| row.name.clone())
        .collect();
    assert_eq!(names, ["revenue", "date", "region"]);
    assert_eq!(
        controller.notifier().last().map(|t| (t.message.as_str(), t.kind)),
        Some(("Successfully analyzed sales.csv", ToastKind::Success))
    );

    let request = controller.select_suggestion_at(1).expect("dashboard accepts clicks");
    wait_until(&mut controller, |c| {
        c.chart_state() == ChartRequestState::Displayed(request)
    })
    .await;

    let chart = controller
        .view()
        .chart(Region::ChartDisplay)
        .expect("chart is rendered");
    assert_eq!(chart.title.as_deref(), Some("Revenue by Region"));
    assert_eq!(chart.x_categories, ["North", "South"]);
    assert!(!controller.view().is_visible(Region::ChartLoader));
    wait_until(&mut controller, |c| !c.is_busy()).await;

    controller.reset();
    assert_eq!(controller.phase(), WorkflowPhase::Idle);
    assert_eq!(controller.view(), &ViewState::new());
    Ok(())
}

#[tokio::test]
async fn rejected_upload_reports_backend_detail() -> ProfilerResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Unsupported file type"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/suggest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, "not a table")?;

    let mut controller = controller(&server)?;
    controller.select_file(&file_path, None);
    controller.submit_upload()?;

    wait_until(&mut controller, |c| c.phase() == WorkflowPhase::Idle).await;

    assert_eq!(
        controller.notifier().last().map(|t| (t.message.as_str(), t.kind)),
        Some(("Unsupported file type", ToastKind::Error))
    );
    assert!(controller.view().is_enabled(Region::UploadButton));
    assert!(controller.columns().is_empty());
    Ok(())
}
