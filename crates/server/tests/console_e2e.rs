//! The console driving a real server over HTTP.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestFixture;
use hpcl_core::{
    create_console_channel, ApiError, Console, ConsoleConfig, ConsoleEvent, HttpRouteApi,
    PollOutcome, RouteApi, RouteQuery, RouteStatus,
};

async fn serve(fixture: &TestFixture) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = fixture.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fast_config(base_url: &str) -> ConsoleConfig {
    ConsoleConfig {
        base_url: base_url.to_string(),
        status_poll_interval_ms: 20,
        bulk_stagger_ms: 10,
        progress_close_delay_ms: 10,
        ..ConsoleConfig::default()
    }
}

fn api(base_url: &str) -> Arc<HttpRouteApi> {
    Arc::new(HttpRouteApi::new(base_url, Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn test_console_processes_route_to_completion() {
    let fixture = TestFixture::new().await;
    let route = fixture.create_route("1140", "4521");
    let base_url = serve(&fixture).await;

    let (handle, mut rx) = create_console_channel(64);
    let console = Console::new(api(&base_url), fast_config(&base_url), handle);

    let outcome = console.process_route(&route.id).await;
    assert!(outcome.is_started());
    assert_eq!(outcome.wait().await, Some(PollOutcome::Completed));

    let mut saw_refresh = false;
    while let Ok(envelope) = rx.try_recv() {
        saw_refresh |= envelope.event == ConsoleEvent::RefreshRequested;
    }
    assert!(saw_refresh);
}

#[tokio::test]
async fn test_console_bulk_and_dashboard() {
    let fixture = TestFixture::new().await;
    let ids: Vec<String> = (0..3)
        .map(|i| fixture.create_route("1140", &format!("452{}", i)).id)
        .collect();
    let base_url = serve(&fixture).await;

    let (handle, mut rx) = create_console_channel(64);
    let console = Console::new(api(&base_url), fast_config(&base_url), handle);

    let summary = console.process_routes(&ids).await.unwrap();
    assert_eq!(summary.succeeded, 3);
    for id in &ids {
        fixture.wait_for_status(id, RouteStatus::Completed).await;
    }

    let stats = console.dashboard().refresh_once().await.unwrap();
    assert_eq!(stats.routes.total, 3);
    assert_eq!(stats.routes.processing_rate_label(), "100.0%");

    let mut labels = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        if let ConsoleEvent::ProgressUpdated { label, .. } = envelope.event {
            labels.push(label);
        }
    }
    assert_eq!(labels.last().map(String::as_str), Some("3/3"));
}

#[tokio::test]
async fn test_client_error_mapping_and_listing() {
    let fixture = TestFixture::new().await;
    fixture.create_route("1140", "4521");
    let base_url = serve(&fixture).await;
    let api = api(&base_url);

    assert!(matches!(
        api.start_processing("missing").await,
        Err(ApiError::NotFound(_))
    ));

    let page = tokio_test::assert_ok!(
        api.list_routes(&RouteQuery::default().with_status(RouteStatus::Pending))
            .await
    );
    assert_eq!(page.total, 1);

    let export = api.export_routes("json").await.unwrap();
    assert!(export.filename.starts_with("routes_export_"));
    assert!(export.filename.ends_with(".json"));
    assert!(matches!(
        api.export_routes("pdf").await,
        Err(ApiError::Http { status: 400, .. })
    ));
}
