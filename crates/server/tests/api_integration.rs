//! In-process tests for the route API endpoints.

mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::TestFixture;
use hpcl_core::{RiskLevel, RouteStatus, RouteStore};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/health").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
}

#[tokio::test]
async fn test_process_route_completes_in_background() {
    let fixture = TestFixture::new().await;
    let route = fixture.create_route("1140", "4521");

    let response = fixture
        .post_empty(&format!("/api/process_route/{}", route.id))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "success", json!(true));

    let done = fixture.wait_for_status(&route.id, RouteStatus::Completed).await;
    assert_eq!(done.risk.map(|r| r.risk_level), Some(RiskLevel::Medium));
    assert_eq!(fixture.processor.assessed().await, vec![route.id.clone()]);

    let status = fixture
        .get(&format!("/api/route_status/{}", route.id))
        .await;
    assert_status!(status, StatusCode::OK);
    assert_json_path!(status.body, "status", json!("completed"));
    assert_json_path!(status.body, "progress", json!(100));
}

#[tokio::test]
async fn test_process_route_failure_is_reported_in_status() {
    let fixture = TestFixture::new().await;
    let route = fixture.create_route("1140", "9999");
    fixture
        .processor
        .fail_route(&route.id, "No route geometry available")
        .await;

    let response = fixture
        .post_empty(&format!("/api/process_route/{}", route.id))
        .await;
    assert_status!(response, StatusCode::OK);

    fixture.wait_for_status(&route.id, RouteStatus::Failed).await;

    let status = fixture
        .get(&format!("/api/route_status/{}", route.id))
        .await;
    assert_json_path!(status.body, "status", json!("failed"));
    assert_json_path!(
        status.body,
        "errors",
        json!(["No route geometry available"])
    );
}

#[tokio::test]
async fn test_process_unknown_route_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_empty("/api/process_route/missing").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_json_path!(response.body, "error", json!("Route not found"));

    let status = fixture.get("/api/route_status/missing").await;
    assert_status!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_process_route_already_processing_is_rejected() {
    let fixture = TestFixture::new().await;
    let route = fixture.create_route("1140", "4521");
    fixture
        .store
        .update_status(&route.id, RouteStatus::Processing, None)
        .unwrap();

    let response = fixture
        .post_empty(&format!("/api/process_route/{}", route.id))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_json_path!(response.body, "success", json!(false));
    assert!(fixture.processor.assessed().await.is_empty());
}

#[tokio::test]
async fn test_completed_route_can_be_reprocessed() {
    let fixture = TestFixture::new().await;
    let route = fixture.create_route("1140", "4521");

    fixture
        .post_empty(&format!("/api/process_route/{}", route.id))
        .await;
    fixture.wait_for_status(&route.id, RouteStatus::Completed).await;

    let response = fixture
        .post_empty(&format!("/api/process_route/{}", route.id))
        .await;
    assert_status!(response, StatusCode::OK);
    fixture.wait_for_status(&route.id, RouteStatus::Completed).await;

    for _ in 0..100 {
        if fixture.processor.assessed().await.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(fixture.processor.assessed().await.len(), 2);
}

#[tokio::test]
async fn test_statistics() {
    let fixture = TestFixture::new().await;
    let done = fixture.create_route("1140", "4521");
    let failed = fixture.create_route("1140", "4522");
    fixture.create_route("1140", "4523");
    fixture.create_route("1140", "4524");

    fixture.processor.fail_route(&failed.id, "bad geometry").await;
    for id in [&done.id, &failed.id] {
        fixture.post_empty(&format!("/api/process_route/{}", id)).await;
    }
    fixture.wait_for_status(&done.id, RouteStatus::Completed).await;
    fixture.wait_for_status(&failed.id, RouteStatus::Failed).await;

    let response = fixture.get("/api/statistics").await;
    assert_status!(response, StatusCode::OK);

    let routes = &response.body["routes"];
    assert_json_path!(routes, "total", json!(4));
    assert_json_path!(routes, "processed", json!(1));
    assert_json_path!(routes, "pending", json!(2));
    assert_json_path!(routes, "failed", json!(1));
    assert_json_path!(routes, "processing_rate", json!(25.0));

    assert_eq!(
        response.body["risk_distribution"],
        json!([{"risk_level": "MEDIUM", "count": 1}])
    );
}

#[tokio::test]
async fn test_create_and_get_route() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/routes",
            json!({
                "from_code": "1140",
                "to_code": "0004521",
                "customer_name": "Acme Fuels",
            }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_json_path!(response.body, "route_name", json!("1140_to_0004521"));
    assert_json_path!(response.body, "status", json!("pending"));

    let id = response.body["id"].as_str().unwrap().to_string();
    let fetched = fixture.get(&format!("/api/routes/{}", id)).await;
    assert_status!(fetched, StatusCode::OK);
    assert_json_path!(fetched.body, "customer_name", json!("Acme Fuels"));

    let missing = fixture.get("/api/routes/nope").await;
    assert_status!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_route_requires_codes() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/routes", json!({"from_code": " ", "to_code": "4521"}))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_routes_paginates() {
    let fixture = TestFixture::new().await;
    for i in 0..5 {
        fixture.create_route("1140", &format!("45{:02}", i));
    }

    let response = fixture.get("/api/routes?page=2&per_page=2").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "total", json!(5));
    assert_json_path!(response.body, "page", json!(2));
    assert_json_path!(response.body, "per_page", json!(2));
    assert_eq!(response.body["routes"].as_array().unwrap().len(), 2);

    let clamped = fixture.get("/api/routes?per_page=1000").await;
    assert_json_path!(clamped.body, "per_page", json!(200));
}

#[tokio::test]
async fn test_list_routes_status_filter() {
    let fixture = TestFixture::new().await;
    let route = fixture.create_route("1140", "4521");
    fixture.create_route("1140", "4522");
    fixture
        .store
        .update_status(&route.id, RouteStatus::Processing, None)
        .unwrap();

    let response = fixture.get("/api/routes?status=processing").await;
    assert_json_path!(response.body, "total", json!(1));
    assert_eq!(response.body["routes"][0]["id"], json!(route.id));

    let invalid = fixture.get("/api/routes?status=queued").await;
    assert_status!(invalid, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_csv() {
    let fixture = TestFixture::new().await;
    fixture.create_route("1140", "4521");

    let response = fixture.get("/export/routes?format=csv").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "text/csv");

    let disposition = response.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\"routes_export_"));
    assert!(disposition.ends_with(".csv\""));

    let text = String::from_utf8(response.raw).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("id,route_name,from_code,to_code"));
    assert!(lines.next().unwrap().contains("1140_to_4521"));
}

#[tokio::test]
async fn test_export_json_and_default_format() {
    let fixture = TestFixture::new().await;
    fixture.create_route("1140", "4521");

    let response = fixture.get("/export/routes?format=json").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 1);

    let default = fixture.get("/export/routes").await;
    assert_eq!(default.headers[header::CONTENT_TYPE], "text/csv");
}

#[tokio::test]
async fn test_export_unsupported_format() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/export/routes?format=xlsx").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(
        response.body,
        "error",
        json!("Unsupported export format: xlsx")
    );
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/health").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);

    let text = String::from_utf8(response.raw).unwrap();
    assert!(text.contains("hpcl_http_requests_total"));
    assert!(text.contains("hpcl_routes_by_status"));
}
