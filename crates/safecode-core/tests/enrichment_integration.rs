// SPDX-License-Identifier: Apache-2.0

//! Recommendation enrichment against a local mock service.

use std::time::Duration;

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use safecode_core::{
    AppConfig, Catalogs, HttpRecommendationService, ProjectConfig, RuleRegistry, ScanReport,
    Scanner, SyntaxTree,
};

const USER_DAO_FIXTURE: &str = include_str!("../../../tests/fixtures/UserDao.json");

/// Serves `router` on an ephemeral port and returns its `/check` URL.
async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/check")
}

async fn recommend(Json(request): Json<Value>) -> Json<Value> {
    let issues = request["issues"].as_array().map_or(0, Vec::len);
    assert_eq!(issues, 1);
    assert_eq!(request["issues"][0]["definitionId"], "101");

    Json(json!({
        "recommendations": [
            {"id": 101, "type": "sql_injection", "recommendations": ["Use PreparedStatement"]},
            {"id": 101, "type": "sql_injection", "recommendations": ["Validate userId"]},
            {"id": 999, "type": "other", "recommendations": ["Unrelated"]}
        ]
    }))
}

async fn malformed() -> &'static str {
    "<html>gateway timeout</html>"
}

async fn scan_with(url: String) -> (ScanReport, ScanReport) {
    let config = AppConfig::default();
    let catalogs = Catalogs::bundled().unwrap();
    let registry = RuleRegistry::standard(&catalogs, &config.scan).unwrap();
    let project = ProjectConfig::default();
    let scanner = Scanner::new(&catalogs, &registry, &project, &config.scan, &config.severity);
    let trees = vec![SyntaxTree::from_json(USER_DAO_FIXTURE).unwrap()];

    let service = HttpRecommendationService::new(url, Duration::from_secs(5)).unwrap();
    let plain = scanner.scan(&trees).unwrap();
    let enriched = scanner.scan_and_enrich(&trees, &service).await.unwrap();
    (plain, enriched)
}

#[tokio::test]
async fn test_recommendations_are_merged() {
    let url = spawn(Router::new().route("/check", post(recommend))).await;
    let (plain, enriched) = scan_with(url).await;

    let finding = &enriched.get("src/main/java/com/acme/UserDao.java").unwrap()[0];
    assert_eq!(
        finding.recommendations,
        vec!["Use PreparedStatement", "Validate userId"]
    );
    assert_ne!(plain, enriched);
    assert_eq!(finding.performance_impacts, plain.findings().next().unwrap().performance_impacts);
}

#[tokio::test]
async fn test_malformed_response_keeps_catalog_recommendations() {
    let url = spawn(Router::new().route("/check", post(malformed))).await;
    let (plain, enriched) = scan_with(url).await;
    assert_eq!(plain, enriched);
}

#[tokio::test]
async fn test_server_error_keeps_catalog_recommendations() {
    let router = Router::new().route(
        "/check",
        post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = spawn(router).await;
    let (plain, enriched) = scan_with(url).await;
    assert_eq!(plain, enriched);
}

#[tokio::test]
async fn test_unreachable_service_keeps_catalog_recommendations() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (plain, enriched) = scan_with(format!("http://{addr}/check")).await;
    assert_eq!(plain, enriched);
}
