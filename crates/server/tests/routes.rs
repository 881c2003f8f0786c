use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{CurrencySet, Engine, MockExtractor, RateQuote, RateSource};
use migration::MigratorTrait;

struct FixedRate(f64);

#[async_trait]
impl RateSource for FixedRate {
    fn label(&self) -> &str {
        "Test Rates"
    }

    async fn historical_rate(&self, _from: &str, _to: &str, _date: &str) -> RateQuote {
        RateQuote {
            rate: Some(self.0),
            status: "Success".to_string(),
        }
    }

    async fn available_currencies(&self) -> CurrencySet {
        CurrencySet {
            currencies: vec!["EUR".to_string(), "USD".to_string()],
            success: true,
        }
    }
}

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .rate_source(Box::new(FixedRate(1.1)))
        .build()
        .unwrap();
    server::app(engine, Arc::new(MockExtractor))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn currencies_route_lists_provider_currencies() {
    let app = test_app().await;
    let (status, body) = send(app, get("/currencies")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["currencies"].as_array().unwrap().iter().any(|c| c == "EUR"));
}

#[tokio::test]
async fn rate_route_passes_the_quote_through() {
    let app = test_app().await;
    let (status, body) = send(app, get("/rate?from=EUR&to=USD&date=2024-03-01")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rate"], json!(1.1));
    assert_eq!(body["status"], json!("Success"));
}

#[tokio::test]
async fn process_reconcile_history_flow() {
    let app = test_app().await;

    let (status, receipt) = send(
        app.clone(),
        post_json(
            "/receipts/process",
            json!({
                "file_name": "demo.jpg",
                "image_base64": BASE64.encode(b"fake-image"),
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["merchant_name"], json!("Demo Store"));
    assert_eq!(receipt["converted_total"], Value::Null);

    let (status, listing) = send(app.clone(), get("/receipts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["receipts"].as_array().unwrap().len(), 1);

    // No explicit ids: the server picks up the pending receipt itself.
    let (status, reconciled) = send(
        app.clone(),
        post_json("/reconcile", json!({ "base_currency": "EUR" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reconciled["success"], json!(true));
    let results = reconciled["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["success"], json!(true));

    let (status, history) = send(app, get("/reconciliations")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = history["reconciliations"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], json!("Success"));
    assert_eq!(entries[0]["rate_source"], json!("Test Rates"));
}

#[tokio::test]
async fn reconcile_mode_all_revisits_converted_receipts() {
    let app = test_app().await;

    send(
        app.clone(),
        post_json(
            "/receipts/process",
            json!({
                "file_name": "demo.jpg",
                "image_base64": BASE64.encode(b"fake-image"),
            }),
        ),
    )
    .await;

    let (status, first) = send(
        app.clone(),
        post_json("/reconcile", json!({ "base_currency": "EUR" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["results"].as_array().unwrap().len(), 1);

    // Already converted into EUR: the default pending selection is empty.
    let (_, pending) = send(
        app.clone(),
        post_json("/reconcile", json!({ "base_currency": "EUR" })),
    )
    .await;
    assert!(pending["results"].as_array().unwrap().is_empty());

    // `all` re-reconciles the converted receipt anyway.
    let (status, all) = send(
        app,
        post_json("/reconcile", json!({ "base_currency": "EUR", "mode": "all" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = all["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["success"], json!(true));
}

#[tokio::test]
async fn reconcile_route_reports_missing_receipts_per_outcome() {
    let app = test_app().await;

    let (status, body) = send(
        app,
        post_json(
            "/reconcile",
            json!({ "receipt_ids": [9999], "base_currency": "USD" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["success"], json!(false));
    assert_eq!(results[0]["message"], json!("Receipt ID 9999 not found"));
}

#[tokio::test]
async fn blank_base_currency_is_a_422() {
    let app = test_app().await;

    let (status, _) = send(
        app,
        post_json(
            "/reconcile",
            json!({ "receipt_ids": [1], "base_currency": " " }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_image_payload_is_a_400() {
    let app = test_app().await;

    let (status, body) = send(
        app,
        post_json(
            "/receipts/process",
            json!({ "file_name": "demo.jpg", "image_base64": "not base64!!" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("image_base64"));
}
