mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use catalog_chat::llm::ChatModel;
use catalog_chat::{create_router, AppState, Database};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: Database, model: Arc<dyn ChatModel>) -> Router {
    let state = AppState {
        db: Arc::new(db),
        assistant: Arc::new(assistant(model)),
        project_name: "Jeans Product API".to_string(),
    };
    create_router(state, &["http://localhost:3000".to_string()])
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_chat(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/ai/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn chat_returns_answer_and_buttons() {
    let (_dir, db) = seeded_db();
    let model = ScriptedModel::new(vec![
        calls(vec![call(
            "b",
            "show_navigation_buttons",
            json!({ "buttons": [{ "label": "View product", "target": "/products/2" }] }),
        )]),
        text("Here is the Relaxed Taper."),
    ]);

    let (status, body) = send(
        app(db, model),
        post_chat(json!({ "message": "show me product 2", "user_location": "/" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "response": "Here is the Relaxed Taper.",
            "buttons": [{ "text": "View product", "url": "/products/2" }]
        })
    );
}

#[tokio::test]
async fn chat_without_buttons_omits_the_field() {
    let (_dir, db) = seeded_db();
    let model = ScriptedModel::new(vec![text("Hi there.")]);

    let (status, body) = send(app(db, model), post_chat(json!({ "message": "hi" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "response": "Hi there." }));
}

#[tokio::test]
async fn blank_or_missing_message_is_rejected_before_the_model() {
    for payload in [json!({ "message": "   " }), json!({})] {
        let (_dir, db) = seeded_db();
        let model = ScriptedModel::new(vec![text("unused")]);

        let (status, body) = send(app(db, model.clone()), post_chat(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Message is required"));
        assert_eq!(body["status"], json!(400));
        assert_eq!(model.calls(), 0);
    }
}

#[tokio::test]
async fn malformed_chat_body_gets_json_error() {
    let (_dir, db) = seeded_db();
    let model = ScriptedModel::new(vec![text("unused")]);
    let app = app(db, model.clone());

    let (status, body) = send(app.clone(), post_chat(json!({ "message": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/ai/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));

    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn model_failure_is_a_server_error() {
    let (_dir, db) = seeded_db();

    let (status, body) = send(
        app(db, Arc::new(FailingModel)),
        post_chat(json!({ "message": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], json!(500));
    assert!(body["error"].as_str().unwrap().contains("upstream unavailable"));
}

#[tokio::test]
async fn ai_test_endpoint_reports_running() {
    let (_dir, db) = seeded_db();

    let (status, body) = send(app(db, Arc::new(FailingModel)), get("/api/v1/ai/test")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "AI Backend is running!" }));
}

#[tokio::test]
async fn root_links_only_to_served_routes() {
    let (_dir, db) = seeded_db();

    let (status, body) = send(app(db, Arc::new(FailingModel)), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Welcome to Jeans Product AI API", "health": "/health" })
    );
}

#[tokio::test]
async fn health_names_the_service() {
    let (_dir, db) = seeded_db();

    let (status, body) = send(app(db, Arc::new(FailingModel)), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "service": "Jeans Product API" }));
}

#[tokio::test]
async fn product_listing_searches_and_paginates() {
    let (_dir, db) = seeded_db();

    let (status, body) = send(
        app(db, Arc::new(FailingModel)),
        get("/api/v1/products/jeans?search=levi&page=1&per_page=5"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["total_pages"], json!(1));
    assert_eq!(body["items"][0]["brand"], json!("LEVI'S"));
    assert_eq!(body["items"][0]["price_usd"], json!(79.5));
}

#[tokio::test]
async fn product_listing_defaults_and_bounds() {
    let (_dir, db) = seeded_db();
    let app = app(db, Arc::new(FailingModel));

    let (status, body) = send(app.clone(), get("/api/v1/products/jeans")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["per_page"], json!(12));
    assert_eq!(body["items"].as_array().unwrap().len(), 3);

    let (status, _) = send(app.clone(), get("/api/v1/products/jeans?per_page=101")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app, get("/api/v1/products/jeans?page=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn page_number_that_overflows_the_offset_is_rejected() {
    let (_dir, db) = seeded_db();

    let (status, body) = send(
        app(db, Arc::new(FailingModel)),
        get("/api/v1/products/jeans?page=9223372036854775807&per_page=100"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "page is out of range", "status": 400 }));
}

#[tokio::test]
async fn product_detail_and_not_found() {
    let (_dir, db) = seeded_db();
    let app = app(db, Arc::new(FailingModel));

    let (status, body) = send(app.clone(), get("/api/v1/products/jeans/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["product_name"], json!("Slim Fit Stretch"));
    assert_eq!(body["selling_price"], json!({ "USD": 19.99 }));

    let (status, body) = send(app, get("/api/v1/products/jeans/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Product not found", "status": 404 }));
}
