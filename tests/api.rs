//! HTTP-сценарии поверх in-memory бэкендов.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use seat_booking::{config::Config, controllers, AppState};

fn state() -> Arc<AppState> {
    let config = Config::from_lookup(|_| None).unwrap();
    AppState::in_memory(config)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn open_session(app: &Router, layout_key: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/sessions",
        Some(json!({ "layout_key": layout_key, "date": "2025-07-28" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["session"]["id"].as_str().unwrap().to_string()
}

async fn toggle(app: &Router, session: &str, seat_id: &str) -> (StatusCode, Value) {
    call(
        app,
        Method::PATCH,
        &format!("/api/sessions/{}/toggle", session),
        Some(json!({ "seat_id": seat_id })),
    )
    .await
}

#[tokio::test]
async fn health_reports_in_memory_backend() {
    let app = controllers::app(state());
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["environment"], "development");
    assert_eq!(body["database"], "in-memory");
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn catalog_lists_builtin_layouts_with_capacity() {
    let app = controllers::app(state());
    let (status, body) = call(&app, Method::GET, "/api/catalog", None).await;
    assert_eq!(status, StatusCode::OK);

    let layouts = body["layouts"].as_array().unwrap();
    let minivan = layouts
        .iter()
        .find(|l| l["key"] == "cusco-urubamba-minivan")
        .unwrap();
    // 4x4 без места водителя
    assert_eq!(minivan["capacity"], 15);
    assert_eq!(minivan["topology"], "minivan");
}

#[tokio::test]
async fn layout_view_and_unknown_key() {
    let app = controllers::app(state());

    let (status, body) = call(&app, Method::GET, "/api/layouts/cusco-puno-bus?date=2025-07-28", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["layout"]["seats"].as_array().unwrap().len(), 46);
    assert_eq!(body["layout"]["summary"]["available"], 46);

    let (status, body) = call(&app, Method::GET, "/api/layouts/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, Method::GET, "/api/layouts/cusco-puno-bus?date=28-07-2025", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preview_builds_ad_hoc_layout() {
    let app = controllers::app(state());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/layouts/preview",
        Some(json!({
            "topology": "theater",
            "base_price": 40.0,
            "config": {
                "kind": "venue",
                "sections": [
                    { "id": "palco", "name": "Palco", "kind": "palco", "rows": 2, "seats_per_row": 6, "multiplier": 3.0 },
                    { "id": "platea", "name": "Platea", "rows": 10, "seats_per_row": 16, "multiplier": 2.0 }
                ]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["available"], true);
    assert_eq!(body["seats"].as_array().unwrap().len(), 172);
    assert_eq!(body["seats"][0]["id"], "palco-R1-S1");
    assert_eq!(body["summary"]["max_price"], 120.0);
}

#[tokio::test]
async fn preview_of_unknown_topology_is_empty() {
    let app = controllers::app(state());
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/layouts/preview",
        Some(json!({
            "topology": "spaceship",
            "base_price": 10.0,
            "config": { "kind": "vehicle", "rows": 2, "cols": 2 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert!(body["seats"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn preview_rejects_negative_price_and_huge_layouts() {
    let app = controllers::app(state());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/layouts/preview",
        Some(json!({
            "topology": "bus",
            "base_price": -1.0,
            "config": { "kind": "vehicle", "rows": 2, "cols": 4 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/layouts/preview",
        Some(json!({
            "topology": "bus",
            "base_price": 10.0,
            "config": { "kind": "vehicle", "rows": 1000, "cols": 1000 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preview_rejects_sections_whose_size_overflows() {
    let app = controllers::app(state());
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/layouts/preview",
        Some(json!({
            "topology": "stadium",
            "base_price": 10.0,
            "config": {
                "kind": "venue",
                "sections": [
                    { "id": "a", "name": "A", "rows": u32::MAX, "seats_per_row": u32::MAX, "multiplier": 1.0 },
                    { "id": "b", "name": "B", "rows": 4, "seats_per_row": 2_147_483_649u32, "multiplier": 1.0 }
                ]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn toggle_and_checkout_flow() {
    let app = controllers::app(state());
    let session = open_session(&app, "cusco-puno-bus").await;

    let (status, body) = toggle(&app, &session, "0-0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "selected");
    assert_eq!(body["session"]["total"], 55.0);

    let (_, body) = toggle(&app, &session, "0-1").await;
    assert_eq!(body["session"]["selected"], json!(["0-0", "0-1"]));
    assert_eq!(body["session"]["total"], 105.0);

    let (status, body) = call(&app, Method::POST, &format!("/api/sessions/{}/checkout", session), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["booking"]["booking_ref"].as_str().unwrap().starts_with("BK-"));
    assert_eq!(body["booking"]["total"], 105.0);
    assert_eq!(body["booking"]["seats"].as_array().unwrap().len(), 2);

    // проданные места видны в новой сессии как занятые
    let other = open_session(&app, "cusco-puno-bus").await;
    let (status, body) = toggle(&app, &other, "0-0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "locked");
    assert_eq!(body["changed"], false);
}

#[tokio::test]
async fn cancelled_booking_returns_seats_to_sale() {
    let app = controllers::app(state());
    let session = open_session(&app, "puno-uros-boat").await;
    toggle(&app, &session, "1-1").await;

    let (status, body) = call(&app, Method::POST, &format!("/api/sessions/{}/checkout", session), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let booking_ref = body["booking"]["booking_ref"].as_str().unwrap().to_string();

    let cancel = json!({ "layout_key": "puno-uros-boat", "date": "2025-07-28", "booking_ref": booking_ref });
    let (status, body) = call(&app, Method::PATCH, "/api/bookings/cancel", Some(cancel.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["released_seats"], 1);

    let other = open_session(&app, "puno-uros-boat").await;
    let (_, body) = toggle(&app, &other, "1-1").await;
    assert_eq!(body["outcome"], "selected");

    // бронь уже отменена
    let (status, body) = call(&app, Method::PATCH, "/api/bookings/cancel", Some(cancel)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn seat_held_by_another_session_is_locked() {
    let app = controllers::app(state());
    let first = open_session(&app, "puno-uros-boat").await;
    let second = open_session(&app, "puno-uros-boat").await;

    let (_, body) = toggle(&app, &first, "2-1").await;
    assert_eq!(body["outcome"], "selected");

    let (_, body) = toggle(&app, &second, "2-1").await;
    assert_eq!(body["outcome"], "locked");

    // после отмены выбора место снова свободно
    let (_, body) = toggle(&app, &first, "2-1").await;
    assert_eq!(body["outcome"], "deselected");
    let third = open_session(&app, "puno-uros-boat").await;
    let (_, body) = toggle(&app, &third, "2-1").await;
    assert_eq!(body["outcome"], "selected");
}

#[tokio::test]
async fn max_seats_limits_selection() {
    let app = controllers::app(state());
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/sessions",
        Some(json!({ "layout_key": "cusco-urubamba-minivan", "date": "2025-07-28", "max_seats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session = body["session"]["id"].as_str().unwrap().to_string();

    let (_, body) = toggle(&app, &session, "0-1").await;
    assert_eq!(body["outcome"], "selected");
    let (_, body) = toggle(&app, &session, "0-2").await;
    assert_eq!(body["outcome"], "selection_full");
    assert_eq!(body["session"]["selected"], json!(["0-1"]));
}

#[tokio::test]
async fn session_errors() {
    let app = controllers::app(state());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/sessions",
        Some(json!({ "layout_key": "cusco-urubamba-minivan", "max_seats": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/sessions",
        Some(json!({ "layout_key": "atlantis" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let session = open_session(&app, "cusco-urubamba-minivan").await;

    // место водителя не существует
    let (status, _) = toggle(&app, &session, "0-0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, Method::POST, &format!("/api/sessions/{}/checkout", session), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/sessions/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reset_and_close_release_holds() {
    let app = controllers::app(state());
    let first = open_session(&app, "cusco-aguas-calientes-train").await;

    toggle(&app, &first, "0-0").await;
    toggle(&app, &first, "0-1").await;

    let (status, body) = call(&app, Method::POST, &format!("/api/sessions/{}/reset", first), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["selected"], json!([]));
    assert_eq!(body["session"]["total"], 0.0);

    let (_, body) = toggle(&app, &first, "1-0").await;
    assert_eq!(body["outcome"], "selected");

    let (status, _) = call(&app, Method::DELETE, &format!("/api/sessions/{}", first), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &format!("/api/sessions/{}", first), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let second = open_session(&app, "cusco-aguas-calientes-train").await;
    let (_, body) = toggle(&app, &second, "1-0").await;
    assert_eq!(body["outcome"], "selected");
}
