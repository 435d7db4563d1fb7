use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::parse_date;
use crate::error::{AppError, AppResult};
use crate::models::LayoutConfig;
use crate::services::layout::LayoutGenerator;
use crate::services::queries;
use crate::AppState;

// Предпросмотр не должен строить гигантские схемы
const MAX_PREVIEW_SEATS: usize = 10_000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/layouts/preview", post(preview_layout))
        .route("/layouts/{key}", get(get_layout))
}

#[derive(Debug, Deserialize)]
struct LayoutQuery {
    date: Option<String>,
}

// GET /api/layouts/{key}?date=YYYY-MM-DD
async fn get_layout(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<LayoutQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let date = parse_date(params.date.as_deref())?;
    let view = state.sessions.layout_view(&key, date).await?;

    Ok(Json(json!({
        "success": true,
        "layout": view,
    })))
}

#[derive(Debug, Deserialize, Validate)]
struct PreviewRequest {
    #[validate(length(min = 1, max = 32))]
    topology: String,
    config: LayoutConfig,
    #[validate(range(min = 0.0, max = 1_000_000.0))]
    base_price: f64,
}

// POST /api/layouts/preview
async fn preview_layout(Json(req): Json<PreviewRequest>) -> AppResult<Json<serde_json::Value>> {
    req.validate()?;

    match req.config.try_capacity() {
        Some(requested) if requested <= MAX_PREVIEW_SEATS => {}
        Some(requested) => {
            return Err(AppError::Validation(format!(
                "layout has {} positions, limit is {}",
                requested, MAX_PREVIEW_SEATS
            )));
        }
        None => {
            return Err(AppError::Validation(format!(
                "layout size overflows, limit is {}",
                MAX_PREVIEW_SEATS
            )));
        }
    }

    let layout = LayoutGenerator::preview().generate_named(&req.topology, &req.config, req.base_price);

    // пустая схема - не ошибка, клиент показывает "недоступно"
    Ok(Json(json!({
        "success": true,
        "available": !layout.is_empty(),
        "topology": layout.topology,
        "summary": queries::summarize(&layout.seats),
        "price_by_class": queries::price_by_class(&layout.seats),
        "seats": layout.seats,
    })))
}
