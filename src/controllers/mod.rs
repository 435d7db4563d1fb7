pub mod bookings;
pub mod catalog;
pub mod layouts;
pub mod sessions;

use axum::{extract::State, routing::get, Json, Router};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{AppError, AppResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(bookings::routes())
        .merge(catalog::routes())
        .merge(layouts::routes())
        .merge(sessions::routes())
}

/// Полный роутер приложения
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Seat Booking API v1.0" }))
        .route("/health", get(health))
        .nest("/api", routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::error!("Health check: database unreachable: {:?}", e);
                "unreachable"
            }
        },
        None => "in-memory",
    };

    Json(json!({
        "status": "OK",
        "environment": state.config.app.environment,
        "database": database,
        "active_sessions": state.sessions.active_sessions().await,
    }))
}

/* ---------- helpers ---------- */

// Дата в формате YYYY-MM-DD, по умолчанию сегодня
pub(crate) fn parse_date(raw: Option<&str>) -> AppResult<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("date must be YYYY-MM-DD, got {:?}", s))),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}
