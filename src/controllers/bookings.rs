use axum::{extract::State, routing::patch, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::parse_date;
use crate::error::AppResult;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/bookings/cancel", patch(cancel_booking))
}

#[derive(Debug, Deserialize, Validate)]
struct CancelBookingRequest {
    #[validate(length(min = 1, max = 64))]
    layout_key: String,
    date: String,
    #[validate(length(min = 1, max = 64))]
    booking_ref: String,
}

// PATCH /api/bookings/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelBookingRequest>,
) -> AppResult<Json<serde_json::Value>> {
    req.validate()?;
    let date = parse_date(Some(&req.date))?;

    let released = state
        .sessions
        .cancel_booking(&req.layout_key, date, &req.booking_ref)
        .await?;

    Ok(Json(json!({
        "success": true,
        "booking_ref": req.booking_ref,
        "released_seats": released,
    })))
}
