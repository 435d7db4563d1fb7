use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::TopologyKind;
use crate::services::layout::LayoutGenerator;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/catalog", get(get_catalog))
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    key: String,
    name: String,
    topology: TopologyKind,
    capacity: usize,
    base_price: f64,
    max_seats: Option<usize>,
}

// GET /api/catalog
async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let catalog = state.sessions.catalog();

    let entries: Vec<CatalogEntry> = catalog
        .keys()
        .filter_map(|key| catalog.find(key))
        .map(|preset| CatalogEntry {
            // реальное число мест, с учётом водителя и заблокированных позиций
            capacity: LayoutGenerator::preview()
                .generate(preset.topology, &preset.config, preset.base_price)
                .len(),
            key: preset.key,
            name: preset.name,
            topology: preset.topology,
            base_price: preset.base_price,
            max_seats: preset.max_seats,
        })
        .collect();

    Json(json!({
        "success": true,
        "routes": catalog.routes,
        "venues": catalog.venues,
        "layouts": entries,
    }))
}
