use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shipment::Shipment;
use crate::models::user::Courier;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", get(list_eligible_couriers))
        .route("/couriers/best", get(best_courier))
        .route("/couriers/:id/shipments", get(courier_shipments))
}

#[derive(Deserialize)]
pub struct BestCourierQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub first: bool,
}

#[derive(Serialize)]
pub struct BestCourierResponse {
    pub courier: Option<Courier>,
}

async fn list_eligible_couriers(State(state): State<Arc<AppState>>) -> Json<Vec<Courier>> {
    Json(state.engine.eligible_couriers().await)
}

async fn best_courier(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BestCourierQuery>,
) -> Result<Json<BestCourierResponse>, AppError> {
    if !(-90.0..=90.0).contains(&query.lat) {
        return Err(AppError::BadRequest("lat must be within [-90, 90]".to_string()));
    }
    if !(-180.0..=180.0).contains(&query.lon) {
        return Err(AppError::BadRequest("lon must be within [-180, 180]".to_string()));
    }

    let courier = state
        .engine
        .find_best_courier(query.lat, query.lon, query.first)
        .await;

    Ok(Json(BestCourierResponse { courier }))
}

async fn courier_shipments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Shipment>>, AppError> {
    let shipments = state.shipments.shipments_for_courier(&id).await?;
    Ok(Json(shipments))
}
