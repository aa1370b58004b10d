pub mod couriers;
pub mod shipments;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::models::user::Role;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(couriers::router())
        .merge(shipments::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    couriers: usize,
    shipments: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let couriers = state.users.users_by_role(Role::Courier).await;
    let shipments = state.shipments.all_shipments().await;

    match (couriers, shipments) {
        (Ok(couriers), Ok(shipments)) => Json(HealthResponse {
            status: "ok",
            couriers: couriers.len(),
            shipments: shipments.len(),
        }),
        (couriers, shipments) => {
            warn!("health check could not read collaborator stores");
            Json(HealthResponse {
                status: "degraded",
                couriers: couriers.map(|c| c.len()).unwrap_or(0),
                shipments: shipments.map(|s| s.len()).unwrap_or(0),
            })
        }
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.metrics().encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
