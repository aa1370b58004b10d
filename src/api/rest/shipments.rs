use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::assignment::{AssignmentOutcome, ReconcileSummary};
use crate::models::shipment::{
    generate_tracking_number, DeliveryMode, GeoPoint, Shipment, ShipmentPatch, ShipmentStatus,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shipments/:id/accept", post(accept_shipment))
        .route("/shipments/:id/assign", post(assign_shipment))
        .route("/assignments/reconcile", post(reconcile_pending))
        .route("/track/:tracking_number", get(track_shipment))
}

#[derive(Serialize)]
pub struct AcceptResponse {
    pub shipment: Shipment,
    /// Present for door-to-door shipments only.
    pub assignment: Option<AssignmentOutcome>,
}

/// Public view returned to customers looking up a parcel.
#[derive(Serialize)]
pub struct TrackingView {
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub delivery_mode: DeliveryMode,
    pub courier_name: Option<String>,
    pub pickup: Option<GeoPoint>,
    pub updated_at: Option<DateTime<Utc>>,
}

async fn load_shipment(state: &AppState, id: &str) -> Result<Shipment, AppError> {
    state
        .shipments
        .get_shipment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shipment {id} not found")))
}

/// Acceptance always completes once the tracking number is written; courier
/// assignment afterwards is best effort. Every acceptance also starts a
/// background sweep of the door-to-door backlog.
async fn accept_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AcceptResponse>, AppError> {
    let shipment = load_shipment(&state, &id).await?;

    if let Some(tracking_number) = &shipment.tracking_number {
        return Err(AppError::Conflict(format!(
            "shipment {id} already accepted as {tracking_number}"
        )));
    }

    let now = Utc::now();
    let mut patch = ShipmentPatch::new(now);
    patch.tracking_number = Some(generate_tracking_number(now));
    patch.status = Some(ShipmentStatus::PickedUp);
    if shipment.coordinates.is_none() {
        patch.coordinates = shipment.sender.as_ref().and_then(|sender| sender.location);
    }

    state.shipments.update_shipment(&id, patch.clone()).await?;

    let mut accepted = shipment;
    accepted.apply(&patch);

    info!(
        shipment_id = %id,
        tracking_number = accepted.display_ref(),
        "shipment accepted"
    );

    let assignment = if accepted.is_door_to_door() {
        let outcome = state.engine.assign_courier(&id, &accepted).await;
        if outcome.success {
            accepted.courier_id = outcome.courier_id.clone();
            accepted.courier_name = outcome.courier_name.clone();
        } else {
            warn!(shipment_id = %id, "accepted without a courier");
        }
        Some(outcome)
    } else {
        None
    };

    spawn_backlog_sweep(Arc::clone(&state), id);

    Ok(Json(AcceptResponse {
        shipment: accepted,
        assignment,
    }))
}

/// Runs `reconcile_pending` off the request path; overlapping sweeps queue on
/// the engine's sweep lock.
fn spawn_backlog_sweep(state: Arc<AppState>, accepted_id: String) {
    tokio::spawn(async move {
        let summary = state.engine.reconcile_pending().await;
        info!(
            trigger = %accepted_id,
            assigned = summary.assigned,
            failed = summary.failed,
            "backlog sweep after acceptance finished"
        );
    });
}

async fn assign_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentOutcome>, AppError> {
    let shipment = load_shipment(&state, &id).await?;
    if !shipment.is_accepted() {
        return Err(AppError::Conflict(format!(
            "shipment {id} has not been accepted"
        )));
    }

    Ok(Json(state.engine.assign_courier(&id, &shipment).await))
}

async fn reconcile_pending(State(state): State<Arc<AppState>>) -> Json<ReconcileSummary> {
    Json(state.engine.reconcile_pending().await)
}

async fn track_shipment(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    let tracking_number = tracking_number.trim();
    if tracking_number.is_empty() {
        return Err(AppError::BadRequest("tracking number cannot be empty".to_string()));
    }

    let shipment = state
        .shipments
        .find_by_tracking_number(tracking_number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no shipment with tracking number {tracking_number}")))?;

    Ok(Json(TrackingView {
        tracking_number: tracking_number.to_string(),
        status: shipment.status.clone(),
        delivery_mode: shipment.delivery_mode.clone(),
        courier_name: shipment.courier_name.clone(),
        pickup: shipment.pickup_point(),
        updated_at: shipment.updated_at,
    }))
}
