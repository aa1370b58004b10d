use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::engine::candidates::fetch_eligible_couriers;
use crate::engine::reference::{last_assigned_door_to_door, pending_door_to_door};
use crate::engine::selection::select_courier;
use crate::error::StoreError;
use crate::models::assignment::{AssignmentEvent, AssignmentOutcome, ReconcileSummary, Selection};
use crate::models::shipment::{GeoPoint, Shipment};
use crate::models::user::Courier;
use crate::observability::metrics::Metrics;
use crate::store::{ConditionalWrite, ShipmentStore, UserDirectory};

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("delivery mode is not door-to-door")]
    NotDoorToDoor,

    #[error("shipment has no GPS coordinates")]
    MissingCoordinates,

    #[error("no available courier found")]
    NoCourierAvailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AssignError {
    fn outcome_label(&self) -> &'static str {
        match self {
            AssignError::NotDoorToDoor => "ineligible",
            AssignError::MissingCoordinates => "missing_coordinates",
            AssignError::NoCourierAvailable => "no_courier",
            AssignError::Store(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assigned {
    pub courier_id: String,
    pub courier_name: Option<String>,
    /// False when the shipment already carried a courier.
    pub newly_assigned: bool,
}

/// Nearest-courier assignment for door-to-door shipments.
///
/// Every call works on the current snapshot of courier positions. Nothing is
/// reserved on the courier side, so two shipments assigned at the same time
/// can land on the same courier. The shipment write itself is conditional and
/// never replaces a courier that is already on record.
pub struct AssignmentEngine {
    users: Arc<dyn UserDirectory>,
    shipments: Arc<dyn ShipmentStore>,
    metrics: Metrics,
    events_tx: broadcast::Sender<AssignmentEvent>,
    sweep_lock: Mutex<()>,
}

impl AssignmentEngine {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        shipments: Arc<dyn ShipmentStore>,
        metrics: Metrics,
        event_buffer_size: usize,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));

        Self {
            users,
            shipments,
            metrics,
            events_tx,
            sweep_lock: Mutex::new(()),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssignmentEvent> {
        self.events_tx.subscribe()
    }

    pub async fn eligible_couriers(&self) -> Vec<Courier> {
        fetch_eligible_couriers(self.users.as_ref(), &self.metrics).await
    }

    pub async fn find_best_courier(
        &self,
        lat: f64,
        lng: f64,
        is_first_shipment: bool,
    ) -> Option<Courier> {
        self.select(GeoPoint { lat, lng }, is_first_shipment)
            .await
            .map(|selection| selection.courier)
    }

    pub async fn last_assigned_door_to_door(&self) -> Result<Option<Shipment>, StoreError> {
        let shipments = self.shipments.all_shipments().await?;
        Ok(last_assigned_door_to_door(&shipments).cloned())
    }

    /// Best-effort assignment; failures are logged and reported as
    /// `success: false`, never returned as errors.
    pub async fn assign_courier(&self, shipment_id: &str, shipment: &Shipment) -> AssignmentOutcome {
        match self.run_assignment(shipment_id, shipment).await {
            Ok(assigned) => AssignmentOutcome::assigned(assigned.courier_id, assigned.courier_name),
            Err(_) => AssignmentOutcome::not_assigned(),
        }
    }

    /// Assigns every accepted, unassigned door-to-door shipment, oldest first.
    ///
    /// Items run one after another: each assignment can flip the cold-start
    /// decision for the next. Concurrent sweeps queue on the engine lock.
    pub async fn reconcile_pending(&self) -> ReconcileSummary {
        let _sweep = self.sweep_lock.lock().await;
        self.metrics.reconcile_runs_total.inc();

        let mut summary = ReconcileSummary::default();

        let shipments = match self.shipments.all_shipments().await {
            Ok(shipments) => shipments,
            Err(err) => {
                error!(error = %err, "reconciliation scan failed");
                summary.errors.push(err.to_string());
                return summary;
            }
        };

        let pending = pending_door_to_door(shipments);
        info!(pending = pending.len(), "reconciliation sweep started");

        for shipment in &pending {
            match self.run_assignment(&shipment.id, shipment).await {
                Ok(_) => summary.assigned += 1,
                Err(err) => {
                    summary.failed += 1;
                    summary
                        .errors
                        .push(format!("shipment {}: {err}", shipment.display_ref()));
                }
            }
        }

        self.metrics
            .reconcile_pending_shipments
            .set(summary.failed as i64);

        info!(
            assigned = summary.assigned,
            failed = summary.failed,
            "reconciliation sweep finished"
        );

        summary
    }

    async fn select(&self, pickup: GeoPoint, is_first_shipment: bool) -> Option<Selection> {
        let couriers = self.eligible_couriers().await;
        select_courier(&couriers, &pickup, is_first_shipment)
    }

    async fn run_assignment(
        &self,
        shipment_id: &str,
        shipment: &Shipment,
    ) -> Result<Assigned, AssignError> {
        let start = Instant::now();
        let result = self.try_assign(shipment_id, shipment).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(assigned) if assigned.newly_assigned => {
                self.metrics.record_assignment("assigned", elapsed);
            }
            Ok(_) => self.metrics.record_assignment("already_assigned", elapsed),
            Err(err) => {
                self.metrics.record_assignment(err.outcome_label(), elapsed);
                match err {
                    AssignError::NotDoorToDoor => {
                        debug!(shipment_id, "skipping shipment: not door-to-door");
                    }
                    AssignError::MissingCoordinates | AssignError::NoCourierAvailable => {
                        warn!(shipment_id, reason = %err, "courier not assigned");
                    }
                    AssignError::Store(store_err) => {
                        error!(shipment_id, error = %store_err, "courier assignment failed");
                    }
                }
            }
        }

        result
    }

    async fn try_assign(
        &self,
        shipment_id: &str,
        shipment: &Shipment,
    ) -> Result<Assigned, AssignError> {
        if !shipment.is_door_to_door() {
            return Err(AssignError::NotDoorToDoor);
        }

        if let Some(courier_id) = &shipment.courier_id {
            return Ok(Assigned {
                courier_id: courier_id.clone(),
                courier_name: shipment.courier_name.clone(),
                newly_assigned: false,
            });
        }

        let pickup = shipment
            .pickup_point()
            .ok_or(AssignError::MissingCoordinates)?;

        let is_first_shipment = self.last_assigned_door_to_door().await?.is_none();

        debug!(
            shipment_id,
            is_first_shipment,
            lat = pickup.lat,
            lng = pickup.lng,
            "selecting courier"
        );

        let selection = self
            .select(pickup, is_first_shipment)
            .await
            .ok_or(AssignError::NoCourierAvailable)?;

        let now = Utc::now();
        let write = self
            .shipments
            .assign_courier_if_unassigned(
                shipment_id,
                &selection.courier.id,
                &selection.courier.name,
                now,
            )
            .await?;

        match write {
            ConditionalWrite::Applied => {
                info!(
                    shipment_id,
                    courier_id = %selection.courier.id,
                    strategy = selection.strategy.as_str(),
                    distance_km = selection.distance_km,
                    "courier assigned"
                );

                let _ = self.events_tx.send(AssignmentEvent {
                    shipment_id: shipment_id.to_string(),
                    tracking_number: shipment.tracking_number.clone(),
                    courier_id: selection.courier.id.clone(),
                    courier_name: selection.courier.name.clone(),
                    strategy: selection.strategy,
                    distance_km: selection.distance_km,
                    assigned_at: now,
                });

                Ok(Assigned {
                    courier_id: selection.courier.id,
                    courier_name: Some(selection.courier.name),
                    newly_assigned: true,
                })
            }
            ConditionalWrite::AlreadyAssigned {
                courier_id,
                courier_name,
            } => {
                info!(
                    shipment_id,
                    courier_id = %courier_id,
                    "shipment was assigned concurrently; keeping existing courier"
                );

                Ok(Assigned {
                    courier_id,
                    courier_name,
                    newly_assigned: false,
                })
            }
        }
    }
}
