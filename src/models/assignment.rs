use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::Courier;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// No door-to-door shipment has a courier yet; first eligible courier wins.
    ColdStart,
    Nearest,
    /// Distances could not be ranked; first eligible courier wins.
    Fallback,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::ColdStart => "cold_start",
            SelectionStrategy::Nearest => "nearest",
            SelectionStrategy::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    pub courier: Courier,
    pub strategy: SelectionStrategy,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AssignmentOutcome {
    pub success: bool,
    pub courier_id: Option<String>,
    pub courier_name: Option<String>,
}

impl AssignmentOutcome {
    pub fn assigned(courier_id: String, courier_name: Option<String>) -> Self {
        Self {
            success: true,
            courier_id: Some(courier_id),
            courier_name,
        }
    }

    pub fn not_assigned() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub shipment_id: String,
    pub tracking_number: Option<String>,
    pub courier_id: String,
    pub courier_name: String,
    pub strategy: SelectionStrategy,
    pub distance_km: Option<f64>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReconcileSummary {
    pub assigned: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
