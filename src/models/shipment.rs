use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TRACKING_PREFIX: &str = "EBN";
const TRACKING_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    #[serde(rename = "porte_a_porte")]
    DoorToDoor,
    #[serde(rename = "point_relais")]
    RelayPoint,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Sender {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Shipment {
    pub id: String,
    pub tracking_number: Option<String>,
    pub delivery_mode: DeliveryMode,
    pub status: ShipmentStatus,
    pub coordinates: Option<GeoPoint>,
    pub sender: Option<Sender>,
    pub recipient_name: String,
    pub courier_id: Option<String>,
    pub courier_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Shipment {
    pub fn is_door_to_door(&self) -> bool {
        self.delivery_mode == DeliveryMode::DoorToDoor
    }

    pub fn is_accepted(&self) -> bool {
        self.tracking_number.is_some()
    }

    pub fn has_courier(&self) -> bool {
        self.courier_id.is_some()
    }

    /// Direct coordinates win; the sender's location is the fallback.
    pub fn pickup_point(&self) -> Option<GeoPoint> {
        self.coordinates
            .or_else(|| self.sender.as_ref().and_then(|sender| sender.location))
    }

    /// Tracking number when accepted, otherwise the document id.
    pub fn display_ref(&self) -> &str {
        self.tracking_number.as_deref().unwrap_or(&self.id)
    }

    pub fn apply(&mut self, patch: &ShipmentPatch) {
        if let Some(tracking_number) = &patch.tracking_number {
            self.tracking_number = Some(tracking_number.clone());
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(coordinates) = patch.coordinates {
            self.coordinates = Some(coordinates);
        }
        if let Some(courier_id) = &patch.courier_id {
            self.courier_id = Some(courier_id.clone());
        }
        if let Some(courier_name) = &patch.courier_name {
            self.courier_name = Some(courier_name.clone());
        }
        self.updated_at = Some(patch.updated_at);
    }
}

/// Partial update: only `Some` fields are written; `updated_at` always is.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentPatch {
    pub tracking_number: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub coordinates: Option<GeoPoint>,
    pub courier_id: Option<String>,
    pub courier_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentPatch {
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            tracking_number: None,
            status: None,
            coordinates: None,
            courier_id: None,
            courier_name: None,
            updated_at,
        }
    }
}

/// `EBN` + last eight digits of the epoch millis + four uppercase characters.
pub fn generate_tracking_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs() % 100_000_000;
    let suffix: String = Uuid::new_v4().as_bytes()[..4]
        .iter()
        .map(|byte| TRACKING_ALPHABET[usize::from(*byte) % TRACKING_ALPHABET.len()] as char)
        .collect();

    format!("{TRACKING_PREFIX}{millis:08}{suffix}")
}
