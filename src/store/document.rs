//! Normalization of raw store documents into typed records.
//!
//! Documents written by the dashboard and the mobile app disagree on shape:
//! coordinates arrive as numbers or strings, sender details as flat
//! `senderName` fields or a nested `sender` object, timestamps as RFC 3339
//! strings, epoch millis or `{seconds, nanoseconds}` pairs. Everything is
//! resolved here once so the engine only sees [`Shipment`] and [`User`].

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::models::shipment::{DeliveryMode, GeoPoint, Sender, Shipment, ShipmentStatus};
use crate::models::user::{Position, Role, User};

/// Finite number from a JSON number or a numeric string.
fn loose_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// RFC 3339 string, epoch millis (integer or float) or a `{seconds, nanoseconds}` stamp.
fn loose_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(ms) => Utc.timestamp_millis_opt(ms).single(),
            None => n
                .as_f64()
                .filter(|ms| ms.is_finite() && ms.abs() < i64::MAX as f64)
                .and_then(|ms| Utc.timestamp_millis_opt(ms.trunc() as i64).single()),
        },
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Object(stamp) => {
            let seconds = stamp
                .get("seconds")
                .or_else(|| stamp.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanoseconds = stamp
                .get("nanoseconds")
                .or_else(|| stamp.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, nanoseconds).single()
        }
        _ => None,
    }
}

/// A field of the wrong shape is treated as absent instead of failing the document.
fn field<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v).ok())
}

#[derive(Deserialize)]
struct RawLocation {
    latitude: Option<Value>,
    longitude: Option<Value>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<Value>,
}

impl RawLocation {
    fn point(&self) -> Option<GeoPoint> {
        let lat = self.latitude.as_ref().and_then(loose_number)?;
        let lng = self.longitude.as_ref().and_then(loose_number)?;
        Some(GeoPoint { lat, lng })
    }
}

#[derive(Deserialize)]
struct RawSender {
    name: Option<Value>,
    phone: Option<Value>,
    address: Option<Value>,
    location: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRouteInfo {
    delivery_mode: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShipment {
    tracking_number: Option<Value>,
    sender_name: Option<Value>,
    sender_phone: Option<Value>,
    sender_address: Option<Value>,
    recipient_name: Option<Value>,
    sender: Option<Value>,
    route_info: Option<Value>,
    status: Option<Value>,
    lat: Option<Value>,
    lon: Option<Value>,
    coursier_id: Option<Value>,
    coursier_name: Option<Value>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    email: Option<Value>,
    name: Option<Value>,
    phone: Option<Value>,
    role: Role,
    location: Option<Value>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
}

fn non_empty(value: Option<Value>) -> Option<String> {
    field::<String>(value).filter(|s| !s.trim().is_empty())
}

fn text(value: Option<Value>) -> String {
    field::<String>(value).unwrap_or_default()
}

fn timestamp(value: Option<Value>) -> Option<DateTime<Utc>> {
    value.as_ref().and_then(loose_timestamp)
}

fn malformed(id: &str, err: serde_json::Error) -> StoreError {
    StoreError::Malformed {
        id: id.to_string(),
        reason: err.to_string(),
    }
}

/// Document id from an `id` or `uid` field.
pub fn document_id(doc: &Value) -> Option<&str> {
    doc.get("id")
        .or_else(|| doc.get("uid"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

pub fn shipment_from_document(id: &str, doc: &Value) -> Result<Shipment, StoreError> {
    let raw = RawShipment::deserialize(doc).map_err(|err| malformed(id, err))?;

    let coordinates = match (
        raw.lat.as_ref().and_then(loose_number),
        raw.lon.as_ref().and_then(loose_number),
    ) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
    };

    let sender_name = non_empty(raw.sender_name);
    let sender_phone = non_empty(raw.sender_phone);
    let sender_address = non_empty(raw.sender_address);

    let sender = match field::<RawSender>(raw.sender) {
        Some(nested) => Some(Sender {
            name: non_empty(nested.name).or(sender_name).unwrap_or_default(),
            phone: non_empty(nested.phone).or(sender_phone).unwrap_or_default(),
            address: non_empty(nested.address).or(sender_address),
            location: field::<RawLocation>(nested.location).and_then(|location| location.point()),
        }),
        None if sender_name.is_some() || sender_phone.is_some() || sender_address.is_some() => {
            Some(Sender {
                name: sender_name.unwrap_or_default(),
                phone: sender_phone.unwrap_or_default(),
                address: sender_address,
                location: None,
            })
        }
        None => None,
    };

    let status = field::<ShipmentStatus>(raw.status).unwrap_or_default();

    Ok(Shipment {
        id: id.to_string(),
        tracking_number: non_empty(raw.tracking_number),
        delivery_mode: field::<RawRouteInfo>(raw.route_info)
            .and_then(|route| field::<DeliveryMode>(route.delivery_mode))
            .unwrap_or_default(),
        status,
        coordinates,
        sender,
        recipient_name: text(raw.recipient_name),
        courier_id: non_empty(raw.coursier_id),
        courier_name: non_empty(raw.coursier_name),
        created_at: timestamp(raw.created_at),
        updated_at: timestamp(raw.updated_at),
    })
}

pub fn user_from_document(id: &str, doc: &Value) -> Result<User, StoreError> {
    let raw = RawUser::deserialize(doc).map_err(|err| malformed(id, err))?;

    let position = field::<RawLocation>(raw.location).and_then(|location| {
        location.point().map(|point| Position {
            lat: point.lat,
            lng: point.lng,
            updated_at: location.updated_at.as_ref().and_then(loose_timestamp),
        })
    });

    Ok(User {
        id: id.to_string(),
        email: text(raw.email),
        name: text(raw.name),
        phone: text(raw.phone),
        role: raw.role,
        position,
        created_at: timestamp(raw.created_at),
        updated_at: timestamp(raw.updated_at),
    })
}
