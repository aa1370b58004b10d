use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::shipment::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "user")]
    Customer,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "chauffeur")]
    Driver,
    #[serde(rename = "coursier")]
    Courier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "user",
            Role::Admin => "admin",
            Role::Driver => "chauffeur",
            Role::Courier => "coursier",
        }
    }
}

/// Last GPS fix reported by the courier's mobile client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
    pub position: Option<Position>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A directory user that can take part in automatic assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Courier {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub position: Position,
}

impl Courier {
    /// Couriers need a contact email and a known position to be ranked.
    pub fn from_user(user: User) -> Option<Self> {
        if user.role != Role::Courier || user.email.trim().is_empty() {
            return None;
        }

        let position = user.position?;

        Some(Self {
            id: user.id,
            name: user.name,
            phone: user.phone,
            email: user.email,
            position,
        })
    }
}
