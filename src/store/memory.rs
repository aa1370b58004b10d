use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::StoreError;
use crate::models::shipment::{Shipment, ShipmentPatch};
use crate::models::user::{Role, User};
use crate::store::{ConditionalWrite, ShipmentStore, UserDirectory};

/// Document store held in process. Queries return records in id order, the
/// way an unordered collection read comes back from the hosted store.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    shipments: DashMap<String, Shipment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_shipment(&self, shipment: Shipment) {
        self.shipments.insert(shipment.id.clone(), shipment);
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn shipment_count(&self) -> usize {
        self.shipments.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|entry| entry.value().role == role)
            .map(|entry| entry.value().clone())
            .collect();

        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn get_shipment(&self, id: &str) -> Result<Option<Shipment>, StoreError> {
        Ok(self.shipments.get(id).map(|entry| entry.value().clone()))
    }

    async fn all_shipments(&self) -> Result<Vec<Shipment>, StoreError> {
        let mut shipments: Vec<Shipment> = self
            .shipments
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        shipments.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(shipments)
    }

    async fn update_shipment(&self, id: &str, patch: ShipmentPatch) -> Result<(), StoreError> {
        let mut shipment = self
            .shipments
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("shipment {id}")))?;

        shipment.apply(&patch);
        Ok(())
    }

    async fn assign_courier_if_unassigned(
        &self,
        id: &str,
        courier_id: &str,
        courier_name: &str,
        at: DateTime<Utc>,
    ) -> Result<ConditionalWrite, StoreError> {
        // the entry guard is held across check and write
        let mut shipment = self
            .shipments
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("shipment {id}")))?;

        if let Some(existing) = &shipment.courier_id {
            return Ok(ConditionalWrite::AlreadyAssigned {
                courier_id: existing.clone(),
                courier_name: shipment.courier_name.clone(),
            });
        }

        shipment.courier_id = Some(courier_id.to_string());
        shipment.courier_name = Some(courier_name.to_string());
        shipment.updated_at = Some(at);

        Ok(ConditionalWrite::Applied)
    }
}
