pub mod document;
pub mod memory;
pub mod seed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::shipment::{Shipment, ShipmentPatch};
use crate::models::user::{Role, User};

pub use memory::MemoryStore;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;
}

/// Result of a write that only lands on an unassigned shipment.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalWrite {
    Applied,
    AlreadyAssigned {
        courier_id: String,
        courier_name: Option<String>,
    },
}

#[async_trait]
pub trait ShipmentStore: Send + Sync {
    async fn get_shipment(&self, id: &str) -> Result<Option<Shipment>, StoreError>;

    async fn all_shipments(&self) -> Result<Vec<Shipment>, StoreError>;

    async fn update_shipment(&self, id: &str, patch: ShipmentPatch) -> Result<(), StoreError>;

    async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, StoreError> {
        let shipments = self.all_shipments().await?;
        Ok(shipments
            .into_iter()
            .find(|shipment| shipment.tracking_number.as_deref() == Some(tracking_number)))
    }

    async fn shipments_for_courier(&self, courier_id: &str) -> Result<Vec<Shipment>, StoreError> {
        let shipments = self.all_shipments().await?;
        Ok(shipments
            .into_iter()
            .filter(|shipment| shipment.courier_id.as_deref() == Some(courier_id))
            .collect())
    }

    /// Writes the courier only if the shipment has none yet.
    ///
    /// The default is a read followed by a write and is not atomic; stores
    /// with conditional updates should override it.
    async fn assign_courier_if_unassigned(
        &self,
        id: &str,
        courier_id: &str,
        courier_name: &str,
        at: DateTime<Utc>,
    ) -> Result<ConditionalWrite, StoreError> {
        let current = self
            .get_shipment(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("shipment {id}")))?;

        if let Some(existing) = current.courier_id {
            return Ok(ConditionalWrite::AlreadyAssigned {
                courier_id: existing,
                courier_name: current.courier_name,
            });
        }

        let mut patch = ShipmentPatch::new(at);
        patch.courier_id = Some(courier_id.to_string());
        patch.courier_name = Some(courier_name.to_string());
        self.update_shipment(id, patch).await?;

        Ok(ConditionalWrite::Applied)
    }
}
