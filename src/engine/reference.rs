use crate::models::shipment::Shipment;

/// Most recently created door-to-door shipment that already has a courier.
///
/// A missing `created_at` ranks as oldest.
pub fn last_assigned_door_to_door(shipments: &[Shipment]) -> Option<&Shipment> {
    // reversed so ties resolve to the earliest in scan order
    shipments
        .iter()
        .filter(|shipment| shipment.is_door_to_door() && shipment.has_courier())
        .rev()
        .max_by_key(|shipment| shipment.created_at)
}

/// Accepted door-to-door shipments without a courier, oldest first.
pub fn pending_door_to_door(shipments: Vec<Shipment>) -> Vec<Shipment> {
    let mut pending: Vec<Shipment> = shipments
        .into_iter()
        .filter(|shipment| {
            shipment.is_door_to_door() && shipment.is_accepted() && !shipment.has_courier()
        })
        .collect();

    pending.sort_by_key(|shipment| shipment.created_at);
    pending
}
