use crate::geo::haversine_km;
use crate::models::assignment::{Selection, SelectionStrategy};
use crate::models::shipment::GeoPoint;
use crate::models::user::Courier;

/// Picks one courier for a pickup point.
///
/// On a cold start the first courier in the pool is taken as is. Otherwise the
/// courier whose last position is strictly closest to the pickup wins, ties
/// going to the earlier entry. When no distance can be ranked (NaN from bad
/// coordinates) the first courier is used.
pub fn select_courier(
    couriers: &[Courier],
    pickup: &GeoPoint,
    is_first_shipment: bool,
) -> Option<Selection> {
    let first = couriers.first()?;

    if is_first_shipment {
        return Some(Selection {
            courier: first.clone(),
            strategy: SelectionStrategy::ColdStart,
            distance_km: None,
        });
    }

    let mut nearest: Option<(&Courier, f64)> = None;
    for courier in couriers {
        let distance = haversine_km(&courier.position.point(), pickup);
        let best = nearest.map_or(f64::INFINITY, |(_, best)| best);
        if distance < best {
            nearest = Some((courier, distance));
        }
    }

    let selection = match nearest {
        Some((courier, distance)) => Selection {
            courier: courier.clone(),
            strategy: SelectionStrategy::Nearest,
            distance_km: Some(distance),
        },
        None => Selection {
            courier: first.clone(),
            strategy: SelectionStrategy::Fallback,
            distance_km: None,
        },
    };

    Some(selection)
}
