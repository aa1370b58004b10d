use tracing::{debug, error};

use crate::models::user::{Courier, Role, User};
use crate::observability::metrics::Metrics;
use crate::store::UserDirectory;

/// Keeps directory order; users without email or position drop out.
pub fn eligible_couriers(users: Vec<User>) -> Vec<Courier> {
    users.into_iter().filter_map(Courier::from_user).collect()
}

/// Directory failures degrade to an empty pool instead of an error.
pub async fn fetch_eligible_couriers(directory: &dyn UserDirectory, metrics: &Metrics) -> Vec<Courier> {
    match directory.users_by_role(Role::Courier).await {
        Ok(users) => {
            let total = users.len();
            let couriers = eligible_couriers(users);
            metrics.eligible_couriers.set(couriers.len() as i64);
            debug!(total, eligible = couriers.len(), "courier pool loaded");
            couriers
        }
        Err(err) => {
            metrics.courier_lookup_failures_total.inc();
            error!(error = %err, "failed to fetch couriers");
            Vec::new()
        }
    }
}
