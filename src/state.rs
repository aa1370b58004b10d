use std::sync::Arc;

use crate::engine::assignment::AssignmentEngine;
use crate::observability::metrics::Metrics;
use crate::store::{MemoryStore, ShipmentStore, UserDirectory};

pub struct AppState {
    pub users: Arc<dyn UserDirectory>,
    pub shipments: Arc<dyn ShipmentStore>,
    pub engine: AssignmentEngine,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        shipments: Arc<dyn ShipmentStore>,
        event_buffer_size: usize,
    ) -> Self {
        let engine = AssignmentEngine::new(
            users.clone(),
            shipments.clone(),
            Metrics::new(),
            event_buffer_size,
        );

        Self {
            users,
            shipments,
            engine,
        }
    }

    /// Both collaborators served by one in-process store.
    pub fn in_memory(store: Arc<MemoryStore>, event_buffer_size: usize) -> Self {
        Self::new(store.clone(), store, event_buffer_size)
    }
}
