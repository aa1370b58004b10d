use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::StoreError;
use crate::store::document::{document_id, shipment_from_document, user_from_document};
use crate::store::MemoryStore;

/// Export of the `users` and `shipments` collections, one object per document.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<Value>,
    #[serde(default)]
    pub shipments: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub shipments: usize,
}

pub fn apply_seed(store: &MemoryStore, seed: &SeedFile) -> Result<SeedReport, StoreError> {
    for (index, doc) in seed.users.iter().enumerate() {
        let id = document_id(doc).ok_or_else(|| StoreError::Malformed {
            id: format!("users[{index}]"),
            reason: "missing id".to_string(),
        })?;
        store.insert_user(user_from_document(id, doc)?);
    }

    for (index, doc) in seed.shipments.iter().enumerate() {
        let id = document_id(doc).ok_or_else(|| StoreError::Malformed {
            id: format!("shipments[{index}]"),
            reason: "missing id".to_string(),
        })?;
        store.insert_shipment(shipment_from_document(id, doc)?);
    }

    Ok(SeedReport {
        users: seed.users.len(),
        shipments: seed.shipments.len(),
    })
}

pub async fn load_seed(store: &MemoryStore, path: &Path) -> Result<SeedReport, StoreError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
        StoreError::Unavailable(format!("failed to read seed {}: {err}", path.display()))
    })?;

    let seed: SeedFile = serde_json::from_str(&raw).map_err(|err| StoreError::Malformed {
        id: path.display().to_string(),
        reason: err.to_string(),
    })?;

    let report = apply_seed(store, &seed)?;
    info!(
        path = %path.display(),
        users = report.users,
        shipments = report.shipments,
        "seed loaded"
    );

    Ok(report)
}
