//! ScyllaDB persistence layer for sauti
//!
//! Stores one table of grievance records. Deployments without a reachable
//! cluster fall back to an in-memory store so the rest of the system keeps
//! working (records are then lost on restart).

pub mod client;
pub mod error;
pub mod grievances;
pub mod schema;

pub use client::{ScyllaClient, ScyllaConfig};
pub use error::StoreError;
pub use grievances::{
    GrievanceFilter, GrievanceStore, InMemoryGrievanceStore, ScyllaGrievanceStore,
};

use std::sync::Arc;

/// Connect to ScyllaDB, ensure the schema, and hand back the store
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, StoreError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        grievances: Arc::new(ScyllaGrievanceStore::new(client)),
    })
}

/// In-memory layer for tests and database-less runs
pub fn init_in_memory() -> PersistenceLayer {
    PersistenceLayer {
        grievances: Arc::new(InMemoryGrievanceStore::new()),
    }
}

/// Handles to the configured stores
#[derive(Clone)]
pub struct PersistenceLayer {
    pub grievances: Arc<dyn GrievanceStore>,
}
