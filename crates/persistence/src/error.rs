//! Persistence error types

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(#[from] scylla::transport::errors::NewSessionError),

    #[error("Query failed: {0}")]
    Query(#[from] scylla::transport::errors::QueryError),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Grievance not found: {0}")]
    NotFound(Uuid),
}

impl StoreError {
    /// True for the absent-record case, which maps to 404 at the edge
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
