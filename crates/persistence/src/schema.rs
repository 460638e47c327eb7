//! ScyllaDB schema creation

use crate::error::StoreError;
use scylla::Session;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), StoreError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| StoreError::Schema(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), StoreError> {
    // Grievance records. Enum-like columns are stored as their snake_case
    // text form; timestamps are epoch millis.
    let grievances_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.grievances (
            id UUID,
            conversation_id TEXT,
            language TEXT,
            transcript TEXT,
            transcript_english TEXT,
            submitter_name TEXT,
            submitter_contact TEXT,
            incident_date TEXT,
            incident_location TEXT,
            people_involved TEXT,
            category TEXT,
            urgency TEXT,
            description TEXT,
            status TEXT,
            processing_state TEXT,
            created_at BIGINT,
            updated_at BIGINT,
            PRIMARY KEY (id)
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(grievances_table, &[])
        .await
        .map_err(|e| StoreError::Schema(format!("Failed to create grievances table: {}", e)))?;

    tracing::info!("All tables created successfully");
    Ok(())
}
