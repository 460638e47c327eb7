//! Grievance record persistence using ScyllaDB

use crate::{ScyllaClient, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sauti_core::{
    Category, GrievancePatch, GrievanceRecord, Language, NewGrievance, ProcessingState, Status,
    Urgency,
};
use scylla::macros::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Listing filter. All set criteria must match.
#[derive(Debug, Clone, Default)]
pub struct GrievanceFilter {
    pub category: Option<Category>,
    pub urgency: Option<Urgency>,
    pub status: Option<Status>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    /// Case-insensitive needle over submitter name, incident location
    /// and description
    pub search: Option<String>,
}

impl GrievanceFilter {
    pub fn matches(&self, record: &GrievanceRecord) -> bool {
        if let Some(category) = self.category {
            if record.category != Some(category) {
                return false;
            }
        }
        if let Some(urgency) = self.urgency {
            if record.urgency != Some(urgency) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if record.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if record.created_at > before {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let field_hit = |field: Option<&str>| {
                field
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            };
            if !field_hit(record.submitter_name.as_deref())
                && !field_hit(record.incident_location.as_deref())
                && !record.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Grievance store trait
#[async_trait]
pub trait GrievanceStore: Send + Sync {
    /// Insert a stub record, assigning its id and timestamps
    async fn create(&self, new: NewGrievance) -> Result<GrievanceRecord, StoreError>;
    async fn get(&self, id: Uuid) -> Result<GrievanceRecord, StoreError>;
    /// Apply a partial patch and return the post-update record. Fields the
    /// patch leaves unset are untouched; `updated_at` is stamped either way.
    async fn update(&self, id: Uuid, patch: GrievancePatch) -> Result<GrievanceRecord, StoreError>;
    /// Records matching the filter, newest first
    async fn list(&self, filter: &GrievanceFilter) -> Result<Vec<GrievanceRecord>, StoreError>;
}

fn build_record(new: NewGrievance) -> GrievanceRecord {
    let now = Utc::now();
    GrievanceRecord {
        id: Uuid::new_v4(),
        conversation_id: new.conversation_id,
        language: new.language,
        transcript: None,
        transcript_english: None,
        submitter_name: None,
        submitter_contact: None,
        incident_date: None,
        incident_location: None,
        people_involved: None,
        category: None,
        urgency: None,
        description: new.description,
        status: new.status,
        processing_state: ProcessingState::Unprocessed,
        created_at: now,
        updated_at: now,
    }
}

/// Column/value pairs a patch writes. Every patchable column is TEXT, so the
/// values serialize uniformly.
fn patch_columns(patch: &GrievancePatch) -> Vec<(&'static str, String)> {
    let mut columns = Vec::new();
    if let Some(v) = &patch.transcript {
        columns.push(("transcript", v.clone()));
    }
    if let Some(v) = &patch.transcript_english {
        columns.push(("transcript_english", v.clone()));
    }
    if let Some(v) = &patch.submitter_name {
        columns.push(("submitter_name", v.clone()));
    }
    if let Some(v) = &patch.submitter_contact {
        columns.push(("submitter_contact", v.clone()));
    }
    if let Some(v) = &patch.incident_date {
        columns.push(("incident_date", v.clone()));
    }
    if let Some(v) = &patch.incident_location {
        columns.push(("incident_location", v.clone()));
    }
    if let Some(v) = &patch.people_involved {
        columns.push(("people_involved", v.clone()));
    }
    if let Some(v) = patch.category {
        columns.push(("category", v.as_str().to_string()));
    }
    if let Some(v) = patch.urgency {
        columns.push(("urgency", v.as_str().to_string()));
    }
    if let Some(v) = &patch.description {
        columns.push(("description", v.clone()));
    }
    if let Some(v) = patch.status {
        columns.push(("status", v.as_str().to_string()));
    }
    if let Some(v) = patch.processing_state {
        columns.push(("processing_state", v.as_str().to_string()));
    }
    columns
}

fn apply_patch(record: &mut GrievanceRecord, patch: &GrievancePatch) {
    if let Some(v) = &patch.transcript {
        record.transcript = Some(v.clone());
    }
    if let Some(v) = &patch.transcript_english {
        record.transcript_english = Some(v.clone());
    }
    if let Some(v) = &patch.submitter_name {
        record.submitter_name = Some(v.clone());
    }
    if let Some(v) = &patch.submitter_contact {
        record.submitter_contact = Some(v.clone());
    }
    if let Some(v) = &patch.incident_date {
        record.incident_date = Some(v.clone());
    }
    if let Some(v) = &patch.incident_location {
        record.incident_location = Some(v.clone());
    }
    if let Some(v) = &patch.people_involved {
        record.people_involved = Some(v.clone());
    }
    if let Some(v) = patch.category {
        record.category = Some(v);
    }
    if let Some(v) = patch.urgency {
        record.urgency = Some(v);
    }
    if let Some(v) = &patch.description {
        record.description = v.clone();
    }
    if let Some(v) = patch.status {
        record.status = v;
    }
    if let Some(v) = patch.processing_state {
        record.processing_state = v;
    }
    record.updated_at = Utc::now();
}

/// ScyllaDB implementation of the grievance store
#[derive(Clone)]
pub struct ScyllaGrievanceStore {
    client: ScyllaClient,
}

impl ScyllaGrievanceStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn select_clause(&self) -> String {
        format!(
            "SELECT id, conversation_id, language, transcript, transcript_english,
                    submitter_name, submitter_contact, incident_date, incident_location,
                    people_involved, category, urgency, description, status,
                    processing_state, created_at, updated_at
             FROM {}.grievances",
            self.client.keyspace()
        )
    }
}

/// Raw row shape; field order must match the SELECT column order
#[derive(Debug, FromRow)]
struct GrievanceRow {
    id: Uuid,
    conversation_id: String,
    language: String,
    transcript: Option<String>,
    transcript_english: Option<String>,
    submitter_name: Option<String>,
    submitter_contact: Option<String>,
    incident_date: Option<String>,
    incident_location: Option<String>,
    people_involved: Option<String>,
    category: Option<String>,
    urgency: Option<String>,
    description: String,
    status: Option<String>,
    processing_state: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<GrievanceRow> for GrievanceRecord {
    fn from(row: GrievanceRow) -> Self {
        GrievanceRecord {
            id: row.id,
            conversation_id: row.conversation_id,
            language: Language::parse(&row.language).unwrap_or(Language::En),
            transcript: row.transcript,
            transcript_english: row.transcript_english,
            submitter_name: row.submitter_name,
            submitter_contact: row.submitter_contact,
            incident_date: row.incident_date,
            incident_location: row.incident_location,
            people_involved: row.people_involved,
            category: row.category.as_deref().and_then(Category::parse),
            urgency: row.urgency.as_deref().and_then(Urgency::parse),
            description: row.description,
            status: row
                .status
                .as_deref()
                .and_then(Status::parse)
                .unwrap_or_default(),
            processing_state: row
                .processing_state
                .as_deref()
                .and_then(ProcessingState::parse)
                .unwrap_or_default(),
            created_at: DateTime::from_timestamp_millis(row.created_at).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

#[async_trait]
impl GrievanceStore for ScyllaGrievanceStore {
    async fn create(&self, new: NewGrievance) -> Result<GrievanceRecord, StoreError> {
        let record = build_record(new);

        // Only the stub columns are written; the rest stay null until the
        // session pipeline patches them in.
        let query = format!(
            "INSERT INTO {}.grievances (
                id, conversation_id, language, description, status,
                processing_state, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    record.id,
                    &record.conversation_id,
                    record.language.as_str(),
                    &record.description,
                    record.status.as_str(),
                    record.processing_state.as_str(),
                    record.created_at.timestamp_millis(),
                    record.updated_at.timestamp_millis(),
                ),
            )
            .await?;

        tracing::info!(
            grievance_id = %record.id,
            conversation_id = %record.conversation_id,
            language = record.language.as_str(),
            "Grievance record created in ScyllaDB"
        );

        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<GrievanceRecord, StoreError> {
        let query = format!("{} WHERE id = ?", self.select_clause());

        let result = self.client.session().query_unpaged(query, (id,)).await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let row: GrievanceRow = row
                    .into_typed()
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?;
                return Ok(row.into());
            }
        }

        Err(StoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, patch: GrievancePatch) -> Result<GrievanceRecord, StoreError> {
        // CQL UPDATE upserts; check existence first so missing ids error out
        self.get(id).await?;

        for (column, value) in patch_columns(&patch) {
            let query = format!(
                "UPDATE {}.grievances SET {} = ? WHERE id = ?",
                self.client.keyspace(),
                column
            );
            self.client
                .session()
                .query_unpaged(query, (value, id))
                .await?;
        }

        let query = format!(
            "UPDATE {}.grievances SET updated_at = ? WHERE id = ?",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(query, (Utc::now().timestamp_millis(), id))
            .await?;

        tracing::info!(grievance_id = %id, "Grievance record updated");

        self.get(id).await
    }

    async fn list(&self, filter: &GrievanceFilter) -> Result<Vec<GrievanceRecord>, StoreError> {
        // Full scan; filtering and ordering happen in process
        let result = self
            .client
            .session()
            .query_unpaged(self.select_clause(), &[])
            .await?;

        let mut records = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let row: GrievanceRow = row
                    .into_typed()
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?;
                let record: GrievanceRecord = row.into();
                if filter.matches(&record) {
                    records.push(record);
                }
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

/// In-memory implementation backing tests and database-less deployments
#[derive(Default)]
pub struct InMemoryGrievanceStore {
    records: RwLock<HashMap<Uuid, GrievanceRecord>>,
}

impl InMemoryGrievanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrievanceStore for InMemoryGrievanceStore {
    async fn create(&self, new: NewGrievance) -> Result<GrievanceRecord, StoreError> {
        let record = build_record(new);
        self.records.write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<GrievanceRecord, StoreError> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, patch: GrievancePatch) -> Result<GrievanceRecord, StoreError> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply_patch(record, &patch);
        Ok(record.clone())
    }

    async fn list(&self, filter: &GrievanceFilter) -> Result<Vec<GrievanceRecord>, StoreError> {
        let mut records: Vec<GrievanceRecord> = self
            .records
            .read()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stub(conversation_id: &str) -> NewGrievance {
        NewGrievance::stub(conversation_id, Language::En)
    }

    #[tokio::test]
    async fn test_create_assigns_identity_and_defaults() {
        let store = InMemoryGrievanceStore::new();
        let record = store.create(stub("conv_1_abc")).await.unwrap();

        assert_eq!(record.conversation_id, "conv_1_abc");
        assert_eq!(record.description, "Conversation in progress...");
        assert_eq!(record.status, Status::New);
        assert_eq!(record.processing_state, ProcessingState::Unprocessed);
        assert!(record.submitter_name.is_none());
        assert_eq!(record.created_at, record.updated_at);

        let fetched = store.get(record.id).await.unwrap();
        assert_eq!(fetched.id, record.id);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryGrievanceStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_patches_only_set_fields() {
        let store = InMemoryGrievanceStore::new();
        let record = store.create(stub("conv_2_abc")).await.unwrap();

        let patch = GrievancePatch {
            submitter_name: Some("Maria".to_string()),
            urgency: Some(Urgency::High),
            ..Default::default()
        };
        let updated = store.update(record.id, patch).await.unwrap();

        assert_eq!(updated.submitter_name.as_deref(), Some("Maria"));
        assert_eq!(updated.urgency, Some(Urgency::High));
        // untouched fields survive
        assert_eq!(updated.description, "Conversation in progress...");
        assert_eq!(updated.status, Status::New);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryGrievanceStore::new();
        let err = store
            .update(Uuid::new_v4(), GrievancePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_patch_still_stamps_updated_at() {
        let store = InMemoryGrievanceStore::new();
        let record = store.create(stub("conv_3_abc")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let updated = store.update(record.id, GrievancePatch::default()).await.unwrap();

        assert!(updated.updated_at > record.updated_at);
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = InMemoryGrievanceStore::new();
        let first = store.create(stub("conv_a_111")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = store.create(stub("conv_b_222")).await.unwrap();

        let records = store.list(&GrievanceFilter::default()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
        assert_eq!(records[1].id, first.id);
    }

    #[tokio::test]
    async fn test_list_filters_by_category_and_urgency() {
        let store = InMemoryGrievanceStore::new();
        let wages = store.create(stub("conv_w_111")).await.unwrap();
        let safety = store.create(stub("conv_s_222")).await.unwrap();

        store
            .update(
                wages.id,
                GrievancePatch {
                    category: Some(Category::Wages),
                    urgency: Some(Urgency::Medium),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .update(
                safety.id,
                GrievancePatch {
                    category: Some(Category::Safety),
                    urgency: Some(Urgency::Critical),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let filter = GrievanceFilter {
            category: Some(Category::Safety),
            ..Default::default()
        };
        let records = store.list(&filter).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, safety.id);

        let filter = GrievanceFilter {
            urgency: Some(Urgency::Medium),
            ..Default::default()
        };
        let records = store.list(&filter).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, wages.id);

        // conjunctive: category matches but urgency does not
        let filter = GrievanceFilter {
            category: Some(Category::Wages),
            urgency: Some(Urgency::Critical),
            ..Default::default()
        };
        assert!(store.list(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let store = InMemoryGrievanceStore::new();
        let record = store.create(stub("conv_q_111")).await.unwrap();
        store.create(stub("conv_q_222")).await.unwrap();

        store
            .update(
                record.id,
                GrievancePatch {
                    incident_location: Some("Processing Plant B, Palma district".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let filter = GrievanceFilter {
            search: Some("PALMA".to_string()),
            ..Default::default()
        };
        let records = store.list(&filter).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, record.id);

        let filter = GrievanceFilter {
            search: Some("nowhere".to_string()),
            ..Default::default()
        };
        assert!(store.list(&filter).await.unwrap().is_empty());
    }

    #[test]
    fn test_patch_columns_covers_set_fields_only() {
        let patch = GrievancePatch {
            transcript: Some("User: hello".to_string()),
            category: Some(Category::Wages),
            processing_state: Some(ProcessingState::Processed),
            ..Default::default()
        };

        let columns = patch_columns(&patch);
        let names: Vec<&str> = columns.iter().map(|(c, _)| *c).collect();
        assert_eq!(names, vec!["transcript", "category", "processing_state"]);
        assert_eq!(columns[1].1, "wages");
        assert_eq!(columns[2].1, "processed");
    }
}
