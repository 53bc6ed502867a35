//! In-memory record store.
//!
//! The store is an explicit handle: clones share the same records and the
//! same change channel. Nothing is persisted.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lignage_extractor::fields::apply_patch;
use lignage_extractor::{score_confidence, ExtractorError, Extraction, StrategyKind};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

/// A stored extraction with its bookkeeping.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extraction: Extraction,
}

/// Listing entry.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredRecord> for RecordSummary {
    fn from(stored: &StoredRecord) -> Self {
        Self {
            id: stored.id,
            name: stored.extraction.record.display_name(),
            strategy: stored.extraction.record.strategy,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

/// Change notification sent to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum RecordEvent {
    Created(Uuid),
    Updated(Uuid),
}

#[derive(Clone)]
pub struct RecordStore {
    records: Arc<RwLock<BTreeMap<Uuid, StoredRecord>>>,
    events: broadcast::Sender<RecordEvent>,
}

impl RecordStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            events,
        }
    }

    /// Receive every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.events.subscribe()
    }

    pub async fn insert(&self, extraction: Extraction) -> StoredRecord {
        let now = Utc::now();
        let stored = StoredRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            extraction,
        };
        self.records.write().await.insert(stored.id, stored.clone());
        self.notify(RecordEvent::Created(stored.id));
        stored
    }

    pub async fn get(&self, id: Uuid) -> Option<StoredRecord> {
        self.records.read().await.get(&id).cloned()
    }

    /// All records, oldest first.
    pub async fn list(&self) -> Vec<RecordSummary> {
        let records = self.records.read().await;
        let mut summaries: Vec<RecordSummary> = records.values().map(RecordSummary::from).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Apply a field patch and rescore.
    ///
    /// Returns `Ok(None)` for an unknown id. A patch that fails leaves the
    /// record untouched.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &Map<String, Value>,
    ) -> Result<Option<StoredRecord>, ExtractorError> {
        let mut records = self.records.write().await;
        let Some(stored) = records.get_mut(&id) else {
            return Ok(None);
        };

        apply_patch(&mut stored.extraction.record, patch)?;
        stored.extraction.confidence = score_confidence(&stored.extraction.record);
        stored.updated_at = Utc::now();
        let updated = stored.clone();
        drop(records);

        self.notify(RecordEvent::Updated(id));
        Ok(Some(updated))
    }

    fn notify(&self, event: RecordEvent) {
        // No receivers is not an error.
        let _ = self.events.send(event);
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
