//! # History Store Port
//!
//! Storage port for journal entries plus the in-memory adapter. The
//! upsert is a single conditional entry mutation keyed by resource id;
//! that is the only correctness mechanism against duplicate delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use shared_types::{
    CoreResult, EngagementMeta, SignedDocument, SigningHistoryEntry, SigningStatus, StatusChange,
    UserId,
};

/// Everything needed to create an entry when the resource id is new.
#[derive(Debug, Clone)]
pub struct EntrySeed {
    /// Owning user.
    pub user: UserId,
    /// Pre-derived session id.
    pub session_id: String,
    /// Documents covered by the engagement.
    pub documents: Vec<SignedDocument>,
    /// Relying-party metadata.
    pub meta: EngagementMeta,
}

/// Storage port for the journal.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a status to the entry with `resource_id`, creating it from
    /// `seed` when absent. Atomic per resource id.
    async fn upsert(
        &self,
        resource_id: &str,
        status: SigningStatus,
        recorded_at: DateTime<Utc>,
        seed: EntrySeed,
    ) -> CoreResult<SigningHistoryEntry>;

    /// Fetch one entry by resource id.
    async fn get(&self, resource_id: &str) -> CoreResult<Option<SigningHistoryEntry>>;

    /// All entries of a user whose current status matches.
    async fn list_by_status(
        &self,
        user: &UserId,
        status: SigningStatus,
    ) -> CoreResult<Vec<SigningHistoryEntry>>;

    /// All entries of a user under a public-service code.
    async fn list_by_code(&self, user: &UserId, code: &str)
        -> CoreResult<Vec<SigningHistoryEntry>>;
}

/// In-memory history store.
///
/// `DashMap::entry` gives the per-resource-id atomicity the port
/// requires. A document-database deployment maps this onto conditional
/// single-document updates.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: DashMap<String, SigningHistoryEntry>,
}

impl InMemoryHistoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn upsert(
        &self,
        resource_id: &str,
        status: SigningStatus,
        recorded_at: DateTime<Utc>,
        seed: EntrySeed,
    ) -> CoreResult<SigningHistoryEntry> {
        let change = StatusChange {
            status,
            recorded_at,
        };
        let entry = self
            .entries
            .entry(resource_id.to_owned())
            .and_modify(|existing| existing.status_history.push(change.clone()))
            .or_insert_with(|| SigningHistoryEntry {
                resource_id: resource_id.to_owned(),
                user: seed.user,
                session_id: seed.session_id,
                status_history: vec![change],
                documents: seed.documents,
                meta: seed.meta,
            });
        Ok(entry.clone())
    }

    async fn get(&self, resource_id: &str) -> CoreResult<Option<SigningHistoryEntry>> {
        Ok(self.entries.get(resource_id).map(|e| e.clone()))
    }

    async fn list_by_status(
        &self,
        user: &UserId,
        status: SigningStatus,
    ) -> CoreResult<Vec<SigningHistoryEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user == *user && e.current_status() == Some(status))
            .map(|e| e.clone())
            .collect())
    }

    async fn list_by_code(
        &self,
        user: &UserId,
        code: &str,
    ) -> CoreResult<Vec<SigningHistoryEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user == *user && e.meta.public_service.as_deref() == Some(code))
            .map(|e| e.clone())
            .collect())
    }
}
