//! # Journal Service
//!
//! Append/upsert operations over the history store, session derivation
//! included. Fed by the identifier lifecycle and by independent
//! relying-party callbacks.

use crate::session::derive_session_id;
use crate::store::{EntrySeed, HistoryStore};
use chrono::Utc;
use shared_types::{
    CoreError, CoreResult, DeviceId, EngagementMeta, SignedDocument, SigningHistoryEntry,
    SigningStatus, UserId,
};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// One journal write.
#[derive(Debug, Clone)]
pub struct UpsertRequest {
    /// Idempotency key for the engagement.
    pub resource_id: String,
    /// Owning user.
    pub user: UserId,
    /// Device the engagement ran on; drives session derivation.
    pub device: DeviceId,
    /// Delivered status.
    pub status: SigningStatus,
    /// Documents covered by the engagement.
    pub documents: Vec<SignedDocument>,
    /// Relying-party metadata.
    pub meta: EngagementMeta,
}

/// The signing-history journal.
pub struct SigningHistoryJournal {
    store: Arc<dyn HistoryStore>,
    session_key: Vec<u8>,
}

impl SigningHistoryJournal {
    /// Create a journal over a store with the service session key.
    #[must_use]
    pub fn new(store: Arc<dyn HistoryStore>, session_key: Vec<u8>) -> Self {
        Self { store, session_key }
    }

    /// Append a status to the entry for `resource_id`, creating the
    /// entry when absent.
    ///
    /// Safe under redelivery: the visible effect is one additional
    /// status-history element per distinct call, keyed on resource id.
    pub async fn upsert_item(&self, request: UpsertRequest) -> CoreResult<SigningHistoryEntry> {
        let session_id = derive_session_id(&self.session_key, &request.device);
        let entry = self
            .store
            .upsert(
                &request.resource_id,
                request.status,
                Utc::now(),
                EntrySeed {
                    user: request.user,
                    session_id,
                    documents: request.documents,
                    meta: request.meta,
                },
            )
            .await?;
        debug!(
            resource_id = %entry.resource_id,
            status = ?request.status,
            history_len = entry.status_history.len(),
            "Journal entry upserted"
        );
        Ok(entry)
    }

    /// Record a signing attempt that failed after dispatch but before
    /// any external resource id existed.
    ///
    /// Synthesizes a local resource id, writes a terminal Refuse entry,
    /// and hands back the original error unchanged for the caller to
    /// re-raise. A journal write failure is logged, never surfaced: the
    /// caller's error is the one that matters.
    pub async fn record_failed_attempt(
        &self,
        user: UserId,
        device: DeviceId,
        documents: Vec<SignedDocument>,
        meta: EngagementMeta,
        original: CoreError,
    ) -> CoreError {
        let resource_id = format!("local-{}", Uuid::new_v4());
        let request = UpsertRequest {
            resource_id,
            user,
            device,
            status: SigningStatus::Refuse,
            documents,
            meta,
        };
        if let Err(e) = self.upsert_item(request).await {
            error!(error = %e, "Failed to journal a refused signing attempt");
        }
        original
    }

    /// Fetch one entry by resource id.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` when no entry exists.
    pub async fn get_item_by_id(&self, resource_id: &str) -> CoreResult<SigningHistoryEntry> {
        self.store
            .get(resource_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("history entry '{resource_id}'")))
    }

    /// All entries of a user whose current status matches.
    pub async fn get_items_by_status(
        &self,
        user: &UserId,
        status: SigningStatus,
    ) -> CoreResult<Vec<SigningHistoryEntry>> {
        self.store.list_by_status(user, status).await
    }

    /// All entries of a user under a public-service code.
    pub async fn get_items_by_code(
        &self,
        user: &UserId,
        code: &str,
    ) -> CoreResult<Vec<SigningHistoryEntry>> {
        self.store.list_by_code(user, code).await
    }
}
