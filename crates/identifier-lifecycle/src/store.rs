//! # Identifier Store Port
//!
//! Storage port for identifier records plus the in-memory adapter. Every
//! operation is a conditional, single-record mutation: the natural key
//! holds at most one live record, and transitions re-check the current
//! status inside the atomic update.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use shared_types::{
    CertificateMetadata, CoreError, CoreResult, DeviceId, IdentifierKey, IdentifierRecord,
    IdentifierStatus, UserId,
};
use std::time::Duration;
use uuid::Uuid;

/// Storage port for identifier records.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// Insert a fresh Pending record unless a live record occupies the
    /// natural key.
    ///
    /// Live means Active, or Pending younger than `pending_ttl`. A stale
    /// Pending or a terminal record is replaced.
    ///
    /// # Errors
    ///
    /// `CoreError::Conflict` when a live record exists.
    async fn insert_pending(
        &self,
        record: IdentifierRecord,
        pending_ttl: Duration,
    ) -> CoreResult<()>;

    /// Remove a Pending record whose creation request could not be
    /// queued. Conditional on the record still being Pending and
    /// carrying `identifier`. Returns `true` when a record was removed.
    async fn discard_pending(&self, key: &IdentifierKey, identifier: &str) -> CoreResult<bool>;

    /// Transition the Pending record carrying `identifier` to Active with
    /// certificate metadata. Returns the updated record, or `None` when
    /// no Pending record carries that identifier (expired, revoked, or a
    /// duplicate redelivery).
    async fn activate(
        &self,
        identifier: &str,
        certificate: CertificateMetadata,
    ) -> CoreResult<Option<IdentifierRecord>>;

    /// Reclassify the user's stale Pending records as Expired. Returns
    /// the number reclassified.
    async fn expire_stale_pending(
        &self,
        user: &UserId,
        pending_ttl: Duration,
        now: DateTime<Utc>,
    ) -> CoreResult<usize>;

    /// The user's Active records, optionally restricted to one device or
    /// excluding one device.
    async fn list_active(
        &self,
        user: &UserId,
        only_device: Option<&DeviceId>,
        exclude_device: Option<&DeviceId>,
    ) -> CoreResult<Vec<IdentifierRecord>>;

    /// Mark the user's Active records Revoked (one device or all),
    /// assigning each a fresh revocation event uuid. Returns the
    /// records as revoked; an empty result means nothing was Active.
    async fn revoke_active(
        &self,
        user: &UserId,
        device: Option<&DeviceId>,
    ) -> CoreResult<Vec<IdentifierRecord>>;

    /// Finalize a confirmed revocation: remove the record whose
    /// revocation marker equals `event`. Returns `true` when a record
    /// was removed.
    async fn remove_by_revocation_event(&self, event: Uuid) -> CoreResult<bool>;

    /// Clear the revocation marker after a failed revocation so a retry
    /// is possible. Returns `true` when a marker was cleared.
    async fn clear_revocation_event(&self, event: Uuid) -> CoreResult<bool>;

    /// Re-arm the user's Revoked records whose marker was cleared by a
    /// failed downstream confirmation, assigning each a fresh
    /// revocation event uuid. Returns the re-armed records so their
    /// revocation requests can be re-issued.
    async fn rearm_failed_revocations(
        &self,
        user: &UserId,
        device: Option<&DeviceId>,
    ) -> CoreResult<Vec<IdentifierRecord>>;
}

fn is_stale(record: &IdentifierRecord, ttl: Duration, now: DateTime<Utc>) -> bool {
    let Ok(ttl) = ChronoDuration::from_std(ttl) else {
        return false;
    };
    record.status == IdentifierStatus::Pending && now - record.pending_created_at > ttl
}

/// In-memory identifier store keyed by natural key.
///
/// `DashMap::entry` supplies the single-record atomicity the port
/// requires; a document-database deployment maps each method onto one
/// conditional update.
#[derive(Default)]
pub struct InMemoryIdentifierStore {
    records: DashMap<IdentifierKey, IdentifierRecord>,
}

impl InMemoryIdentifierStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a record by natural key (tests and diagnostics).
    #[must_use]
    pub fn get(&self, key: &IdentifierKey) -> Option<IdentifierRecord> {
        self.records.get(key).map(|r| r.clone())
    }
}

#[async_trait]
impl IdentifierStore for InMemoryIdentifierStore {
    async fn insert_pending(
        &self,
        record: IdentifierRecord,
        pending_ttl: Duration,
    ) -> CoreResult<()> {
        let now = Utc::now();
        match self.records.entry(record.key.clone()) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                let existing = slot.get();
                let live = match existing.status {
                    IdentifierStatus::Active => true,
                    IdentifierStatus::Pending => !is_stale(existing, pending_ttl, now),
                    IdentifierStatus::Revoked | IdentifierStatus::Expired => false,
                };
                if live {
                    return Err(CoreError::Conflict(format!(
                        "identifier already {} for user {}",
                        match existing.status {
                            IdentifierStatus::Active => "active",
                            _ => "pending",
                        },
                        record.key.user
                    )));
                }
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn discard_pending(&self, key: &IdentifierKey, identifier: &str) -> CoreResult<bool> {
        Ok(self
            .records
            .remove_if(key, |_, record| {
                record.status == IdentifierStatus::Pending && record.identifier == identifier
            })
            .is_some())
    }

    async fn activate(
        &self,
        identifier: &str,
        certificate: CertificateMetadata,
    ) -> CoreResult<Option<IdentifierRecord>> {
        // Locate the natural key, then re-check status inside the
        // entry so a concurrent transition cannot be overwritten.
        let key = self
            .records
            .iter()
            .find(|r| r.identifier == identifier)
            .map(|r| r.key.clone());
        let Some(key) = key else {
            return Ok(None);
        };

        let mut updated = None;
        self.records.entry(key).and_modify(|record| {
            if record.status == IdentifierStatus::Pending && record.identifier == identifier {
                record.status = IdentifierStatus::Active;
                record.certificate = Some(certificate);
                updated = Some(record.clone());
            }
        });
        Ok(updated)
    }

    async fn expire_stale_pending(
        &self,
        user: &UserId,
        pending_ttl: Duration,
        now: DateTime<Utc>,
    ) -> CoreResult<usize> {
        let mut expired = 0;
        for mut record in self.records.iter_mut() {
            if record.key.user == *user && is_stale(&record, pending_ttl, now) {
                record.status = IdentifierStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn list_active(
        &self,
        user: &UserId,
        only_device: Option<&DeviceId>,
        exclude_device: Option<&DeviceId>,
    ) -> CoreResult<Vec<IdentifierRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.key.user == *user && r.status == IdentifierStatus::Active)
            .filter(|r| only_device.is_none_or(|d| r.key.device == *d))
            .filter(|r| exclude_device.is_none_or(|d| r.key.device != *d))
            .map(|r| r.clone())
            .collect())
    }

    async fn revoke_active(
        &self,
        user: &UserId,
        device: Option<&DeviceId>,
    ) -> CoreResult<Vec<IdentifierRecord>> {
        let mut revoked = Vec::new();
        for mut record in self.records.iter_mut() {
            if record.key.user == *user
                && record.status == IdentifierStatus::Active
                && device.is_none_or(|d| record.key.device == *d)
            {
                record.status = IdentifierStatus::Revoked;
                record.revocation_event = Some(Uuid::new_v4());
                revoked.push(record.clone());
            }
        }
        Ok(revoked)
    }

    async fn remove_by_revocation_event(&self, event: Uuid) -> CoreResult<bool> {
        let key = self
            .records
            .iter()
            .find(|r| r.revocation_event == Some(event))
            .map(|r| r.key.clone());
        Ok(match key {
            Some(key) => self.records.remove(&key).is_some(),
            None => false,
        })
    }

    async fn clear_revocation_event(&self, event: Uuid) -> CoreResult<bool> {
        let mut cleared = false;
        for mut record in self.records.iter_mut() {
            if record.revocation_event == Some(event) {
                record.revocation_event = None;
                cleared = true;
            }
        }
        Ok(cleared)
    }

    async fn rearm_failed_revocations(
        &self,
        user: &UserId,
        device: Option<&DeviceId>,
    ) -> CoreResult<Vec<IdentifierRecord>> {
        let mut rearmed = Vec::new();
        for mut record in self.records.iter_mut() {
            if record.key.user == *user
                && record.status == IdentifierStatus::Revoked
                && record.revocation_event.is_none()
                && device.is_none_or(|d| record.key.device == *d)
            {
                record.revocation_event = Some(Uuid::new_v4());
                rearmed.push(record.clone());
            }
        }
        Ok(rearmed)
    }
}
