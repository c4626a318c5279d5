//! # Operations Facade
//!
//! The narrow surface the outer layer (action handlers, HTTP routes)
//! calls into. Each operation delegates to one core component; nothing
//! here owns logic of its own.

use crate::container::Container;
use identifier_lifecycle::{AvailabilityFilter, HashesSigningRequest, RevocationOutcome};
use serde_json::Value;
use shared_types::{
    CoreResult, DeviceId, IdentifierRecord, SignAlgorithm, SigningHistoryEntry, SigningStatus,
    UserId,
};
use signing_history::UpsertRequest;
use subscriptions::{SubscriptionCode, SubscriptionParams};

impl Container {
    /// Start issuance of a new signing identifier. Returns the
    /// identifier value; activation arrives later through the
    /// confirmation callback.
    pub async fn create_identifier(
        &self,
        user: UserId,
        device: DeviceId,
        algorithm: SignAlgorithm,
        identity: Value,
    ) -> CoreResult<String> {
        self.lifecycle.create(user, device, algorithm, identity).await
    }

    /// List the user's Active identifiers, optionally filtered by
    /// device.
    pub async fn check_availability(
        &self,
        user: &UserId,
        filter: AvailabilityFilter,
    ) -> CoreResult<Vec<IdentifierRecord>> {
        self.lifecycle.check_availability(user, filter).await
    }

    /// Revoke the user's Active identifiers, scoped to one device when
    /// given.
    pub async fn revoke_identifier(
        &self,
        user: &UserId,
        device: Option<&DeviceId>,
    ) -> CoreResult<RevocationOutcome> {
        self.lifecycle.revoke(user, device).await
    }

    /// Initiate hashed-file signing with the external authority.
    pub async fn init_hashes_signing(
        &self,
        request: HashesSigningRequest,
    ) -> CoreResult<SigningHistoryEntry> {
        self.signing.init_hashes_signing(request).await
    }

    /// Record a delivered engagement status in the journal.
    pub async fn upsert_signing_history_item(
        &self,
        request: UpsertRequest,
    ) -> CoreResult<SigningHistoryEntry> {
        self.journal.upsert_item(request).await
    }

    /// Fetch one journal entry by resource id.
    pub async fn get_signing_history_item(
        &self,
        resource_id: &str,
    ) -> CoreResult<SigningHistoryEntry> {
        self.journal.get_item_by_id(resource_id).await
    }

    /// List a user's journal entries by current status.
    pub async fn get_signing_history_items(
        &self,
        user: &UserId,
        status: SigningStatus,
    ) -> CoreResult<Vec<SigningHistoryEntry>> {
        self.journal.get_items_by_status(user, status).await
    }

    /// List a user's journal entries by public-service code.
    pub async fn get_signing_history_items_by_code(
        &self,
        user: &UserId,
        code: &str,
    ) -> CoreResult<Vec<SigningHistoryEntry>> {
        self.journal.get_items_by_code(user, code).await
    }

    /// Subscribe the user to a code through its registered strategy.
    pub async fn subscribe(
        &self,
        user: &UserId,
        code: SubscriptionCode,
        params: &SubscriptionParams,
    ) -> CoreResult<shared_types::SubscriptionRecord> {
        self.subscriptions.subscribe(user, code, params).await
    }

    /// Register subscription intent for a code without waiting for the
    /// provider's confirmation.
    pub async fn publish_subscription(
        &self,
        user: &UserId,
        code: SubscriptionCode,
        params: &SubscriptionParams,
    ) -> CoreResult<shared_types::SubscriptionRecord> {
        self.subscriptions.publish_subscription(user, code, params).await
    }

    /// Unsubscribe the user from a code.
    pub async fn unsubscribe(
        &self,
        user: &UserId,
        code: SubscriptionCode,
        params: &SubscriptionParams,
    ) -> CoreResult<shared_types::SubscriptionRecord> {
        self.subscriptions.unsubscribe(user, code, params).await
    }
}
