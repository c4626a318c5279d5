//! # Hashed-File Signing
//!
//! Orchestrates a hashed-file signing engagement: requires an Active
//! identifier, sends the sync signing request through the gateway, and
//! journals the attempt, including failures that happen after dispatch
//! but before any external resource id exists.

use crate::manager::{AvailabilityFilter, IdentifierLifecycle};
use crate::payloads::{SignHashesRequest, SignHashesResponse};
use crate::{LifecycleConfig, EVENT_SIGN_HASHES};
use correlation_gateway::Gateway;
use shared_types::{
    CoreError, CoreResult, DeviceId, EngagementMeta, SignAlgorithm, SignedDocument,
    SigningHistoryEntry, SigningStatus, UserId,
};
use signing_history::{SigningHistoryJournal, UpsertRequest};
use std::sync::Arc;
use tracing::info;

/// One hashed-file signing request from the outer layer.
#[derive(Debug, Clone)]
pub struct HashesSigningRequest {
    /// Owning user.
    pub user: UserId,
    /// Device initiating the signing.
    pub device: DeviceId,
    /// Algorithm of the identifier to sign with.
    pub algorithm: SignAlgorithm,
    /// File hashes to sign.
    pub hashes: Vec<SignedDocument>,
    /// Relying-party metadata for the journal.
    pub meta: EngagementMeta,
}

/// Signing orchestration over the gateway and the journal.
pub struct SigningOrchestrator {
    gateway: Arc<Gateway>,
    lifecycle: Arc<IdentifierLifecycle>,
    journal: Arc<SigningHistoryJournal>,
    config: LifecycleConfig,
}

impl SigningOrchestrator {
    /// Wire the orchestrator.
    #[must_use]
    pub fn new(
        gateway: Arc<Gateway>,
        lifecycle: Arc<IdentifierLifecycle>,
        journal: Arc<SigningHistoryJournal>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            gateway,
            lifecycle,
            journal,
            config,
        }
    }

    /// Initiate hashed-file signing with the external authority.
    ///
    /// On success the engagement is journaled as Processing under the
    /// authority-assigned resource id and the entry is returned. On a
    /// failure after dispatch, the attempt is journaled as a terminal
    /// Refuse under a synthesized resource id and the original error is
    /// re-raised unchanged.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` when the user has no Active identifier on
    /// the device; otherwise whatever the gateway call produced.
    pub async fn init_hashes_signing(
        &self,
        request: HashesSigningRequest,
    ) -> CoreResult<SigningHistoryEntry> {
        let active = self
            .lifecycle
            .check_availability(
                &request.user,
                AvailabilityFilter {
                    only_device: Some(request.device.clone()),
                    exclude_other_device: None,
                },
            )
            .await?;
        let identifier = active
            .iter()
            .find(|r| r.key.algorithm == request.algorithm)
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "no active {} identifier for device {}",
                    request.algorithm, request.device
                ))
            })?
            .identifier
            .clone();

        let payload = serde_json::to_value(&SignHashesRequest {
            identifier,
            hashes: request.hashes.clone(),
        })?;

        let outcome = self
            .gateway
            .send(EVENT_SIGN_HASHES, payload, Some(self.config.sign_timeout))
            .await
            .and_then(|value| {
                serde_json::from_value::<SignHashesResponse>(value).map_err(CoreError::from)
            });

        match outcome {
            Ok(response) => {
                info!(
                    user = %request.user,
                    resource_id = %response.resource_id,
                    "Hashed-file signing dispatched"
                );
                self.journal
                    .upsert_item(UpsertRequest {
                        resource_id: response.resource_id,
                        user: request.user,
                        device: request.device,
                        status: SigningStatus::Processing,
                        documents: request.hashes,
                        meta: request.meta,
                    })
                    .await
            }
            Err(original) => Err(self
                .journal
                .record_failed_attempt(
                    request.user,
                    request.device,
                    request.hashes,
                    request.meta,
                    original,
                )
                .await),
        }
    }
}
