//! # Lifecycle Manager
//!
//! Orchestrates identifier transitions over the store and the gateway.

use crate::config::LifecycleConfig;
use crate::payloads::{CertificateIssuedPayload, CreateCertificateRequest, RevokeCertificateRequest};
use crate::store::IdentifierStore;
use crate::{EVENT_CERTIFICATE_CREATE, EVENT_CERTIFICATE_REVOKE};
use chrono::Utc;
use correlation_gateway::Gateway;
use serde_json::Value;
use shared_types::{
    CertificateMetadata, CoreError, CoreResult, DeviceId, IdentifierKey, IdentifierRecord,
    SignAlgorithm, UserId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Device scoping for availability reads.
///
/// "Only this device" and "exclude that other device" are mutually
/// exclusive; asking for both is a validation failure.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityFilter {
    /// Restrict to identifiers bound to this device.
    pub only_device: Option<DeviceId>,
    /// Exclude identifiers bound to this device.
    pub exclude_other_device: Option<DeviceId>,
}

/// Result of a revocation call, distinguishable for user messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationOutcome {
    /// This call revoked `n` identifiers.
    Revoked(usize),
    /// Nothing was Active; the call changed no state.
    NoOp,
}

/// The identifier lifecycle manager.
pub struct IdentifierLifecycle {
    gateway: Arc<Gateway>,
    store: Arc<dyn IdentifierStore>,
    config: LifecycleConfig,
}

impl IdentifierLifecycle {
    /// Wire the manager over a gateway and a store.
    #[must_use]
    pub fn new(
        gateway: Arc<Gateway>,
        store: Arc<dyn IdentifierStore>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
        }
    }

    /// Request a new signing identifier.
    ///
    /// Atomically inserts a Pending record, then issues a
    /// fire-and-forget certificate-creation request carrying the
    /// identity payload. Returns the identifier value immediately; the
    /// external authority confirms through the inbound issuance handler.
    ///
    /// # Errors
    ///
    /// `CoreError::Conflict` when a live (Active, or young Pending)
    /// record occupies the natural key; no duplicate external request is
    /// queued. `CoreError::Transport` when the transport refuses the
    /// creation request; the Pending record is discarded so the caller
    /// can retry immediately instead of waiting out the TTL.
    pub async fn create(
        &self,
        user: UserId,
        device: DeviceId,
        algorithm: SignAlgorithm,
        identity: Value,
    ) -> CoreResult<String> {
        let key = IdentifierKey::new(user, device, algorithm);
        let identifier = Uuid::new_v4().to_string();
        let record = IdentifierRecord::pending(key.clone(), identifier.clone(), Utc::now());

        self.store
            .insert_pending(record, self.config.pending_ttl)
            .await?;

        let request = CreateCertificateRequest {
            identifier: identifier.clone(),
            sign_algo: algorithm,
            identity,
        };
        let payload = serde_json::to_value(&request)?;
        let (event_uuid, accepted) = self.gateway.publish(EVENT_CERTIFICATE_CREATE, payload).await;
        if !accepted {
            warn!(
                user = %key.user,
                identifier = %identifier,
                "Transport refused certificate creation request"
            );
            self.store.discard_pending(&key, &identifier).await?;
            return Err(CoreError::service_unavailable(EVENT_CERTIFICATE_CREATE));
        }
        info!(
            user = %key.user,
            device = %key.device,
            correlation_id = %event_uuid,
            "Certificate creation requested"
        );
        Ok(identifier)
    }

    /// Apply an issuance confirmation from the external authority.
    ///
    /// Best-effort callback: when the Pending record is gone (expired,
    /// revoked, or a duplicate redelivery) the confirmation is logged
    /// and dropped; the original `create` caller returned long ago.
    pub async fn confirm_creation(&self, payload: Value) -> CoreResult<()> {
        let issued: CertificateIssuedPayload = serde_json::from_value(payload)?;
        let certificate = CertificateMetadata {
            serial_number: issued.serial_number,
            registry_id: issued.registry_id,
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
        };

        match self.store.activate(&issued.identifier, certificate).await? {
            Some(record) => {
                info!(
                    user = %record.key.user,
                    device = %record.key.device,
                    "Identifier activated"
                );
            }
            None => {
                debug!(
                    identifier = %issued.identifier,
                    "Dropping issuance confirmation for unknown identifier"
                );
            }
        }
        Ok(())
    }

    /// Active identifiers for a user, after lazily expiring stale
    /// Pending records.
    ///
    /// # Errors
    ///
    /// `CoreError::Validation` when the filter asks for one device and
    /// excludes another at the same time.
    pub async fn check_availability(
        &self,
        user: &UserId,
        filter: AvailabilityFilter,
    ) -> CoreResult<Vec<IdentifierRecord>> {
        if filter.only_device.is_some() && filter.exclude_other_device.is_some() {
            return Err(CoreError::validation(
                "device filter and exclude-other-device filter are mutually exclusive",
            ));
        }

        let expired = self
            .store
            .expire_stale_pending(user, self.config.pending_ttl, Utc::now())
            .await?;
        if expired > 0 {
            debug!(user = %user, expired, "Stale pending identifiers expired");
        }

        self.store
            .list_active(
                user,
                filter.only_device.as_ref(),
                filter.exclude_other_device.as_ref(),
            )
            .await
    }

    /// Revoke the user's Active identifiers, scoped to one device when
    /// given. Idempotent: a second call on an already-revoked set is a
    /// reported no-op.
    ///
    /// Revoked records whose downstream confirmation failed earlier are
    /// re-armed with a fresh event uuid and their revocation requests
    /// re-issued; that retry alone still reports `NoOp`, since nothing
    /// visible to the caller changed.
    pub async fn revoke(
        &self,
        user: &UserId,
        device: Option<&DeviceId>,
    ) -> CoreResult<RevocationOutcome> {
        let revoked = self.store.revoke_active(user, device).await?;
        let rearmed = self.store.rearm_failed_revocations(user, device).await?;
        if revoked.is_empty() && rearmed.is_empty() {
            return Ok(RevocationOutcome::NoOp);
        }

        for record in revoked.iter().chain(rearmed.iter()) {
            let Some(event_uuid) = record.revocation_event else {
                continue;
            };
            let request = RevokeCertificateRequest {
                identifier: record.identifier.clone(),
            };
            let payload = serde_json::to_value(&request)?;
            let accepted = self
                .gateway
                .publish_correlated(EVENT_CERTIFICATE_REVOKE, event_uuid, payload)
                .await;
            if !accepted {
                warn!(
                    identifier = %record.identifier,
                    correlation_id = %event_uuid,
                    "Transport refused revocation request"
                );
            }
        }

        if !rearmed.is_empty() {
            info!(user = %user, count = rearmed.len(), "Failed revocations re-issued");
        }
        if revoked.is_empty() {
            return Ok(RevocationOutcome::NoOp);
        }
        info!(user = %user, count = revoked.len(), "Identifiers revoked");
        Ok(RevocationOutcome::Revoked(revoked.len()))
    }

    /// Resolve the outcome of an outbound revocation request.
    ///
    /// Success finalizes removal of the record tied to the correlation;
    /// failure clears the in-flight marker so a later retry is possible
    /// instead of leaving the identifier stuck.
    pub async fn resolve_revocation_outcome(
        &self,
        event_uuid: Uuid,
        success: bool,
    ) -> CoreResult<()> {
        if success {
            if self.store.remove_by_revocation_event(event_uuid).await? {
                debug!(correlation_id = %event_uuid, "Revoked identifier removed");
            } else {
                debug!(
                    correlation_id = %event_uuid,
                    "Dropping revocation confirmation for unknown correlation"
                );
            }
        } else if self.store.clear_revocation_event(event_uuid).await? {
            warn!(
                correlation_id = %event_uuid,
                "Revocation failed downstream, marker cleared for retry"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryIdentifierStore;
    use correlation_gateway::{InMemoryTransport, MessageTransport};
    use serde_json::json;
    use shared_types::IdentifierStatus;
    use std::time::Duration;

    struct Fixture {
        transport: Arc<InMemoryTransport>,
        store: Arc<InMemoryIdentifierStore>,
        lifecycle: IdentifierLifecycle,
    }

    fn fixture() -> Fixture {
        fixture_with(LifecycleConfig::default())
    }

    fn fixture_with(config: LifecycleConfig) -> Fixture {
        let transport = Arc::new(InMemoryTransport::new());
        let gateway = Arc::new(Gateway::with_timeout(
            transport.clone() as Arc<dyn MessageTransport>,
            Duration::from_millis(200),
        ));
        let store = Arc::new(InMemoryIdentifierStore::new());
        let lifecycle = IdentifierLifecycle::new(gateway, store.clone(), config);
        Fixture {
            transport,
            store,
            lifecycle,
        }
    }

    fn issued(identifier: &str, serial: &str) -> Value {
        json!({
            "identifier": identifier,
            "serialNumber": serial,
            "registryId": "reg-1",
            "issuedAt": "2026-01-01T00:00:00Z",
            "expiresAt": "2028-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_create_then_duplicate_conflicts() {
        let f = fixture();
        let _outbound = f.transport.subscribe_outbound();

        f.lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();

        let err = f
            .lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_refused_creation_publish_frees_the_key() {
        let f = fixture();
        // No outbound consumer, so the transport refuses the publish.
        let err = f
            .lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Transport { .. }));

        let key = IdentifierKey::new("u-1".into(), "d-1".into(), SignAlgorithm::Dstu);
        assert!(f.store.get(&key).is_none());

        // With a consumer attached the immediate retry goes through.
        let _outbound = f.transport.subscribe_outbound();
        f.lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_confirmation_activates_with_serial() {
        let f = fixture();
        let _outbound = f.transport.subscribe_outbound();

        let identifier = f
            .lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();

        f.lifecycle
            .confirm_creation(issued(&identifier, "ABC123"))
            .await
            .unwrap();

        let active = f
            .lifecycle
            .check_availability(&"u-1".into(), AvailabilityFilter::default())
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(
            active[0].certificate.as_ref().unwrap().serial_number,
            "ABC123"
        );
    }

    #[tokio::test]
    async fn test_unknown_confirmation_is_dropped_silently() {
        let f = fixture();
        f.lifecycle
            .confirm_creation(issued("ghost", "ABC123"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_availability_filter_exclusivity() {
        let f = fixture();
        let err = f
            .lifecycle
            .check_availability(
                &"u-1".into(),
                AvailabilityFilter {
                    only_device: Some("d-1".into()),
                    exclude_other_device: Some("d-2".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_stale_pending_expires_on_read() {
        let f = fixture_with(LifecycleConfig {
            pending_ttl: Duration::from_millis(10),
            ..LifecycleConfig::default()
        });
        let _outbound = f.transport.subscribe_outbound();

        f.lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        let active = f
            .lifecycle
            .check_availability(&"u-1".into(), AvailabilityFilter::default())
            .await
            .unwrap();
        assert!(active.is_empty());

        let key = IdentifierKey::new("u-1".into(), "d-1".into(), SignAlgorithm::Dstu);
        assert_eq!(f.store.get(&key).unwrap().status, IdentifierStatus::Expired);
    }

    #[tokio::test]
    async fn test_revoke_then_noop() {
        let f = fixture();
        let _outbound = f.transport.subscribe_outbound();

        let identifier = f
            .lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        f.lifecycle
            .confirm_creation(issued(&identifier, "ABC123"))
            .await
            .unwrap();

        let first = f.lifecycle.revoke(&"u-1".into(), None).await.unwrap();
        assert_eq!(first, RevocationOutcome::Revoked(1));

        let second = f.lifecycle.revoke(&"u-1".into(), None).await.unwrap();
        assert_eq!(second, RevocationOutcome::NoOp);
    }

    #[tokio::test]
    async fn test_revocation_failure_clears_marker() {
        let f = fixture();
        let _outbound = f.transport.subscribe_outbound();

        let identifier = f
            .lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        f.lifecycle
            .confirm_creation(issued(&identifier, "ABC123"))
            .await
            .unwrap();
        f.lifecycle.revoke(&"u-1".into(), None).await.unwrap();

        let key = IdentifierKey::new("u-1".into(), "d-1".into(), SignAlgorithm::Dstu);
        let event = f.store.get(&key).unwrap().revocation_event.unwrap();

        f.lifecycle
            .resolve_revocation_outcome(event, false)
            .await
            .unwrap();
        assert!(f.store.get(&key).unwrap().revocation_event.is_none());
    }

    #[tokio::test]
    async fn test_failed_revocation_is_reissued_by_next_revoke() {
        let f = fixture();
        let _outbound = f.transport.subscribe_outbound();

        let identifier = f
            .lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        f.lifecycle
            .confirm_creation(issued(&identifier, "ABC123"))
            .await
            .unwrap();
        f.lifecycle.revoke(&"u-1".into(), None).await.unwrap();

        let key = IdentifierKey::new("u-1".into(), "d-1".into(), SignAlgorithm::Dstu);
        let event = f.store.get(&key).unwrap().revocation_event.unwrap();
        f.lifecycle
            .resolve_revocation_outcome(event, false)
            .await
            .unwrap();

        // The next revoke re-arms the record under a fresh event uuid
        // and re-issues the request, while the caller still sees a
        // no-op.
        let outcome = f.lifecycle.revoke(&"u-1".into(), None).await.unwrap();
        assert_eq!(outcome, RevocationOutcome::NoOp);
        let reissued = f.store.get(&key).unwrap().revocation_event.unwrap();
        assert_ne!(reissued, event);

        // A successful confirmation for the re-issued request finally
        // removes the record.
        f.lifecycle
            .resolve_revocation_outcome(reissued, true)
            .await
            .unwrap();
        assert!(f.store.get(&key).is_none());
    }

    #[tokio::test]
    async fn test_revocation_success_removes_record() {
        let f = fixture();
        let _outbound = f.transport.subscribe_outbound();

        let identifier = f
            .lifecycle
            .create("u-1".into(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        f.lifecycle
            .confirm_creation(issued(&identifier, "ABC123"))
            .await
            .unwrap();
        f.lifecycle.revoke(&"u-1".into(), None).await.unwrap();

        let key = IdentifierKey::new("u-1".into(), "d-1".into(), SignAlgorithm::Dstu);
        let event = f.store.get(&key).unwrap().revocation_event.unwrap();

        f.lifecycle
            .resolve_revocation_outcome(event, true)
            .await
            .unwrap();
        assert!(f.store.get(&key).is_none());
    }
}
