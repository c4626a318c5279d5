//! # Inbound Handlers
//!
//! Gateway handlers for authority callbacks. Both arrive on channels
//! decoupled from the original request, possibly in a different process
//! instance, and both tolerate duplicate delivery.

use crate::manager::IdentifierLifecycle;
use async_trait::async_trait;
use correlation_gateway::InboundHandler;
use shared_types::envelope::InboundEnvelope;
use shared_types::CoreResult;
use std::sync::Arc;
use tracing::warn;

/// Handles issuance confirmations (`certificate.created`).
pub struct CertificateIssuedHandler {
    lifecycle: Arc<IdentifierLifecycle>,
}

impl CertificateIssuedHandler {
    /// Wrap the lifecycle manager.
    #[must_use]
    pub fn new(lifecycle: Arc<IdentifierLifecycle>) -> Self {
        Self { lifecycle }
    }
}

#[async_trait]
impl InboundHandler for CertificateIssuedHandler {
    async fn handle(&self, envelope: InboundEnvelope) -> CoreResult<()> {
        match envelope.outcome {
            Ok(payload) => self.lifecycle.confirm_creation(payload).await,
            Err(remote) => {
                // The authority refused issuance. The Pending record is
                // left to lapse through the TTL.
                warn!(
                    correlation_id = %envelope.uuid,
                    code = remote.code,
                    message = %remote.message,
                    "Certificate issuance refused by authority"
                );
                Ok(())
            }
        }
    }
}

/// Handles revocation outcomes (`certificate.revoked`).
pub struct RevocationResolvedHandler {
    lifecycle: Arc<IdentifierLifecycle>,
}

impl RevocationResolvedHandler {
    /// Wrap the lifecycle manager.
    #[must_use]
    pub fn new(lifecycle: Arc<IdentifierLifecycle>) -> Self {
        Self { lifecycle }
    }
}

#[async_trait]
impl InboundHandler for RevocationResolvedHandler {
    async fn handle(&self, envelope: InboundEnvelope) -> CoreResult<()> {
        let success = envelope.outcome.is_ok();
        if let Err(remote) = &envelope.outcome {
            warn!(
                correlation_id = %envelope.uuid,
                code = remote.code,
                message = %remote.message,
                "Revocation failed downstream"
            );
        }
        self.lifecycle
            .resolve_revocation_outcome(envelope.uuid, success)
            .await
    }
}
