//! # Gateway
//!
//! Outbound request/response and fire-and-forget sends plus inbound
//! dispatch. One dispatch task routes every inbound message either to
//! the pending store (correlated sync response) or to the handler
//! registered for the message's event; anything else is dropped.

use crate::pending::{PendingOutcome, PendingStore};
use crate::transport::{MessageTransport, TransportMessage};
use crate::DEFAULT_SYNC_TIMEOUT_SECS;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use shared_types::envelope::{InboundEnvelope, OutboundEnvelope};
use shared_types::{CoreError, CoreResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Handler for inbound messages on one event, registered with
/// [`Gateway::register_inbound_handler`].
///
/// Invoked for every delivery on its event regardless of which call (if
/// any) produced the message. Delivery is at-least-once: implementations
/// must be idempotent against natural keys.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    /// Process one decoded inbound envelope.
    ///
    /// # Errors
    ///
    /// Errors are logged by the dispatch loop and never re-raised into
    /// the transport.
    async fn handle(&self, envelope: InboundEnvelope) -> CoreResult<()>;
}

/// The correlation gateway.
pub struct Gateway {
    transport: Arc<dyn MessageTransport>,
    pending: Arc<PendingStore>,
    handlers: DashMap<String, Arc<dyn InboundHandler>>,
    default_timeout: Duration,
}

impl Gateway {
    /// Create a gateway over a transport with a default sync timeout.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self::with_timeout(transport, Duration::from_secs(DEFAULT_SYNC_TIMEOUT_SECS))
    }

    /// Create a gateway with an explicit default sync timeout.
    #[must_use]
    pub fn with_timeout(transport: Arc<dyn MessageTransport>, default_timeout: Duration) -> Self {
        Self {
            transport,
            pending: Arc::new(PendingStore::new(default_timeout)),
            handlers: DashMap::new(),
            default_timeout,
        }
    }

    /// Access the pending store (cleanup task wiring).
    #[must_use]
    pub fn pending(&self) -> Arc<PendingStore> {
        self.pending.clone()
    }

    /// Register the handler for inbound messages on `event`.
    ///
    /// A second registration for the same event replaces the first.
    pub fn register_inbound_handler(&self, event: &str, handler: Arc<dyn InboundHandler>) {
        if self.handlers.insert(event.to_owned(), handler).is_some() {
            warn!(event, "Replaced existing inbound handler");
        }
    }

    /// Send a request and suspend the calling task until the correlated
    /// response arrives or the timeout elapses.
    ///
    /// # Errors
    ///
    /// - `CoreError::Transport` when the transport refuses the message or
    ///   no response arrives in time.
    /// - `CoreError::Provider` when the response envelope carries a
    ///   remote error.
    pub async fn send(
        &self,
        event: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> CoreResult<Value> {
        let (correlation_id, rx) = self.pending.register(event, timeout);
        let wait = timeout.unwrap_or(self.default_timeout);

        if !self.publish_envelope(event, correlation_id, payload).await {
            self.pending.cancel(&correlation_id);
            return Err(CoreError::Transport {
                reason: format!("transport refused event '{event}'"),
            });
        }

        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(outcome)) => Self::into_result(outcome),
            Ok(Err(_)) => {
                // Sender side dropped without completing (store reclaim).
                Err(CoreError::service_unavailable(event))
            }
            Err(_) => {
                // Abandon the correlation; a late response is dropped at
                // the dispatch loop.
                self.pending.cancel(&correlation_id);
                warn!(event, correlation_id = %correlation_id, "Sync send timed out");
                Err(CoreError::service_unavailable(event))
            }
        }
    }

    /// Fire-and-forget publish under a fresh correlation id.
    ///
    /// Returns the generated correlation id and whether the transport
    /// accepted the message. The eventual reply, if any, arrives
    /// independently through a registered inbound handler.
    pub async fn publish(&self, event: &str, payload: Value) -> (Uuid, bool) {
        let correlation_id = Uuid::new_v4();
        let accepted = self.publish_envelope(event, correlation_id, payload).await;
        (correlation_id, accepted)
    }

    /// Fire-and-forget publish under a caller-supplied correlation id.
    pub async fn publish_correlated(
        &self,
        event: &str,
        correlation_id: Uuid,
        payload: Value,
    ) -> bool {
        self.publish_envelope(event, correlation_id, payload).await
    }

    async fn publish_envelope(&self, event: &str, correlation_id: Uuid, payload: Value) -> bool {
        let envelope = OutboundEnvelope::new(correlation_id, payload);
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => {
                error!(event, error = %e, "Failed to encode outbound envelope");
                return false;
            }
        };
        self.transport
            .publish(TransportMessage::new(event, body))
            .await
    }

    fn into_result(outcome: PendingOutcome) -> CoreResult<Value> {
        match outcome {
            Ok(value) => Ok(value),
            Err(remote) => Err(CoreError::Provider {
                code: remote.code,
                message: remote.message,
            }),
        }
    }

    /// Spawn the inbound dispatch loop.
    ///
    /// The task ends when the transport closes.
    pub fn spawn_dispatch(self: &Arc<Self>) -> JoinHandle<()> {
        let gateway = Arc::clone(self);
        let mut inbound = gateway.transport.subscribe_inbound();
        tokio::spawn(async move {
            while let Some(message) = inbound.recv().await {
                gateway.dispatch(message).await;
            }
            debug!("Transport closed, dispatch loop ending");
        })
    }

    async fn dispatch(&self, message: TransportMessage) {
        let envelope = match InboundEnvelope::decode(&message.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(event = %message.event, error = %e, "Dropping malformed inbound message");
                return;
            }
        };

        // A correlated sync caller wins over the event handler.
        if self.pending.complete(envelope.uuid, envelope.outcome.clone()) {
            return;
        }

        let Some(handler) = self.handlers.get(&message.event).map(|h| h.clone()) else {
            warn!(
                event = %message.event,
                correlation_id = %envelope.uuid,
                "Dropping unmatched inbound message"
            );
            return;
        };

        let correlation_id = envelope.uuid;
        if let Err(e) = handler.handle(envelope).await {
            if e.is_callback_swallowed() {
                // Redelivery cannot change the remote decision and the
                // original caller has long since returned.
                error!(
                    event = %message.event,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Inbound callback failed"
                );
            } else {
                warn!(
                    event = %message.event,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Inbound callback rejected message"
                );
            }
        }
    }
}
