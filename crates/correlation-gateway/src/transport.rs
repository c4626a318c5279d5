//! # Message Transport
//!
//! Abstraction over the at-least-once message transport the gateway rides
//! on, plus an in-memory implementation used for single-process wiring
//! and tests. Distributed deployments supply a broker-backed
//! implementation of the same trait.

use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// A message on the transport: an event name plus an opaque body.
#[derive(Debug, Clone)]
pub struct TransportMessage {
    /// Event (queue/topic) name.
    pub event: String,
    /// Raw message body. The gateway decodes it as a correlation
    /// envelope; the transport never inspects it.
    pub body: Vec<u8>,
}

impl TransportMessage {
    /// Construct a message.
    #[must_use]
    pub fn new(event: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            event: event.into(),
            body,
        }
    }
}

/// A handle on the inbound message stream.
pub struct InboundSubscription {
    receiver: broadcast::Receiver<TransportMessage>,
}

impl InboundSubscription {
    /// Receive the next inbound message.
    ///
    /// Returns `None` when the transport is closed. Lagged deliveries are
    /// skipped with a log line; at-least-once semantics mean the remote
    /// side redelivers anything that matters.
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Inbound subscriber lagged, messages dropped");
                }
            }
        }
    }
}

/// Trait for the transport the gateway publishes to and consumes from.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Publish an outbound message.
    ///
    /// Returns `true` when the transport accepted the message. Acceptance
    /// is not a delivery guarantee.
    async fn publish(&self, message: TransportMessage) -> bool;

    /// Subscribe to the inbound message stream.
    fn subscribe_inbound(&self) -> InboundSubscription;
}

/// In-memory transport over `tokio::sync::broadcast`.
///
/// Two directed channels: `outbound` carries what the service publishes
/// (consumed by external-system fakes in tests), `inbound` carries what
/// external systems deliver to the service.
pub struct InMemoryTransport {
    outbound: broadcast::Sender<TransportMessage>,
    inbound: broadcast::Sender<TransportMessage>,
}

impl InMemoryTransport {
    /// Create a transport with default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a transport with explicit channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (outbound, _) = broadcast::channel(capacity);
        let (inbound, _) = broadcast::channel(capacity);
        Self { outbound, inbound }
    }

    /// Subscribe to outbound traffic. Used by external-system fakes.
    #[must_use]
    pub fn subscribe_outbound(&self) -> InboundSubscription {
        InboundSubscription {
            receiver: self.outbound.subscribe(),
        }
    }

    /// Deliver a message to the service as if an external system sent it.
    ///
    /// Returns the number of inbound subscribers that received it.
    pub fn inject_inbound(&self, message: TransportMessage) -> usize {
        match self.inbound.send(message) {
            Ok(receivers) => receivers,
            Err(e) => {
                warn!(event = %e.0.event, "Inbound message dropped (no subscribers)");
                0
            }
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageTransport for InMemoryTransport {
    async fn publish(&self, message: TransportMessage) -> bool {
        let event = message.event.clone();
        match self.outbound.send(message) {
            Ok(receivers) => {
                debug!(event = %event, receivers, "Outbound message published");
                true
            }
            Err(_) => {
                warn!(event = %event, "Outbound message dropped (no receivers)");
                false
            }
        }
    }

    fn subscribe_inbound(&self) -> InboundSubscription {
        InboundSubscription {
            receiver: self.inbound.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_publish_without_consumers_is_rejected() {
        let transport = InMemoryTransport::new();
        let accepted = transport
            .publish(TransportMessage::new("certificate.create", vec![1, 2]))
            .await;
        assert!(!accepted);
    }

    #[tokio::test]
    async fn test_outbound_reaches_external_fake() {
        let transport = InMemoryTransport::new();
        let mut external = transport.subscribe_outbound();

        let accepted = transport
            .publish(TransportMessage::new("certificate.create", vec![7]))
            .await;
        assert!(accepted);

        let message = timeout(Duration::from_millis(100), external.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(message.event, "certificate.create");
        assert_eq!(message.body, vec![7]);
    }

    #[tokio::test]
    async fn test_inject_inbound_reaches_subscriber() {
        let transport = InMemoryTransport::new();
        let mut inbound = transport.subscribe_inbound();

        let receivers =
            transport.inject_inbound(TransportMessage::new("certificate.created", vec![9]));
        assert_eq!(receivers, 1);

        let message = timeout(Duration::from_millis(100), inbound.recv())
            .await
            .expect("timeout")
            .expect("message");
        assert_eq!(message.event, "certificate.created");
    }

    #[tokio::test]
    async fn test_inject_without_subscribers_returns_zero() {
        let transport = InMemoryTransport::new();
        let receivers = transport.inject_inbound(TransportMessage::new("x", Vec::new()));
        assert_eq!(receivers, 0);
    }
}
