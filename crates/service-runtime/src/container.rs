//! # Service Container
//!
//! Builds the whole object graph once at startup: transport, gateway,
//! stores, lifecycle manager, journal, signing orchestrator, and the
//! subscription service, with every inbound handler registered before
//! the first message can arrive.

use crate::config::ServiceConfig;
use correlation_gateway::pending::cleanup_task;
use correlation_gateway::{Gateway, InMemoryTransport, MessageTransport};
use identifier_lifecycle::{
    CertificateIssuedHandler, IdentifierLifecycle, InMemoryIdentifierStore, LifecycleConfig,
    RevocationResolvedHandler, SigningOrchestrator, EVENT_CERTIFICATE_CREATED,
    EVENT_CERTIFICATE_REVOKED,
};
use signing_history::{InMemoryHistoryStore, SigningHistoryJournal};
use std::sync::Arc;
use subscriptions::{
    DocumentsStrategy, GatewayUbchProvider, InMemorySubscriptionStore, MockUbchProvider,
    PublicServicesStrategy, StrategyRegistry, SubscriptionCode, SubscriptionService,
    UbchCallbackHandler, UbchProvider, UbchStrategy, EVENT_UBCH_CALLBACK,
};
use tokio::task::JoinHandle;
use tracing::info;

/// Fully wired service graph.
pub struct Container {
    /// Effective configuration.
    pub config: ServiceConfig,
    /// In-process transport; production deployments swap this for a
    /// broker-backed implementation of the same trait.
    pub transport: Arc<InMemoryTransport>,
    /// Correlation gateway shared by every external-facing component.
    pub gateway: Arc<Gateway>,
    /// Identifier lifecycle manager.
    pub lifecycle: Arc<IdentifierLifecycle>,
    /// Hashed-file signing orchestration.
    pub signing: Arc<SigningOrchestrator>,
    /// Signing-history journal.
    pub journal: Arc<SigningHistoryJournal>,
    /// Strategy-dispatched subscription operations.
    pub subscriptions: Arc<SubscriptionService>,
    dispatch: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl Container {
    /// Wire the service graph. Must run inside a tokio runtime; the
    /// gateway dispatch loop and the pending-request sweeper are
    /// spawned here.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let gateway = Arc::new(Gateway::with_timeout(
            transport.clone() as Arc<dyn MessageTransport>,
            config.gateway.sync_timeout(),
        ));
        let dispatch = gateway.spawn_dispatch();
        let sweeper = tokio::spawn(cleanup_task(
            gateway.pending(),
            config.gateway.pending_sweep(),
        ));

        let lifecycle_config = LifecycleConfig {
            pending_ttl: config.lifecycle.pending_ttl(),
            sign_timeout: config.lifecycle.sign_timeout(),
        };
        let lifecycle = Arc::new(IdentifierLifecycle::new(
            gateway.clone(),
            Arc::new(InMemoryIdentifierStore::new()),
            lifecycle_config.clone(),
        ));
        let journal = Arc::new(SigningHistoryJournal::new(
            Arc::new(InMemoryHistoryStore::new()),
            config.security.session_key.clone(),
        ));
        let signing = Arc::new(SigningOrchestrator::new(
            gateway.clone(),
            lifecycle.clone(),
            journal.clone(),
            lifecycle_config,
        ));

        let subscription_store = Arc::new(InMemorySubscriptionStore::new());
        let provider: Arc<dyn UbchProvider> = if config.ubch.use_mock {
            Arc::new(MockUbchProvider)
        } else {
            Arc::new(GatewayUbchProvider::new(
                gateway.clone(),
                config.ubch.session.clone(),
                config.ubch.language.clone(),
            ))
        };
        let registry = StrategyRegistry::new()
            .with(
                SubscriptionCode::CreditHistory,
                Arc::new(UbchStrategy::new(provider)),
            )
            .with(SubscriptionCode::Documents, Arc::new(DocumentsStrategy))
            .with(
                SubscriptionCode::PublicServices,
                Arc::new(PublicServicesStrategy),
            );
        let subscriptions = Arc::new(SubscriptionService::new(
            registry,
            subscription_store.clone(),
        ));

        gateway.register_inbound_handler(
            EVENT_CERTIFICATE_CREATED,
            Arc::new(CertificateIssuedHandler::new(lifecycle.clone())),
        );
        gateway.register_inbound_handler(
            EVENT_CERTIFICATE_REVOKED,
            Arc::new(RevocationResolvedHandler::new(lifecycle.clone())),
        );
        gateway.register_inbound_handler(
            EVENT_UBCH_CALLBACK,
            Arc::new(UbchCallbackHandler::new(subscription_store)),
        );

        info!(
            ubch_mock = config.ubch.use_mock,
            pending_ttl_secs = config.lifecycle.pending_ttl_secs,
            "Service container wired"
        );

        Self {
            config,
            transport,
            gateway,
            lifecycle,
            signing,
            journal,
            subscriptions,
            dispatch,
            sweeper,
        }
    }

    /// Stop the background tasks.
    pub fn shutdown(&self) {
        info!("Stopping gateway dispatch and pending sweeper");
        self.dispatch.abort();
        self.sweeper.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecuritySettings;

    #[tokio::test]
    async fn test_container_wires_and_shuts_down() {
        let config = ServiceConfig {
            security: SecuritySettings {
                session_key: vec![7u8; 32],
            },
            ..ServiceConfig::default()
        };
        let container = Container::new(config);
        assert!(container.gateway.pending().is_empty());
        container.shutdown();
    }
}
