//! # Lifecycle Integration
//!
//! Conflict, TTL abandonment, and revocation behavior of the
//! identifier lifecycle over a wired gateway.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use correlation_gateway::{Gateway, InMemoryTransport, MessageTransport};
    use identifier_lifecycle::{
        AvailabilityFilter, IdentifierLifecycle, InMemoryIdentifierStore, LifecycleConfig,
        RevocationOutcome,
    };
    use serde_json::json;
    use shared_types::{CoreError, SignAlgorithm, UserId};

    struct Fixture {
        transport: Arc<InMemoryTransport>,
        lifecycle: IdentifierLifecycle,
    }

    fn fixture(pending_ttl: Duration) -> Fixture {
        let transport = Arc::new(InMemoryTransport::new());
        let gateway = Arc::new(Gateway::new(transport.clone() as Arc<dyn MessageTransport>));
        gateway.spawn_dispatch();
        let lifecycle = IdentifierLifecycle::new(
            gateway,
            Arc::new(InMemoryIdentifierStore::new()),
            LifecycleConfig {
                pending_ttl,
                ..LifecycleConfig::default()
            },
        );
        Fixture {
            transport,
            lifecycle,
        }
    }

    fn issued(identifier: &str, serial: &str) -> serde_json::Value {
        json!({
            "identifier": identifier,
            "serialNumber": serial,
            "registryId": "reg-1",
            "issuedAt": "2026-01-01T00:00:00Z",
            "expiresAt": "2028-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_double_create_within_ttl_is_conflict() {
        let f = fixture(Duration::from_secs(60));
        let _outbound = f.transport.subscribe_outbound();
        let user = UserId::from("u-1");

        f.lifecycle
            .create(user.clone(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        let err = f
            .lifecycle
            .create(user, "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_stale_pending_expires_and_frees_the_key() {
        let f = fixture(Duration::from_millis(20));
        let _outbound = f.transport.subscribe_outbound();
        let user = UserId::from("u-1");

        f.lifecycle
            .create(user.clone(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        // The stale Pending record no longer counts as anything live.
        let active = f
            .lifecycle
            .check_availability(&user, AvailabilityFilter::default())
            .await
            .unwrap();
        assert!(active.is_empty());

        // And the natural key is free for a fresh creation attempt.
        f.lifecycle
            .create(user, "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_confirmation_after_ttl_does_not_resurrect_the_record() {
        let f = fixture(Duration::from_millis(20));
        let _outbound = f.transport.subscribe_outbound();
        let user = UserId::from("u-1");

        let identifier = f
            .lifecycle
            .create(user.clone(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        // Expiry happens lazily on the availability read.
        let active = f
            .lifecycle
            .check_availability(&user, AvailabilityFilter::default())
            .await
            .unwrap();
        assert!(active.is_empty());

        // A late confirmation finds no Pending record and is dropped.
        f.lifecycle
            .confirm_creation(issued(&identifier, "ABC123"))
            .await
            .unwrap();
        let active = f
            .lifecycle
            .check_availability(&user, AvailabilityFilter::default())
            .await
            .unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_second_revoke_is_a_noop() {
        let f = fixture(Duration::from_secs(60));
        let _outbound = f.transport.subscribe_outbound();
        let user = UserId::from("u-1");

        let identifier = f
            .lifecycle
            .create(user.clone(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        f.lifecycle
            .confirm_creation(issued(&identifier, "ABC123"))
            .await
            .unwrap();

        let first = f.lifecycle.revoke(&user, None).await.unwrap();
        assert_eq!(first, RevocationOutcome::Revoked(1));

        let second = f.lifecycle.revoke(&user, None).await.unwrap();
        assert_eq!(second, RevocationOutcome::NoOp);
    }
}
