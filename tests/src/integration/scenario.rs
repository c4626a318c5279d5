//! # End-to-End Scenario
//!
//! Full identifier lifecycle through the wired service container:
//! create, external confirmation, availability, revocation, and the
//! no-op second revocation.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use correlation_gateway::TransportMessage;
    use identifier_lifecycle::{
        AvailabilityFilter, RevocationOutcome, EVENT_CERTIFICATE_CREATED,
    };
    use serde_json::json;
    use service_runtime::config::SecuritySettings;
    use service_runtime::{Container, ServiceConfig};
    use shared_types::envelope::InboundEnvelope;
    use shared_types::{SignAlgorithm, UserId};

    fn container() -> Container {
        Container::new(ServiceConfig {
            security: SecuritySettings {
                session_key: vec![7u8; 32],
            },
            ..ServiceConfig::default()
        })
    }

    async fn wait_for_activation(container: &Container, user: &UserId) {
        tokio::time::timeout(Duration::from_millis(500), async {
            loop {
                let active = container
                    .check_availability(user, AvailabilityFilter::default())
                    .await
                    .unwrap();
                if !active.is_empty() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("identifier never became Active");
    }

    #[tokio::test]
    async fn test_full_dstu_lifecycle() {
        let container = container();
        let _outbound = container.transport.subscribe_outbound();
        let user = UserId::from("u-1");

        // Create: a Pending record occupies the key, so a second
        // create conflicts and the Active set is still empty.
        let identifier = container
            .create_identifier(user.clone(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .unwrap();
        assert!(container
            .create_identifier(user.clone(), "d-1".into(), SignAlgorithm::Dstu, json!({}))
            .await
            .is_err());
        assert!(container
            .check_availability(&user, AvailabilityFilter::default())
            .await
            .unwrap()
            .is_empty());

        // The external authority confirms issuance with serial ABC123.
        container.transport.inject_inbound(TransportMessage::new(
            EVENT_CERTIFICATE_CREATED,
            InboundEnvelope::encode_response(
                uuid::Uuid::new_v4(),
                json!({
                    "identifier": identifier,
                    "serialNumber": "ABC123",
                    "registryId": "reg-1",
                    "issuedAt": "2026-01-01T00:00:00Z",
                    "expiresAt": "2028-01-01T00:00:00Z"
                }),
            ),
        ));
        wait_for_activation(&container, &user).await;

        let active = container
            .check_availability(&user, AvailabilityFilter::default())
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        let certificate = active[0].certificate.as_ref().expect("certificate");
        assert_eq!(certificate.serial_number, "ABC123");

        // Revoke once: state changes. Revoke again: no-op.
        let first = container.revoke_identifier(&user, None).await.unwrap();
        assert_eq!(first, RevocationOutcome::Revoked(1));
        assert!(container
            .check_availability(&user, AvailabilityFilter::default())
            .await
            .unwrap()
            .is_empty());

        let second = container.revoke_identifier(&user, None).await.unwrap();
        assert_eq!(second, RevocationOutcome::NoOp);

        container.shutdown();
    }
}
