//! # Subscription Integration
//!
//! Convergence of the UBCH synchronous subscribe leg and its
//! asynchronous confirmation callback, in both delivery orders.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use correlation_gateway::InboundHandler;
    use serde_json::json;
    use shared_types::envelope::InboundEnvelope;
    use shared_types::UserId;
    use subscriptions::{
        InMemorySubscriptionStore, MockUbchProvider, StrategyRegistry, SubscriptionCode,
        SubscriptionParams, SubscriptionService, UbchCallbackHandler, UbchStrategy, PROVIDER_UBCH,
    };

    const PERSONAL_ID: &str = "3344556677";

    struct Fixture {
        store: Arc<InMemorySubscriptionStore>,
        service: SubscriptionService,
        callback: UbchCallbackHandler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let registry = StrategyRegistry::new().with(
            SubscriptionCode::CreditHistory,
            Arc::new(UbchStrategy::new(Arc::new(MockUbchProvider))),
        );
        Fixture {
            store: store.clone(),
            service: SubscriptionService::new(registry, store.clone()),
            callback: UbchCallbackHandler::new(store),
        }
    }

    fn params() -> SubscriptionParams {
        SubscriptionParams {
            personal_identifier: Some(PERSONAL_ID.to_owned()),
            ..SubscriptionParams::default()
        }
    }

    fn callback_envelope() -> InboundEnvelope {
        let body = serde_json::to_vec(&json!({
            "status": 200,
            "personalIdentifier": PERSONAL_ID,
            "refagr": format!("mock-{PERSONAL_ID}")
        }))
        .unwrap();
        InboundEnvelope {
            uuid: uuid::Uuid::new_v4(),
            outcome: Ok(serde_json::Value::String(STANDARD.encode(body))),
        }
    }

    async fn assert_one_stored_id(store: &InMemorySubscriptionStore) {
        use subscriptions::SubscriptionStore;
        let record = store
            .get(&UserId::from(PERSONAL_ID))
            .await
            .unwrap()
            .expect("record");
        assert_eq!(record.provider_ids.len(), 1);
        assert_eq!(
            record.provider_ids.get(PROVIDER_UBCH),
            Some(&format!("mock-{PERSONAL_ID}"))
        );
    }

    #[tokio::test]
    async fn test_sync_leg_then_callback_converges_to_one_id() {
        let f = fixture();
        f.service
            .subscribe(
                &PERSONAL_ID.into(),
                SubscriptionCode::CreditHistory,
                &params(),
            )
            .await
            .unwrap();
        f.callback.handle(callback_envelope()).await.unwrap();
        assert_one_stored_id(&f.store).await;
    }

    #[tokio::test]
    async fn test_callback_then_sync_leg_converges_to_one_id() {
        let f = fixture();
        f.callback.handle(callback_envelope()).await.unwrap();
        f.service
            .subscribe(
                &PERSONAL_ID.into(),
                SubscriptionCode::CreditHistory,
                &params(),
            )
            .await
            .unwrap();
        assert_one_stored_id(&f.store).await;
    }

    #[tokio::test]
    async fn test_unsubscribe_clears_the_stored_id() {
        let f = fixture();
        f.service
            .subscribe(
                &PERSONAL_ID.into(),
                SubscriptionCode::CreditHistory,
                &params(),
            )
            .await
            .unwrap();
        let record = f
            .service
            .unsubscribe(
                &PERSONAL_ID.into(),
                SubscriptionCode::CreditHistory,
                &params(),
            )
            .await
            .unwrap();
        assert!(record.provider_ids.is_empty());
    }
}
