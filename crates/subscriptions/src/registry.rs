//! Strategy registry and the subscribe/unsubscribe orchestration.

use crate::store::SubscriptionStore;
use crate::strategy::{SubscriptionCode, SubscriptionParams, SubscriptionStrategy};
use shared_types::{CoreError, CoreResult, SubscriptionRecord, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Closed map from subscription code to strategy, built once at
/// startup. Lookups of unregistered codes are `NotFound`.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<SubscriptionCode, Arc<dyn SubscriptionStrategy>>,
}

impl StrategyRegistry {
    /// Start an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under a code, replacing any previous one.
    #[must_use]
    pub fn with(mut self, code: SubscriptionCode, strategy: Arc<dyn SubscriptionStrategy>) -> Self {
        self.strategies.insert(code, strategy);
        self
    }

    /// Look up the strategy for a code.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` when no strategy is registered.
    pub fn get(&self, code: SubscriptionCode) -> CoreResult<Arc<dyn SubscriptionStrategy>> {
        self.strategies
            .get(&code)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("no strategy registered for {code}")))
    }
}

/// Strategy-dispatched subscription operations over the store.
pub struct SubscriptionService {
    registry: StrategyRegistry,
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    /// Wire the service.
    #[must_use]
    pub fn new(registry: StrategyRegistry, store: Arc<dyn SubscriptionStore>) -> Self {
        Self { registry, store }
    }

    /// Subscribe the user to a code. Returns the stored record after
    /// the strategy's modifier, if any, has been applied.
    pub async fn subscribe(
        &self,
        user: &UserId,
        code: SubscriptionCode,
        params: &SubscriptionParams,
    ) -> CoreResult<SubscriptionRecord> {
        let strategy = self.registry.get(code)?;
        let record = self.load_or_empty(user).await?;
        match strategy.subscribe(&record, params).await? {
            Some(modifier) => self.store.apply(user, &modifier).await,
            None => {
                debug!(user = %user, %code, "Subscribe produced no record change");
                Ok(record)
            }
        }
    }

    /// Register the user's subscription intent for a code without
    /// waiting for the provider's confirmation.
    pub async fn publish_subscription(
        &self,
        user: &UserId,
        code: SubscriptionCode,
        params: &SubscriptionParams,
    ) -> CoreResult<SubscriptionRecord> {
        let strategy = self.registry.get(code)?;
        let record = self.load_or_empty(user).await?;
        match strategy.publish_subscription(&record, params).await? {
            Some(modifier) => self.store.apply(user, &modifier).await,
            None => Ok(record),
        }
    }

    /// Unsubscribe the user from a code.
    pub async fn unsubscribe(
        &self,
        user: &UserId,
        code: SubscriptionCode,
        params: &SubscriptionParams,
    ) -> CoreResult<SubscriptionRecord> {
        let strategy = self.registry.get(code)?;
        let record = self.load_or_empty(user).await?;
        match strategy.unsubscribe(&record, params).await? {
            Some(modifier) => self.store.apply(user, &modifier).await,
            None => Ok(record),
        }
    }

    async fn load_or_empty(&self, user: &UserId) -> CoreResult<SubscriptionRecord> {
        Ok(self
            .store
            .get(user)
            .await?
            .unwrap_or_else(|| SubscriptionRecord::empty(user.clone())))
    }
}
