//! Subscription record storage port.

use crate::modifier::SubscriptionModifier;
use async_trait::async_trait;
use dashmap::DashMap;
use shared_types::{CoreResult, SubscriptionRecord, UserId};

/// Durable storage for subscription records.
///
/// `apply` is the single write path: it upserts the user's record and
/// applies the modifier in one conditional single-record update.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch the user's record, if one exists.
    async fn get(&self, user: &UserId) -> CoreResult<Option<SubscriptionRecord>>;

    /// Apply a modifier to the user's record, creating it when absent.
    /// Returns the record as stored after the change.
    async fn apply(
        &self,
        user: &UserId,
        modifier: &SubscriptionModifier,
    ) -> CoreResult<SubscriptionRecord>;
}

/// Keyed in-memory adapter.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    records: DashMap<UserId, SubscriptionRecord>,
}

impl InMemorySubscriptionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, user: &UserId) -> CoreResult<Option<SubscriptionRecord>> {
        Ok(self.records.get(user).map(|r| r.clone()))
    }

    async fn apply(
        &self,
        user: &UserId,
        modifier: &SubscriptionModifier,
    ) -> CoreResult<SubscriptionRecord> {
        let mut entry = self
            .records
            .entry(user.clone())
            .or_insert_with(|| SubscriptionRecord::empty(user.clone()));
        modifier.apply_to(entry.value_mut());
        Ok(entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_creates_record_when_absent() {
        let store = InMemorySubscriptionStore::new();
        let user = UserId::from("u-1");
        assert!(store.get(&user).await.unwrap().is_none());

        let modifier = SubscriptionModifier::new().set_provider_id("ubch", "ext-1");
        let stored = store.apply(&user, &modifier).await.unwrap();
        assert_eq!(stored.provider_ids.get("ubch"), Some(&"ext-1".to_owned()));
        assert!(store.get(&user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reapply_stores_exactly_one_id() {
        let store = InMemorySubscriptionStore::new();
        let user = UserId::from("u-1");
        let modifier = SubscriptionModifier::new().set_provider_id("ubch", "ext-1");

        store.apply(&user, &modifier).await.unwrap();
        let stored = store.apply(&user, &modifier).await.unwrap();
        assert_eq!(stored.provider_ids.len(), 1);
        assert_eq!(stored.provider_ids.get("ubch"), Some(&"ext-1".to_owned()));
    }
}
