//! Strategy contract and the built-in flag-flipping strategies.

use crate::modifier::{FlagDomain, SubscriptionModifier};
use async_trait::async_trait;
use shared_types::{CoreError, CoreResult, SubscriptionRecord};
use std::fmt;

/// Codes a caller can subscribe to. The set is closed at compile time;
/// every code maps to exactly one strategy registered at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionCode {
    /// UBCH credit-history monitoring.
    CreditHistory,
    /// Document-type change notifications.
    Documents,
    /// Public-service notifications.
    PublicServices,
}

impl fmt::Display for SubscriptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreditHistory => write!(f, "credit-history"),
            Self::Documents => write!(f, "documents"),
            Self::PublicServices => write!(f, "public-services"),
        }
    }
}

/// Parameters passed through from the outer layer. Which fields are
/// required depends on the strategy; a missing required field is a
/// `Validation` error.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionParams {
    /// Personal identifier forwarded to external providers.
    pub personal_identifier: Option<String>,
    /// Segment id, required by providers that segment their audience.
    pub segment: Option<String>,
    /// Item code (document type or service code) the flag applies to.
    pub item_id: Option<String>,
}

pub(crate) fn require_param<'a>(field: &'a Option<String>, name: &str) -> CoreResult<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| CoreError::validation(format!("missing required parameter `{name}`")))
}

/// Provider-specific subscribe/unsubscribe logic.
///
/// A strategy never persists anything itself. It returns a modifier
/// describing the record change, or `None` when the call was a pure
/// side effect.
#[async_trait]
pub trait SubscriptionStrategy: Send + Sync {
    /// Compute the record change for a subscribe call.
    async fn subscribe(
        &self,
        record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>>;

    /// Compute the record change for an unsubscribe call. Strategies
    /// with no meaningful unsubscribe inherit this default.
    async fn unsubscribe(
        &self,
        _record: &SubscriptionRecord,
        _params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        Err(CoreError::validation(
            "unsubscribe is not supported for this subscription",
        ))
    }

    /// Register subscription intent without waiting for the provider's
    /// confirmation; the external id arrives later through the
    /// provider callback. Strategies without a deferred registration
    /// leg inherit this default.
    async fn publish_subscription(
        &self,
        _record: &SubscriptionRecord,
        _params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        Err(CoreError::validation(
            "deferred registration is not supported for this subscription",
        ))
    }
}

/// Flips per-document-type notification flags. No external provider.
#[derive(Debug, Default)]
pub struct DocumentsStrategy;

#[async_trait]
impl SubscriptionStrategy for DocumentsStrategy {
    async fn subscribe(
        &self,
        _record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        let item = require_param(&params.item_id, "itemId")?;
        Ok(Some(
            SubscriptionModifier::new().set_flag(FlagDomain::Documents, item, true),
        ))
    }

    async fn unsubscribe(
        &self,
        _record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        let item = require_param(&params.item_id, "itemId")?;
        Ok(Some(
            SubscriptionModifier::new().set_flag(FlagDomain::Documents, item, false),
        ))
    }
}

/// Flips public-service flags. Requires a segment id, which other
/// strategies do without.
#[derive(Debug, Default)]
pub struct PublicServicesStrategy;

#[async_trait]
impl SubscriptionStrategy for PublicServicesStrategy {
    async fn subscribe(
        &self,
        _record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        let item = require_param(&params.item_id, "itemId")?;
        let segment = require_param(&params.segment, "segment")?;
        Ok(Some(
            SubscriptionModifier::new()
                .set_flag(FlagDomain::PublicServices, item, true)
                .add_segment(segment),
        ))
    }

    async fn unsubscribe(
        &self,
        _record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        let item = require_param(&params.item_id, "itemId")?;
        Ok(Some(
            SubscriptionModifier::new().set_flag(FlagDomain::PublicServices, item, false),
        ))
    }
}
