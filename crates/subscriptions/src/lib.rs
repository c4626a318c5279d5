//! # Subscriptions
//!
//! Pluggable per-provider subscribe/unsubscribe logic. A strategy
//! inspects the user's durable [`SubscriptionRecord`] and returns a
//! declarative [`SubscriptionModifier`]; the store applies modifiers
//! atomically, so provider logic never writes record fields directly.
//!
//! The UBCH credit-bureau adapter is a second, independent instance of
//! the gateway correlation pattern: a synchronous subscribe leg and an
//! asynchronous confirmation callback both funnel through one
//! envelope codec and one compute-modifier-then-persist path, so the
//! legs converge no matter which completes last.
//!
//! [`SubscriptionRecord`]: shared_types::SubscriptionRecord

pub mod modifier;
pub mod registry;
pub mod store;
pub mod strategy;
pub mod ubch;

pub use modifier::{FlagDomain, SubscriptionModifier};
pub use registry::{StrategyRegistry, SubscriptionService};
pub use store::{InMemorySubscriptionStore, SubscriptionStore};
pub use strategy::{
    DocumentsStrategy, PublicServicesStrategy, SubscriptionCode, SubscriptionParams,
    SubscriptionStrategy,
};
pub use ubch::{
    GatewayUbchProvider, MockUbchProvider, UbchCallbackHandler, UbchProvider, UbchStrategy,
};

/// Outbound event carrying UBCH provider envelopes.
pub const EVENT_UBCH_REQUEST: &str = "ubch.subscription";
/// Inbound event carrying asynchronous UBCH confirmations.
pub const EVENT_UBCH_CALLBACK: &str = "ubch.subscription.callback";

/// Provider code the UBCH external subscription id is stored under.
pub const PROVIDER_UBCH: &str = "ubch";
