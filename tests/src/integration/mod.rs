//! Cross-crate integration tests.

pub mod journal;
pub mod lifecycle;
pub mod scenario;
pub mod subscriptions;
