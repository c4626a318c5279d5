//! # Shared Types Crate
//!
//! This crate contains the domain entities, the correlation envelope, and
//! the error taxonomy shared across the signing-core crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Natural Keys**: Identifier uniqueness and journal idempotency are
//!   enforced on domain-meaningful keys, never on delivery-specific ids.
//! - **Envelope Integrity**: The correlation envelope is the sole wrapper
//!   for traffic to and from external providers.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::*;
pub use envelope::{InboundEnvelope, OutboundEnvelope, RemoteError};
pub use errors::{CoreError, CoreResult};
