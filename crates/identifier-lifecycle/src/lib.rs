//! # Identifier Lifecycle
//!
//! Owns the DiiaID identifier state machine:
//!
//! ```text
//!            create                confirm_creation
//!   (none) ─────────▶ Pending ─────────────────────▶ Active
//!                        │                              │
//!                        │ TTL (lazy, on read)          │ revoke
//!                        ▼                              ▼
//!                     Expired                        Revoked
//! ```
//!
//! Expired and Revoked are terminal for a natural key; a new `create`
//! produces a fresh Pending record. Every transition is a single-record
//! conditional update keyed by the natural key, the identifier value, or
//! the revocation event uuid; that is the whole correctness story under
//! concurrent calls and duplicate inbound delivery.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod handlers;
pub mod manager;
pub mod payloads;
pub mod signing;
pub mod store;

pub use config::LifecycleConfig;
pub use handlers::{CertificateIssuedHandler, RevocationResolvedHandler};
pub use manager::{AvailabilityFilter, IdentifierLifecycle, RevocationOutcome};
pub use signing::{HashesSigningRequest, SigningOrchestrator};
pub use store::{IdentifierStore, InMemoryIdentifierStore};

/// Outbound event: request certificate issuance.
pub const EVENT_CERTIFICATE_CREATE: &str = "certificate.create";
/// Inbound event: issuance confirmed by the authority.
pub const EVENT_CERTIFICATE_CREATED: &str = "certificate.created";
/// Outbound event: request certificate revocation.
pub const EVENT_CERTIFICATE_REVOKE: &str = "certificate.revoke";
/// Inbound event: revocation outcome from the authority.
pub const EVENT_CERTIFICATE_REVOKED: &str = "certificate.revoked";
/// Outbound event: hashed-file signing request.
pub const EVENT_SIGN_HASHES: &str = "certificate.sign-hashes";
