//! # Correlation Gateway
//!
//! The only component allowed to talk to external systems; everything
//! else in the core is transport-agnostic.
//!
//! ```text
//! ┌──────────────┐  send(event, payload)   ┌──────────────┐
//! │ Core crate   │ ──────────────────────▶ │   Gateway    │──▶ transport
//! │              │ ◀────────────────────── │              │◀── transport
//! └──────────────┘   correlated response   └──────────────┘
//!                                                 │
//!                            register_inbound_handler(event, h)
//! ```
//!
//! Inbound delivery is at-least-once; handlers must be idempotent on
//! natural keys, never on a delivery-specific id. A `sync` send suspends
//! only the issuing task; unmatched or late responses are dropped.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod gateway;
pub mod pending;
pub mod transport;

pub use gateway::{Gateway, InboundHandler};
pub use pending::{PendingStats, PendingStore};
pub use transport::{InMemoryTransport, MessageTransport, TransportMessage};

/// Maximum messages buffered per transport subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default timeout for sync sends when the caller does not override it.
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 30;
