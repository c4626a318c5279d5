//! # Signing History Journal
//!
//! Durable, queryable audit trail of signing/sharing engagements,
//! independent of their ultimate success or failure.
//!
//! The idempotency boundary is the resource id: a write with an
//! already-seen resource id appends to the existing entry rather than
//! duplicating it. Status history is append-only in arrival order; no
//! timestamp-based reconciliation is attempted, so a reordered
//! "Processing" delivered after "Done" is reported as current.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod journal;
pub mod session;
pub mod store;

pub use journal::{SigningHistoryJournal, UpsertRequest};
pub use session::derive_session_id;
pub use store::{EntrySeed, HistoryStore, InMemoryHistoryStore};
