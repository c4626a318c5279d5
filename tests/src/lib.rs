//! # Signing Core Test Suite
//!
//! Unified test crate for cross-crate behavior:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── journal.rs        # History append order under redelivery
//!     ├── lifecycle.rs      # Conflict, TTL, and revocation flows
//!     ├── subscriptions.rs  # UBCH leg-ordering convergence
//!     └── scenario.rs       # End-to-end identifier lifecycle
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p identity-tests
//! cargo test -p identity-tests integration::lifecycle
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
