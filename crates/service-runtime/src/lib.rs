//! # Service Runtime
//!
//! Wiring and entry point for the signing core. The library surface is
//! the [`Container`] and its operations facade; `main` only loads
//! configuration, installs telemetry, and waits for shutdown.

pub mod config;
pub mod container;
pub mod ops;

pub use config::{ConfigError, ServiceConfig};
pub use container::Container;
