//! Lifecycle configuration.

use std::time::Duration;

/// Tunables for the identifier lifecycle.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How long a Pending record counts as live before it is lazily
    /// reclassified as Expired on the next read. No background sweep.
    pub pending_ttl: Duration,
    /// Timeout for the sync hashed-file signing call.
    pub sign_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::from_secs(30 * 60),
            sign_timeout: Duration::from_secs(30),
        }
    }
}
