//! # Pending Correlation Store
//!
//! Maps outstanding correlation ids to suspended sync callers.
//!
//! Flow:
//! 1. `send` generates a correlation id and calls `register()` for a
//!    oneshot receiver.
//! 2. The request is published tagged with the id.
//! 3. The dispatch loop receives the correlated response and calls
//!    `complete()`.
//! 4. The caller awaits the receiver or times out and abandons the entry.

use dashmap::DashMap;
use serde_json::Value;
use shared_types::envelope::RemoteError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome delivered to a suspended sync caller.
pub type PendingOutcome = Result<Value, RemoteError>;

struct PendingRequest {
    sender: oneshot::Sender<PendingOutcome>,
    created_at: Instant,
    event: String,
    timeout: Duration,
}

/// Counters for pending-correlation activity.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Requests registered.
    pub registered: AtomicU64,
    /// Requests completed by a correlated response.
    pub completed: AtomicU64,
    /// Requests reclaimed after their timeout.
    pub timeouts: AtomicU64,
    /// Requests cancelled by the caller.
    pub cancelled: AtomicU64,
}

/// Store of outstanding sync correlations.
///
/// Entries exist only between send and matching inbound response (or
/// timeout); nothing here is ever persisted.
pub struct PendingStore {
    pending: DashMap<Uuid, PendingRequest>,
    default_timeout: Duration,
    stats: Arc<PendingStats>,
}

impl PendingStore {
    /// Create a store with the given default per-call timeout.
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            default_timeout,
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register an outstanding request under a fresh correlation id.
    pub fn register(
        &self,
        event: &str,
        timeout: Option<Duration>,
    ) -> (Uuid, oneshot::Receiver<PendingOutcome>) {
        let correlation_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        self.pending.insert(
            correlation_id,
            PendingRequest {
                sender: tx,
                created_at: Instant::now(),
                event: event.to_owned(),
                timeout: timeout.unwrap_or(self.default_timeout),
            },
        );
        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            event,
            "Registered pending correlation"
        );

        (correlation_id, rx)
    }

    /// Complete an outstanding request with a correlated outcome.
    ///
    /// Returns `false` when the id is unknown (already timed out,
    /// cancelled, or a duplicate delivery); the response is dropped,
    /// never replayed to a now-finished caller.
    pub fn complete(&self, correlation_id: Uuid, outcome: PendingOutcome) -> bool {
        let Some((_, pending)) = self.pending.remove(&correlation_id) else {
            return false;
        };

        let waited = pending.created_at.elapsed();
        match pending.sender.send(outcome) {
            Ok(()) => {
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    event = pending.event,
                    waited_ms = waited.as_millis() as u64,
                    "Completed pending correlation"
                );
                true
            }
            Err(_) => {
                // Caller already gave up on this correlation.
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    event = pending.event,
                    "Pending correlation receiver dropped"
                );
                false
            }
        }
    }

    /// Abandon an outstanding request (timed-out caller).
    pub fn cancel(&self, correlation_id: &Uuid) -> bool {
        if self.pending.remove(correlation_id).is_some() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Reclaim entries older than their timeout.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.pending.retain(|id, request| {
            let elapsed = now.duration_since(request.created_at);
            if elapsed > request.timeout {
                warn!(
                    correlation_id = %id,
                    event = request.event,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Reclaiming expired pending correlation"
                );
                self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                removed += 1;
                false
            } else {
                true
            }
        });

        removed
    }

    /// Number of outstanding correlations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

/// Background task reclaiming expired pending correlations.
pub async fn cleanup_task(store: Arc<PendingStore>, interval: Duration) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        let removed = store.remove_expired();
        if removed > 0 {
            debug!(removed, "Reclaimed expired pending correlations");
        }
    }
}
