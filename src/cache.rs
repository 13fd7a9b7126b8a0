//! Time-to-live cache for computed dashboard views.
//!
//! One [`ViewCache`] holds exactly one payload slot. It does not key on the
//! producer's parameters: calling the same instance with different query
//! parameters inside the TTL window returns whatever the previous call
//! computed. Callers that need per-query freshness own one cache instance
//! per logical view, which is how [`crate::service::Dashboard`] wires them.

use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

struct Slot<T> {
    payload: Option<T>,
    computed_at: DateTime<Utc>,
}

/// Single-slot TTL cache around a producer.
///
/// Concurrent callers that both observe an expired slot will both run the
/// producer; the last writer wins and the loser's work is discarded. The
/// payload and its timestamp are always replaced together under the lock,
/// so readers never see a fresh timestamp paired with an old payload.
pub struct ViewCache<T> {
    ttl: Duration,
    slot: Mutex<Slot<T>>,
}

impl<T: Clone> ViewCache<T> {
    /// Creates an empty cache. `computed_at` starts far enough in the past
    /// that the first [`get`](Self::get) always computes.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(Slot {
                payload: None,
                computed_at: Utc::now() - Duration::days(1000),
            }),
        }
    }

    /// Returns the cached payload, recomputing via `produce` when forced,
    /// when the TTL is zero, or when the slot has expired.
    ///
    /// A failed refresh never replaces the slot: if a previously computed
    /// payload exists it is served stale with a warning, otherwise the
    /// error propagates. Serving stale beats serving nothing during a
    /// transient store outage.
    pub async fn get<F, Fut>(&self, force_refresh: bool, produce: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let slot = self.slot.lock().expect("cache lock poisoned");
            let fresh = !self.ttl.is_zero() && Utc::now() - slot.computed_at <= self.ttl;
            if !force_refresh && fresh {
                if let Some(payload) = &slot.payload {
                    debug!("Serving cached view");
                    return Ok(payload.clone());
                }
            }
        }

        // The producer runs outside the lock; overlapping refreshes race
        // and the last writer wins.
        match produce().await {
            Ok(payload) => {
                let mut slot = self.slot.lock().expect("cache lock poisoned");
                slot.payload = Some(payload.clone());
                slot.computed_at = Utc::now();
                Ok(payload)
            }
            Err(err) => {
                let slot = self.slot.lock().expect("cache lock poisoned");
                match &slot.payload {
                    Some(stale) => {
                        warn!(error = %err, "View refresh failed, serving stale payload");
                        Ok(stale.clone())
                    }
                    None => Err(err),
                }
            }
        }
    }
}
