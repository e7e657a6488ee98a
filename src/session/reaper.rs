//! Background expiry of sessions.

use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time;

use crate::session::SessionStore;

/// Periodically removes sessions older than the store's TTL.
pub struct SessionReaper {
    store: SessionStore,
    interval: Duration,
}

impl SessionReaper {
    pub fn new(store: SessionStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            ttl_secs = self.store.ttl().as_secs(),
            "Session reaper starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.store.reap_expired(Instant::now());
                    if removed > 0 {
                        tracing::debug!(
                            removed,
                            remaining = self.store.len(),
                            "Expired sessions reaped"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session reaper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
