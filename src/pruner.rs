use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::metrics::{PRUNED_CLIENTS, TRACKED_CLIENTS};
use crate::rate_limit::SlidingWindowLimiter;

// Idle-client sweeper - drops clients that have not been seen for a while

pub async fn idle_pruner(limiter: Arc<SlidingWindowLimiter>, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval = ?every, "idle client pruner started");

    loop {
        interval.tick().await;

        let removed = limiter.prune_idle();
        TRACKED_CLIENTS.set(limiter.tracked_clients() as f64);

        if removed > 0 {
            PRUNED_CLIENTS.inc_by(removed as f64);
            tracing::debug!(removed, remaining = limiter.tracked_clients(), "pruned idle clients");
        }
    }
}
