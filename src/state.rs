use std::sync::Arc;
use crate::rate_limit::SlidingWindowLimiter;

// app's shared state
#[derive(Clone, Debug)]
pub struct AppState {
    pub limiter: Arc<SlidingWindowLimiter>, // the only rate-limit state in the process
}

impl AppState {
    pub fn new(limiter: SlidingWindowLimiter) -> Self {
        Self {
            limiter: Arc::new(limiter),
        }
    }
}
