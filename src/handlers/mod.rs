mod health;
mod limited;
mod metrics;

pub use health::health_handler;
pub use limited::limited_handler;
pub use metrics::metrics_handler;
