use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, register_counter, register_gauge};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("window_gateway_requests_total", "Total number of rate-limited endpoint requests").unwrap();
    pub static ref ADMITTED_TOTAL: Counter =
        register_counter!("window_gateway_admitted_total", "Requests admitted by the limiter").unwrap();
    pub static ref REJECTED_TOTAL: Counter =
        register_counter!("window_gateway_rejected_total", "Requests rejected with 429").unwrap();
    pub static ref PRUNED_CLIENTS: Counter =
        register_counter!("window_gateway_pruned_clients_total", "Idle clients dropped by the sweeper").unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("window_gateway_tracked_clients", "Client keys currently holding a window").unwrap();
}
