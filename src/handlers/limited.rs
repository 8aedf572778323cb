use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::metrics::{ADMITTED_TOTAL, REJECTED_TOTAL, REQUEST_TOTAL, TRACKED_CLIENTS};
use crate::models::{AdmittedBody, ErrorBody};
use crate::rate_limit::Decision;
use crate::state::AppState;

// ctime-style timestamp, e.g. "Mon Oct 19 16:58:01 2026"
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

// Whole seconds a rejected client should wait, rounded up
pub fn wait_seconds(retry_after_ms: u64) -> u64 {
    retry_after_ms.div_ceil(1000)
}

pub async fn limited_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    REQUEST_TOTAL.inc();

    // bare host, every connection from one machine shares a window
    let client_key = addr.ip().to_string();
    let decision = state.limiter.check_and_record(&client_key);
    TRACKED_CLIENTS.set(state.limiter.tracked_clients() as f64);

    match decision {
        Decision::Admitted { current_count } => {
            ADMITTED_TOTAL.inc();

            let window_secs = state.limiter.config().window_ms() as f64 / 1000.0;
            let message = format!(
                "{}, {} have {} requests in last {} seconds",
                chrono::Local::now().format(TIMESTAMP_FORMAT),
                client_key,
                current_count,
                window_secs
            );
            tracing::info!(client = %client_key, count = current_count, "{message}");

            (StatusCode::OK, Json(AdmittedBody { message })).into_response()
        }
        Decision::Rejected { retry_after_ms } => {
            REJECTED_TOTAL.inc();

            let wait = wait_seconds(retry_after_ms);
            let message = format!("Rate limit exceeded, need wait {wait} seconds");
            tracing::error!(client = %client_key, retry_after_ms, "{message}");

            let mut res =
                (StatusCode::TOO_MANY_REQUESTS, Json(ErrorBody { error: message })).into_response();
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait));
            res
        }
    }
}
