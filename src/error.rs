//! Error types for the gateway.
//!
//! Rate-limit rejections are not errors: they are a normal [`Decision`](crate::rate_limit::Decision)
//! and are rendered by the gateway handler directly.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use thiserror::Error;

use crate::models::ErrorBody;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Rejected limiter configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window duration must be greater than zero")]
    ZeroWindow,

    #[error("max requests per window must be greater than zero")]
    ZeroQuota,
}

/// Infrastructure failures around the limiter.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server stopped unexpectedly: {0}")]
    Serve(#[source] std::io::Error),

    #[error("cannot encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("metrics are not valid UTF-8")]
    MetricsEncoding(#[from] std::string::FromUtf8Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(err = %self, "server returned 500 status");

        let body = ErrorBody {
            error: "Internal server error".to_owned(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_server_error() {
        let err: ServerError = ConfigError::ZeroQuota.into();
        assert_eq!(
            err.to_string(),
            "invalid configuration: max requests per window must be greater than zero"
        );
    }

    #[test]
    fn server_error_renders_as_500() {
        let err = ServerError::Serve(std::io::Error::other("boom"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
