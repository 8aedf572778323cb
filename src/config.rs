use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;
use crate::rate_limit::LimiterConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "window-gateway")]
#[command(about = "Per-client sliding-window rate limiter in front of a tiny HTTP endpoint")]
pub struct Args {
    // Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    // Port to run the server on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    // Sliding window length in milliseconds
    #[arg(short, long, default_value_t = LimiterConfig::DEFAULT_WINDOW_MS)]
    pub window_ms: u64,

    // Max admitted requests per client per window
    #[arg(short, long, default_value_t = LimiterConfig::DEFAULT_MAX_REQUESTS)]
    pub max_requests: usize,

    // How long an idle client is remembered after its window empties
    #[arg(long, default_value_t = LimiterConfig::DEFAULT_IDLE_RETENTION_MS)]
    pub idle_retention_ms: u64,

    // Seconds between idle-client sweeps, 0 disables the sweeper
    #[arg(long, default_value_t = 30)]
    pub prune_interval: u64,
}

impl Args {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn limiter_config(&self) -> Result<LimiterConfig, ConfigError> {
        Ok(LimiterConfig::new(self.window_ms, self.max_requests)?
            .with_idle_retention(self.idle_retention_ms))
    }

    pub fn prune_interval(&self) -> Option<Duration> {
        (self.prune_interval > 0).then(|| Duration::from_secs(self.prune_interval))
    }
}
