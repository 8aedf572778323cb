use clap::Parser; // for cli
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use window_gateway::config::Args;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // parse cli arguments
    let args = Args::parse();

    match window_gateway::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "gateway stopped");
            ExitCode::FAILURE
        }
    }
}
