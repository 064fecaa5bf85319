use clap::Parser;
use panos_provision::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Silent unless RUST_LOG asks for output; a clean run prints nothing.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    cli::run(Cli::parse()).await;
}
