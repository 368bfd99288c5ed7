use anyhow::Result;
use clap::Parser;

use deep_research::cli::{self, Args};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("deep_research=info")),
        )
        .init();

    cli::run(Args::parse()).await
}
