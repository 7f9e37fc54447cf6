mod runner;

use std::path::PathBuf;

use frame_relay_common::config::Config;
use runner::LoadTest;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let test = match LoadTest::new(&config.loadtest) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "failed to set up load test");
            std::process::exit(1);
        }
    };

    info!(
        url = test.url(),
        total = test.total(),
        concurrency = test.concurrency(),
        "running load test"
    );
    let report = test.run().await;

    println!("\nResults\n{report}");
    if !report.all_succeeded() {
        std::process::exit(1);
    }
}
