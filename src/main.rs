use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rc_drive_runtime::config::{DEFAULT_STORE_DIR, DEFAULT_TOPIC_PREFIX, RAMP_INTERVAL};
use rc_drive_runtime::runtime::RunOptions;

/// Dual-motor actuation runtime for the RC vehicle
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding the persisted motor config
    #[arg(long, default_value = DEFAULT_STORE_DIR)]
    store_dir: PathBuf,

    /// Control tick period in milliseconds
    #[arg(long, default_value_t = RAMP_INTERVAL.as_millis() as u64)]
    loop_ms: u64,

    /// Prefix for every zenoh key expression
    #[arg(long, default_value = DEFAULT_TOPIC_PREFIX)]
    topic_prefix: String,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();
    let options = RunOptions {
        store_dir: args.store_dir,
        loop_period: Duration::from_millis(args.loop_ms.max(1)),
        topic_prefix: args.topic_prefix,
    };

    if let Err(e) = rc_drive_runtime::runtime::run(options).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
