//! OrderDesk Simulator
//!
//! Seeds a running server with users and orders, then reads the orders back
//! to exercise the conversion path and its caches.

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod controller;
mod factory;
mod metrics;

use client::ApiClient;
use controller::{RunPlan, SimulationController};

/// OrderDesk Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Seed and exercise an OrderDesk server")]
struct Args {
    /// Server base URL
    #[arg(long, env = "ORDERDESK_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Number of users to register
    #[arg(short, long, default_value = "3")]
    users: usize,

    /// Orders created per user
    #[arg(short, long, default_value = "10")]
    orders: usize,

    /// Order reads per user
    #[arg(short, long, default_value = "20")]
    shows: usize,

    /// Milliseconds to wait between requests
    #[arg(long, default_value = "0")]
    pace_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Delete the seeded users when done
    #[arg(long)]
    cleanup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting OrderDesk Simulator against {}", args.base_url);
    info!(
        "Users: {}, orders/user: {}, shows/user: {}",
        args.users, args.orders, args.shows
    );

    let client = ApiClient::new(&args.base_url, Duration::from_secs(args.timeout))?;
    let plan = RunPlan {
        users: args.users,
        orders_per_user: args.orders,
        shows_per_user: args.shows,
        pace: Duration::from_millis(args.pace_ms),
        cleanup: args.cleanup,
    };

    let mut controller = SimulationController::new(client, plan, args.seed);
    controller.run().await?;

    let metrics = controller.metrics();
    info!("Simulation complete");
    info!(
        "Users created: {} (failed: {})",
        metrics.users_created, metrics.user_failures
    );
    info!(
        "Orders created: {} (failed: {}), avg {}ms, p99 {}ms",
        metrics.creates.succeeded,
        metrics.creates.failed,
        metrics.creates.average_latency_ms(),
        metrics.creates.p99_latency_ms()
    );
    info!(
        "Orders shown: {} (failed: {}), p50 {}ms, p99 {}ms",
        metrics.shows.succeeded,
        metrics.shows.failed,
        metrics.shows.p50_latency_ms(),
        metrics.shows.p99_latency_ms()
    );
    info!(
        "Conversions: {:.1}% converted, {} degraded",
        metrics.conversion_rate() * 100.0,
        metrics.degraded_conversions
    );

    Ok(())
}
