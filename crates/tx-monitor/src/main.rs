//! Transaction Monitor worker.

use anyhow::Result;
use clap::Parser;
use stablewatch_core::api::ExplorerRouter;
use stablewatch_core::config::Config;
use stablewatch_core::db::{self, PgStore};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tx_monitor::TransactionMonitor;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Debug, Parser)]
#[command(name = "tx-monitor", about = "Watch wallets for USDT transfers")]
struct Args {
    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,

    /// Skip running database migrations on startup.
    #[arg(long)]
    skip_migrations: bool,
}

fn touch_health_file(path: &str) {
    let _ = std::fs::write(path, format!("{}", chrono::Utc::now().timestamp()));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tx_monitor=info,stablewatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Transaction Monitor");

    // Load configuration
    let config = Config::from_env()?;
    touch_health_file(&config.health_file);

    let pool = db::create_pool(&config.database).await?;
    if !args.skip_migrations {
        db::run_migrations(&pool).await?;
    }

    let http_client = config.http.build_client()?;
    let router = ExplorerRouter::from_config(&config.explorers, http_client);

    let monitor = TransactionMonitor::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(router),
        config.monitor.clone(),
    );

    info!(
        poll_interval_ms = config.monitor.poll_interval_ms,
        wallet_delay_ms = config.monitor.wallet_delay_ms,
        "Monitor configured"
    );

    loop {
        match monitor.run_cycle().await {
            Ok(stats) => {
                info!(
                    wallets = stats.wallets,
                    failed = stats.failed_wallets,
                    new_transfers = stats.new_transfers,
                    events = stats.events_created,
                    "Monitor cycle complete"
                );
            }
            Err(e) => {
                error!(error = %e, "Monitor cycle failed");
            }
        }
        touch_health_file(&config.health_file);

        if args.once {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(monitor.poll_interval()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Transaction Monitor stopped");
    Ok(())
}
