//! Notification Dispatcher worker.

use anyhow::Result;
use clap::Parser;
use notify_dispatcher::{NotificationDispatcher, SenderSet};
use stablewatch_core::config::Config;
use stablewatch_core::db::{self, PgStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Debug, Parser)]
#[command(name = "notify-dispatcher", about = "Deliver wallet alerts to user channels")]
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
                .unwrap_or_else(|_| "notify_dispatcher=info,stablewatch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Notification Dispatcher");

    // Load configuration
    let config = Config::from_env()?;
    touch_health_file(&config.health_file);

    if config.alerts.telegram_bot_token.is_none() {
        warn!("TELEGRAM_BOT_TOKEN not set; Telegram deliveries will fail");
    }
    if config.alerts.resend_api_key.is_none() {
        warn!("RESEND_API_KEY not set; email deliveries will fail");
    }

    let pool = db::create_pool(&config.database).await?;
    if !args.skip_migrations {
        db::run_migrations(&pool).await?;
    }

    let http_client = config.http.build_client()?;
    let dispatcher = NotificationDispatcher::new(
        Arc::new(PgStore::new(pool)),
        SenderSet::from_config(&config.alerts, http_client),
        config.dispatcher.clone(),
    );

    loop {
        match dispatcher.run_cycle().await {
            Ok(stats) if stats.events > 0 => {
                info!(
                    events = stats.events,
                    failed_events = stats.failed_events,
                    sent = stats.sent,
                    failed = stats.failed,
                    "Dispatch cycle complete"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Dispatch cycle failed");
            }
        }
        touch_health_file(&config.health_file);

        if args.once {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(dispatcher.poll_interval()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Notification Dispatcher stopped");
    Ok(())
}
