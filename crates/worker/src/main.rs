//! Periodic scheduler: publish-batch and tracking-reconciliation loops.
//!
//! Both loops run on fixed intervals until shutdown. The pause flag is
//! enforced inside the services; a paused system logs and skips the
//! cycle without side effects.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flipline_db::DbPool;
use flipline_ebay::rest::EbayApi;
use flipline_pipeline::config::DbConfigProvider;
use flipline_pipeline::{publisher, tracking};

/// Actor recorded on transitions driven by the scheduler.
const ACTOR: &str = "worker";

const DEFAULT_PUBLISH_INTERVAL_SECS: u64 = 300;
const DEFAULT_TRACKING_INTERVAL_SECS: u64 = 600;

fn env_interval(name: &str, default_secs: u64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flipline_worker=debug,flipline_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = flipline_db::create_pool(&database_url).await?;
    flipline_db::run_migrations(&pool).await?;

    let api_url =
        std::env::var("EBAY_API_URL").unwrap_or_else(|_| "https://api.ebay.com".to_string());
    let token = std::env::var("EBAY_TOKEN").unwrap_or_default();
    let ebay = Arc::new(EbayApi::new(api_url, token)?);

    let config = Arc::new(DbConfigProvider::new(pool.clone()));
    let cancel = CancellationToken::new();

    let publish_handle = tokio::spawn(publish_loop(
        pool.clone(),
        Arc::clone(&config),
        Arc::clone(&ebay),
        env_interval("PUBLISH_INTERVAL_SECS", DEFAULT_PUBLISH_INTERVAL_SECS),
        cancel.clone(),
    ));
    let tracking_handle = tokio::spawn(tracking_loop(
        pool,
        config,
        ebay,
        env_interval("TRACKING_INTERVAL_SECS", DEFAULT_TRACKING_INTERVAL_SECS),
        cancel.clone(),
    ));

    tracing::info!("Worker started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    cancel.cancel();

    let _ = publish_handle.await;
    let _ = tracking_handle.await;
    Ok(())
}

/// Publish every due draft on a fixed interval until cancelled.
async fn publish_loop(
    pool: DbPool,
    config: Arc<DbConfigProvider>,
    ebay: Arc<EbayApi>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Publish loop started");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Publish loop stopping");
                break;
            }
            _ = ticker.tick() => {
                match publisher::publish_batch(&pool, config.as_ref(), ebay.as_ref(), ACTOR).await {
                    Ok(summary) => {
                        if summary.selected > 0 {
                            tracing::info!(
                                selected = summary.selected,
                                published = summary.published,
                                failed = summary.failed,
                                skipped = summary.skipped,
                                "Publish pass complete",
                            );
                        }
                    }
                    Err(e) if e.is_paused() => {
                        tracing::info!("System paused; publish pass skipped");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Publish pass failed");
                    }
                }
            }
        }
    }
}

/// Reconcile tracking uploads on a fixed interval until cancelled.
async fn tracking_loop(
    pool: DbPool,
    config: Arc<DbConfigProvider>,
    ebay: Arc<EbayApi>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Tracking loop started");
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Tracking loop stopping");
                break;
            }
            _ = ticker.tick() => {
                match tracking::run_tracking_pass(&pool, config.as_ref(), ebay.as_ref(), ACTOR).await {
                    Ok(summary) => {
                        if summary.selected > 0 {
                            tracing::info!(
                                selected = summary.selected,
                                uploaded = summary.uploaded,
                                terminal = summary.terminal,
                                "Tracking pass complete",
                            );
                        }
                    }
                    Err(e) if e.is_paused() => {
                        tracing::info!("System paused; tracking pass skipped");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Tracking pass failed");
                    }
                }
            }
        }
    }
}
