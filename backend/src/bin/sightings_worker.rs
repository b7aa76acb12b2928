//! Notification worker: drains the sighting notification queue until Ctrl-C.
//! Exits with an error if the consumer stops before then.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::sync::Arc;

use backend::outbound::notifications::LoggingNotificationHandler;
use backend::server::{ConsumerRuntime, WorkerSettings, connect_queue};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        WorkerSettings::load().map_err(|err| eyre!("failed to load worker settings: {err}"))?;
    let queue = connect_queue(&settings)
        .await
        .wrap_err("failed to connect notification queue")?;

    let consumer = ConsumerRuntime::spawn(
        queue.subscriber,
        Arc::new(LoggingNotificationHandler::new()),
        settings.redelivery_policy(),
    );
    info!(queue = settings.queue_name(), "sightings worker running");

    let consumer_died = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.wrap_err("failed to listen for shutdown signal")?;
            info!("shutdown requested");
            false
        }
        () = consumer.stopped() => {
            error!("queue consumer stopped unexpectedly");
            true
        }
    };

    let summary = consumer
        .shutdown(settings.shutdown_timeout())
        .await
        .wrap_err("worker shutdown failed")?;
    info!(
        acked = summary.acked,
        requeued = summary.requeued,
        dropped = summary.dropped,
        "sightings worker stopped"
    );
    if consumer_died {
        return Err(eyre!("queue consumer stopped before shutdown was requested"));
    }
    Ok(())
}
