//! Submit one sighting from the command line and publish its notification
//! batch to the configured queue.
//!
//! Sightings are held in memory for the lifetime of the command, so only the
//! queue side effect outlives it. Useful for smoke-testing a running
//! `sightings-worker` against the durable queue.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use backend::domain::{AnimalId, SightingIngestionService, SightingSubmission};
use backend::outbound::persistence::InMemorySightingRepository;
use backend::server::{WorkerSettings, connect_queue};
use chrono::{DateTime, Utc};
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `sightings-submit` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sightings-submit",
    about = "Submit an animal sighting and publish the resulting notification batch",
    version
)]
struct CliArgs {
    /// Identifier of the sighted animal.
    #[arg(long = "animal-id", value_name = "id")]
    animal_id: i64,
    /// Latitude in decimal degrees.
    #[arg(long = "lat", allow_negative_numbers = true)]
    latitude: f64,
    /// Longitude in decimal degrees.
    #[arg(long = "long", allow_negative_numbers = true)]
    longitude: f64,
    /// Reporter e-mail address.
    #[arg(long = "reporter", value_name = "email")]
    reporter: String,
    /// Observation time as RFC 3339. Defaults to now.
    #[arg(long = "timestamp", value_name = "rfc3339")]
    timestamp: Option<DateTime<Utc>>,
    /// Optional photo attached to the sighting.
    #[arg(long = "image", value_name = "path")]
    image: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = WorkerSettings::load_from_iter([OsString::from("sightings-submit")])
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    if settings.database_url().is_none() {
        warn!("no database configured; the notification will not outlive this command");
    }

    let image = args
        .image
        .as_ref()
        .map(|path| {
            std::fs::read(path).wrap_err_with(|| format!("failed to read image {}", path.display()))
        })
        .transpose()?;

    let queue = connect_queue(&settings)
        .await
        .wrap_err("failed to connect notification queue")?;
    let service = SightingIngestionService::new(
        Arc::new(InMemorySightingRepository::new()),
        queue.publisher,
    );

    let submitted = service
        .submit_sighting(SightingSubmission {
            animal_id: AnimalId::new(args.animal_id),
            timestamp: Some(args.timestamp.unwrap_or_else(Utc::now)),
            latitude: Some(args.latitude),
            longitude: Some(args.longitude),
            reporter: args.reporter,
            image,
        })
        .await;
    queue
        .subscriber
        .close()
        .await
        .wrap_err("failed to close notification queue")?;

    let id = submitted.map_err(|error| eyre!("sighting rejected: {error}"))?;
    println!("sighting_id={id}");
    Ok(())
}
