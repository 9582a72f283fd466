//! Image loader CLI.
//!
//! Registers the `file` scheme, resolves every image id given on the command
//! line and reports the outcome of each load.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_loader::{
    Config, EventReceiver, FileSource, ImageEvent, ImageLoadService, SourceLoader, FILE_SCHEME,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        0 => ExitCode::SUCCESS,
        failures => {
            error!("{} image(s) failed to load", failures);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_loader=debug"
    } else {
        "image_loader=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load every configured image id. Returns the number of failures.
async fn run(config: Config) -> usize {
    let options = match config.load_options() {
        Ok(options) => options,
        Err(e) => {
            error!("{}", e);
            return config.image_ids.len();
        }
    };

    let service = ImageLoadService::from_config(&config.service_config());
    service.registry().register_loader(
        FILE_SCHEME,
        Arc::new(SourceLoader::new(FileSource::new(&config.root))),
    );

    info!("Configuration:");
    info!("  Root: {}", config.root.display());
    info!("  Cache: {} entries", config.cache_capacity);
    if config.no_cache {
        info!("  Caching: disabled");
    }

    let events = tokio::spawn(log_events(service.subscribe()));

    let mut failures = 0;
    for image_id in &config.image_ids {
        let resolved = if config.no_cache {
            service.resolve_transient(image_id, &options)
        } else {
            service.resolve_and_cache(image_id, &options)
        };

        let promise = match resolved {
            Ok(promise) => promise,
            Err(e) => {
                error!("{}", e);
                failures += 1;
                continue;
            }
        };

        match promise.await {
            Ok(image) => println!(
                "{}\t{}x{}\t{} bytes",
                image.image_id,
                image.columns,
                image.rows,
                image.size_in_bytes()
            ),
            Err(e) => {
                error!("{}: {}", image_id, e);
                failures += 1;
            }
        }
    }

    // Dropping the service closes the event channel once observers finish
    drop(service);
    if let Err(e) = events.await {
        warn!("Event logger stopped: {}", e);
    }

    failures
}

async fn log_events(mut receiver: EventReceiver) {
    while let Some(event) = receiver.recv().await {
        match event {
            ImageEvent::ImageLoaded { image } => info!(image_id = %image.image_id, "image loaded"),
            ImageEvent::ImageLoadFailed { image_id, error } => {
                debug!(image_id = %image_id, error = %error, "image load failed event")
            }
        }
    }
}
