#![recursion_limit = "256"]

use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_lambda_events::event::s3::S3Event;
use image_metadata_extractor::config::Config;
use image_metadata_extractor::credentials::Resolver;
use image_metadata_extractor::handler::handler;
use image_metadata_extractor::metadata_writer::Writer;
use image_metadata_extractor::object_store::ObjectStore;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging once for the process lifetime
    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        region = %config.aws.region,
        "starting image metadata extractor"
    );

    // Shared AWS config for both clients
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws.region.clone()))
        .load()
        .await;

    let store = Arc::new(ObjectStore::new(aws_sdk_s3::Client::new(&aws_config)));
    let resolver = Resolver::new(aws_sdk_secretsmanager::Client::new(&aws_config));
    let writer = Arc::new(Writer::new(resolver));

    let func = service_fn(move |event: LambdaEvent<S3Event>| {
        let store = store.clone();
        let writer = writer.clone();

        async move { handler(store, writer, event).await }
    });

    run(func).await
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}
