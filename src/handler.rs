use crate::metadata::ImageMetadata;
use crate::metadata_writer::{PersistOutcome, Writer};
use crate::object_store::ObjectStore;
use anyhow::{Context, Result};
use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Body of the fixed aggregate response, kept verbatim for the
/// invoker's benefit: per-item outcomes surface only through logs.
pub const COMPLETION_MESSAGE: &str = "Image metadata processing completed...";

/// Fixed aggregate response returned regardless of per-item outcomes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub status_code: i64,
    pub body: String,
}

impl BatchResponse {
    fn completed() -> Self {
        Self {
            status_code: 200,
            body: COMPLETION_MESSAGE.to_string(),
        }
    }
}

/// Terminal state of one notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemDisposition {
    /// Fetched, extracted, and written
    Persisted,
    /// Dropped at fetch, extraction, or credential resolution
    Skipped,
    /// The write failed after extraction succeeded
    Errored,
}

/// Lambda-facing entrypoint. Never fails the invocation: every
/// per-item failure is absorbed and logged by [`process_records`].
pub async fn handler(
    store: Arc<ObjectStore>,
    writer: Arc<Writer>,
    event: LambdaEvent<S3Event>,
) -> Result<BatchResponse, Error> {
    Ok(process_records(&store, &writer, event.payload).await)
}

/// Process every notification record in order, one full
/// fetch/extract/persist cycle at a time. Failure of one item never
/// affects the items after it.
#[instrument(skip_all, fields(record_count = event.records.len()))]
pub async fn process_records(store: &ObjectStore, writer: &Writer, event: S3Event) -> BatchResponse {
    info!(
        record_count = event.records.len(),
        "invoking image metadata extractor"
    );

    let mut persisted = 0u32;
    let mut skipped = 0u32;
    let mut errored = 0u32;

    for record in &event.records {
        match process_record(store, writer, record).await {
            Ok(ItemDisposition::Persisted) => persisted += 1,
            Ok(ItemDisposition::Skipped) => skipped += 1,
            Ok(ItemDisposition::Errored) => errored += 1,
            Err(err) => {
                // Catch-all at the item boundary: the batch moves on.
                error!(error = ?err, "unexpected failure while processing record");
                errored += 1;
            }
        }
    }

    info!(persisted, skipped, errored, "image metadata batch complete");

    BatchResponse::completed()
}

/// Run one record through fetch, extract, and persist.
async fn process_record(
    store: &ObjectStore,
    writer: &Writer,
    record: &S3EventRecord,
) -> Result<ItemDisposition> {
    let bucket = record
        .s3
        .bucket
        .name
        .as_deref()
        .context("notification record has no bucket name")?;
    let raw_key = record
        .s3
        .object
        .key
        .as_deref()
        .context("notification record has no object key")?;

    // Keys arrive percent-encoded in S3 event payloads.
    let key = urlencoding::decode(raw_key).context("object key is not valid UTF-8")?;

    let object = match store.fetch_object(bucket, &key).await {
        Ok(object) => object,
        Err(err) => {
            error!(key = %key, error = %err, "skipping record, could not fetch object contents");
            return Ok(ItemDisposition::Skipped);
        }
    };

    let Some(metadata) = ImageMetadata::extract(&object, &key) else {
        error!(key = %key, "skipping record, could not extract metadata");
        return Ok(ItemDisposition::Skipped);
    };

    match writer.persist(&metadata).await {
        PersistOutcome::Persisted => Ok(ItemDisposition::Persisted),
        PersistOutcome::Skipped => Ok(ItemDisposition::Skipped),
        PersistOutcome::Failed => Ok(ItemDisposition::Errored),
    }
}
