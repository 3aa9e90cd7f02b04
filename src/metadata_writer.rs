use crate::credentials::{DbCredentials, Resolver};
use crate::metadata::ImageMetadata;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::env;
use tracing::{debug, error, info, instrument};

#[cfg(test)]
use mockall::automock;

#[cfg(test)]
pub use MockMetadataWriter as Writer;
#[cfg(not(test))]
pub use MetadataWriter as Writer;

/// Environment variable naming the secret that holds the database
/// credentials. Read at call time on every persistence attempt.
const SECRET_NAME_ENV: &str = "RDS_SECRET_NAME";

/// Terminal outcome of one persistence attempt. `persist` reports
/// everything through this enum and never raises outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Exactly one row inserted or overwritten
    Persisted,
    /// Credentials unavailable; no connection was attempted
    Skipped,
    /// The connection or upsert failed; already logged
    Failed,
}

/// Persistence capability: writes one metadata record per call over a
/// scoped connection, with credentials resolved fresh each time.
pub struct MetadataWriter {
    resolver: Resolver,
}

#[cfg_attr(test, automock)]
impl MetadataWriter {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Persist one metadata record with upsert semantics.
    ///
    /// Credential failures skip the write without attempting a
    /// connection. Store-level failures are logged and reported as
    /// [`PersistOutcome::Failed`]; neither propagates to the caller.
    #[instrument(skip(self, record), fields(image_id = %record.image_id))]
    pub async fn persist(&self, record: &ImageMetadata) -> PersistOutcome {
        info!(image_id = %record.image_id, "writing metadata record");

        let secret_name = match env::var(SECRET_NAME_ENV) {
            Ok(name) => name,
            Err(_) => {
                error!("{SECRET_NAME_ENV} is not set, skipping write");
                return PersistOutcome::Skipped;
            }
        };

        let credentials = match self.resolver.resolve(&secret_name).await {
            Ok(credentials) => credentials,
            Err(err) => {
                error!(secret = %secret_name, error = %err, "credential resolution failed, skipping write");
                return PersistOutcome::Skipped;
            }
        };

        match write_record(&credentials, record).await {
            Ok(()) => {
                info!(image_id = %record.image_id, "metadata record written");
                PersistOutcome::Persisted
            }
            Err(err) => {
                error!(image_id = %record.image_id, error = %err, "failed to write metadata record");
                PersistOutcome::Failed
            }
        }
    }
}

/// Open a scoped connection, upsert the record, and release the
/// connection on every exit path.
async fn write_record(credentials: &DbCredentials, record: &ImageMetadata) -> Result<()> {
    let options = PgConnectOptions::new()
        .host(&credentials.host)
        .username(&credentials.username)
        .password(&credentials.password)
        .database(&credentials.dbname);

    let mut conn = PgConnection::connect_with(&options)
        .await
        .context("failed to connect to the database")?;

    let upsert_result = upsert(&mut conn, record).await;

    // The connection is released whether or not the upsert succeeded.
    let close_result = conn.close().await;

    upsert_result.context("failed to upsert metadata record")?;
    close_result.context("failed to close database connection")?;

    Ok(())
}

/// Single parameterized upsert keyed on `image_id`. On conflict every
/// non-key column is overwritten with the new values, last write wins.
pub(crate) async fn upsert(conn: &mut PgConnection, record: &ImageMetadata) -> sqlx::Result<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO image_metadata (
            image_id, file_name, file_size, file_type, width, height, "timestamp"
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (image_id) DO UPDATE SET
            file_name = EXCLUDED.file_name,
            file_size = EXCLUDED.file_size,
            file_type = EXCLUDED.file_type,
            width = EXCLUDED.width,
            height = EXCLUDED.height,
            "timestamp" = EXCLUDED."timestamp"
        "#,
    )
    .bind(&record.image_id)
    .bind(&record.file_name)
    .bind(record.file_size)
    .bind(&record.file_type)
    .bind(record.width as i32)
    .bind(record.height as i32)
    .bind(&record.timestamp)
    .execute(&mut *conn)
    .await?;

    debug!(
        image_id = %record.image_id,
        rows_affected = result.rows_affected(),
        "upsert executed"
    );

    Ok(())
}
