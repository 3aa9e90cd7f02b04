use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::Client as S3Client;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[cfg(test)]
use mockall::automock;

#[cfg(test)]
pub use MockObjectStoreClient as ObjectStore;
#[cfg(not(test))]
pub use ObjectStoreClient as ObjectStore;

/// One fetched object: payload bytes plus the content metadata the
/// store reported alongside them. The metadata fields are passed
/// through verbatim; absence is preserved, not defaulted.
#[derive(Debug, Clone)]
pub struct FetchedObject {
    /// Raw object payload
    pub bytes: Vec<u8>,
    /// Content-Length as reported by the store
    pub content_length: Option<i64>,
    /// Content-Type as reported by the store
    pub content_type: Option<String>,
}

/// Failure to fetch an object from the store
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("access denied for {key} in {bucket}")]
    AccessDenied { bucket: String, key: String },
    #[error("object {key} not found in {bucket}")]
    NotFound { bucket: String, key: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Blob-store fetch capability backed by S3
#[derive(Clone, Debug)]
pub struct ObjectStoreClient {
    inner: S3Client,
}

#[cfg_attr(test, automock)]
impl ObjectStoreClient {
    pub fn new(inner: S3Client) -> Self {
        Self { inner }
    }

    /// Fetch an object's bytes and content metadata by bucket and key.
    #[instrument(skip(self))]
    pub async fn fetch_object(&self, bucket: &str, key: &str) -> Result<FetchedObject, FetchError> {
        debug!(bucket = %bucket, key = %key, "fetching object contents");

        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.code() {
                Some("AccessDenied") => FetchError::AccessDenied {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
                Some("NoSuchKey") => FetchError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
                _ => FetchError::Other(anyhow::Error::new(err)),
            })?;

        let content_length = response.content_length();
        let content_type = response.content_type().map(String::from);

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|err| FetchError::Other(anyhow::Error::new(err)))?
            .into_bytes()
            .to_vec();

        info!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len(),
            "object read successfully"
        );

        Ok(FetchedObject {
            bytes,
            content_length,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        let denied = FetchError::AccessDenied {
            bucket: "test-bucket".to_string(),
            key: "test-key".to_string(),
        };
        assert_eq!(denied.to_string(), "access denied for test-key in test-bucket");

        let missing = FetchError::NotFound {
            bucket: "test-bucket".to_string(),
            key: "images/a.png".to_string(),
        };
        assert_eq!(missing.to_string(), "object images/a.png not found in test-bucket");
    }
}
