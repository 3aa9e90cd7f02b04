//! Image Metadata Extractor
//!
//! Lambda-triggered service that processes S3 `ObjectCreated`
//! notifications, extracts file and image attributes from each new
//! object, and upserts them into a Postgres table keyed on the object
//! key.
//!
//! ## Processing model
//!
//! ```text
//! S3 Event (n records)
//!        │
//!        ▼  per record, strictly sequential
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Object Store │───▶│ Metadata     │───▶│ Metadata     │
//! │ fetch        │    │ extraction   │    │ writer       │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                                                │
//!                       Secrets Manager ◀────────┤ fresh credentials
//!                       Postgres upsert ◀────────┘ scoped connection
//! ```
//!
//! A failure at any stage is terminal and local to the offending
//! record: the item is skipped with an error log and the batch moves
//! on. The handler always returns the same 200 response; logs are the
//! only per-item failure signal.

pub mod config;
pub mod credentials;
pub mod handler;
pub mod image_probe;
pub mod metadata;
pub mod metadata_writer;
pub mod object_store;

pub use config::Config;
pub use credentials::{CredentialError, CredentialResolver, DbCredentials};
pub use handler::{process_records, BatchResponse, COMPLETION_MESSAGE};
pub use metadata::ImageMetadata;
pub use metadata_writer::{MetadataWriter, PersistOutcome};
pub use object_store::{FetchError, FetchedObject, ObjectStoreClient};
