//! AWS service integration.
//!
//! Client construction for S3, KMS and STS, and the single-call S3 upload
//! used to ship the encrypted file.
//!
//! ```no_run
//! use std::path::Path;
//! use kms_ship::cloud::s3::{ObjectStore, S3Store};
//!
//! # async fn example() -> kms_ship::errors::PipelineResult<()> {
//! S3Store
//!     .upload(Path::new("/tmp/db.sql.enc"), "backups", "nightly/db.sql.enc", "eu-west-1")
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Region parsing and service client construction
pub mod client;

/// S3 upload
pub mod s3;
