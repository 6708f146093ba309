//! # kms-ship
//!
//! Encrypt a single file under an AWS KMS key and upload the ciphertext to
//! an S3 bucket.
//!
//! ## Overview
//!
//! One run takes one file through a fixed sequence:
//!
//! 1. **Validate** the job locally: key and bucket present, source exists,
//!    destination free (unless overwriting is allowed). Nothing touches the
//!    network before this passes.
//! 2. **Resolve** the region (environment, then instance metadata) and
//!    expand short key aliases such as `alias/backups` into full ARNs.
//! 3. **Encrypt** to the destination path, either with the external `sops`
//!    tool or with a direct KMS `Encrypt` call.
//! 4. **Upload** the destination file to `s3://{bucket}/{prefix}{name}` in a
//!    single request and report the result.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use kms_ship::cloud::s3::S3Store;
//! use kms_ship::config::{JobConfig, JobInputs};
//! use kms_ship::encrypt::sops::SopsEncryptor;
//! use kms_ship::logging::{Logger, Palette, Severity};
//! use kms_ship::pipeline::Pipeline;
//! use kms_ship::resolver::account::InstanceProfileLookup;
//! use kms_ship::resolver::metadata::ImdsClient;
//! use kms_ship::resolver::TargetResolver;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let logger = Arc::new(Logger::console(Severity::Info, &Palette::ansi()));
//! let job = JobConfig::build(
//!     JobInputs {
//!         source: "/var/backups/db.sql".into(),
//!         key_identifier: Some("alias/backups".to_string()),
//!         bucket: Some("my-backups".to_string()),
//!         target_prefix: "nightly".to_string(),
//!         context: "db01".to_string(),
//!         ..Default::default()
//!     },
//!     Utc::now(),
//! )?;
//!
//! let metadata = Arc::new(ImdsClient::new("http://169.254.169.254", std::time::Duration::from_secs(2))?);
//! let resolver = TargetResolver::new(
//!     metadata.clone(),
//!     Arc::new(InstanceProfileLookup::new(metadata)),
//!     logger.clone(),
//! );
//! let mut pipeline = Pipeline::new(
//!     resolver,
//!     Arc::new(SopsEncryptor::default()),
//!     Arc::new(S3Store),
//!     logger,
//! );
//! let report = pipeline.run(&job).await?;
//! println!("s3://{}/{}", report.bucket, report.object_key);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Environment snapshot, logging options and the job description
//! - [`logging`]: Leveled logger, format rules and the `log` bridge
//! - [`resolver`]: Validation, region lookup and key alias completion
//! - [`drain`]: Concurrent draining of child process output
//! - [`encrypt`]: The sops and direct KMS encryptors
//! - [`cloud`]: AWS client construction and the S3 upload
//! - [`pipeline`]: The driver tying the steps together
//! - [`errors`]: Error categories shared by every step
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Run configuration and job description
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Error categories
pub mod errors;

/// Leveled logging
pub mod logging;

/// Target resolution
pub mod resolver;

/// Child process output draining
pub mod drain;

/// Encryption variants
pub mod encrypt;

/// AWS service integration (S3, KMS, STS)
pub mod cloud;

/// Pipeline driver
pub mod pipeline;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
