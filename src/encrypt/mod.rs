//! Encryption step.
//!
//! Both variants leave ciphertext at the job's destination path:
//!
//! - [`sops::SopsEncryptor`] copies the source to the destination and runs
//!   `sops --in-place` on it, draining the tool's output through the logger.
//! - [`kms::KmsEncryptor`] reads the source into memory, calls KMS `Encrypt`
//!   and writes the returned blob.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ResolvedJob;
use crate::errors::PipelineResult;
use crate::logging::Logger;

/// Direct KMS API variant
pub mod kms;

/// External sops tool variant
pub mod sops;

/// Produces ciphertext at `job.destination_path`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Encryptor: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    async fn encrypt(&self, job: &ResolvedJob, logger: Arc<Logger>) -> PipelineResult<()>;
}
