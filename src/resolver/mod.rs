//! Target resolution.
//!
//! Turns a [`JobConfig`] into a [`ResolvedJob`] before anything destructive
//! or billable happens: local validation first, then the region, then the
//! fully-qualified key identifier.

use std::sync::Arc;

use crate::config::{JobConfig, ResolvedJob};
use crate::constants::{ENV_KMS_ARN, ENV_S3_BUCKET, METADATA_REGION_PATH};
use crate::errors::{PipelineError, PipelineResult};
use crate::logging::Logger;

/// Account id strategies
pub mod account;

/// Instance metadata access
pub mod metadata;

/// Naming rules for destinations, object keys and ARNs
pub mod target;

use account::AccountLookup;
use metadata::MetadataClient;

/// Check the job before any network call. Fatal on the first failing rule:
/// missing identifiers, missing source, then destination collision.
/// Returns the key identifier and bucket.
pub fn validate(job: &JobConfig) -> PipelineResult<(&str, &str)> {
    let (Some(key), Some(bucket)) = (job.key_identifier.as_deref(), job.bucket.as_deref()) else {
        let mut missing = Vec::new();
        if job.key_identifier.is_none() {
            missing.push(ENV_KMS_ARN);
        }
        if job.bucket.is_none() {
            missing.push(ENV_S3_BUCKET);
        }
        return Err(PipelineError::Configuration(format!(
            "Missing critical values: {}",
            missing.join(", ")
        )));
    };

    if !job.source_path.exists() {
        return Err(PipelineError::Filesystem(format!(
            "Missing source file {}",
            job.source_path.display()
        )));
    }

    if job.destination_path.exists() && !job.overwrite_allowed {
        return Err(PipelineError::Filesystem(format!(
            "File {} already exists",
            job.destination_path.display()
        )));
    }

    Ok((key, bucket))
}

/// Resolves region and key identifier for a validated job.
pub struct TargetResolver {
    metadata: Arc<dyn MetadataClient>,
    accounts: Arc<dyn AccountLookup>,
    logger: Arc<Logger>,
}

impl TargetResolver {
    pub fn new(
        metadata: Arc<dyn MetadataClient>,
        accounts: Arc<dyn AccountLookup>,
        logger: Arc<Logger>,
    ) -> Self {
        TargetResolver {
            metadata,
            accounts,
            logger,
        }
    }

    /// Environment-provided region, else instance metadata.
    pub async fn resolve_region(&self, job: &JobConfig) -> PipelineResult<String> {
        if let Some(region) = &job.region {
            return Ok(region.clone());
        }

        self.logger
            .trace("AWS Region not specified in an environment variable. Checking instance metadata.");
        let region = self.metadata.fetch(METADATA_REGION_PATH).await?;

        if region.trim().is_empty() {
            return Err(PipelineError::Resolution(
                "Error fetching region: instance metadata returned an empty region".to_string(),
            ));
        }
        Ok(region.trim().to_string())
    }

    /// Expand `alias/...` and `key/...` into a full ARN. Anything else is
    /// returned unchanged.
    pub async fn complete_key_identifier(&self, key: &str, region: &str) -> PipelineResult<String> {
        if !target::is_short_key_identifier(key) {
            return Ok(key.to_string());
        }

        self.logger
            .trace("KMS ARN does not have an account ID. Checking options.");
        let account_id = self.accounts.account_id(region).await?;
        Ok(target::qualify_key_identifier(key, region, &account_id))
    }

    /// Validate, then resolve region and key identifier.
    pub async fn resolve(&self, job: &JobConfig) -> PipelineResult<ResolvedJob> {
        let (key, bucket) = validate(job)?;

        let region = self.resolve_region(job).await?;
        let key_identifier = self.complete_key_identifier(key, &region).await?;
        if key_identifier.is_empty() {
            return Err(PipelineError::Configuration(
                "Key identifier is empty after resolution".to_string(),
            ));
        }

        let resolved = ResolvedJob {
            source_path: job.source_path.clone(),
            destination_path: job.destination_path.clone(),
            overwrite_allowed: job.overwrite_allowed,
            key_identifier,
            region,
            bucket: bucket.to_string(),
            encryption_context: job.encryption_context.clone(),
            object_key: job.result_object_key.clone(),
        };
        self.logger.trace(format!("Resolved job: {}", resolved));
        Ok(resolved)
    }
}
