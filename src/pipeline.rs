//! Pipeline driver.
//!
//! Runs one job through `Start -> Resolved -> Encrypted -> Uploaded ->
//! Reported`. Any error moves the pipeline to `Failed` and is returned
//! unchanged; nothing is retried and partial files are left in place.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cloud::s3::{object_url, ObjectStore};
use crate::config::JobConfig;
use crate::encrypt::Encryptor;
use crate::errors::PipelineResult;
use crate::logging::Logger;
use crate::resolver::TargetResolver;

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Resolved,
    Encrypted,
    Uploaded,
    Reported,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Reported | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Resolved => "resolved",
            Stage::Encrypted => "encrypted",
            Stage::Uploaded => "uploaded",
            Stage::Reported => "reported",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Where the ciphertext ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub bucket: String,
    pub object_key: String,
    pub region: String,
    pub destination_path: PathBuf,
}

/// Sequences resolution, encryption and upload for a single job.
pub struct Pipeline {
    resolver: TargetResolver,
    encryptor: Arc<dyn Encryptor>,
    store: Arc<dyn ObjectStore>,
    logger: Arc<Logger>,
    stage: Stage,
}

impl Pipeline {
    pub fn new(
        resolver: TargetResolver,
        encryptor: Arc<dyn Encryptor>,
        store: Arc<dyn ObjectStore>,
        logger: Arc<Logger>,
    ) -> Self {
        Pipeline {
            resolver,
            encryptor,
            store,
            logger,
            stage: Stage::Start,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        self.logger.trace(format!("Pipeline {} -> {}", self.stage, next));
        self.stage = next;
    }

    /// Run the job to completion. A pipeline runs once; once it has reached
    /// a terminal stage it must not be run again.
    pub async fn run(&mut self, job: &JobConfig) -> PipelineResult<Report> {
        debug_assert_eq!(self.stage, Stage::Start, "pipeline already ran");
        match self.run_stages(job).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.logger.trace(format!("Pipeline failed with {} error", e.kind()));
                self.advance(Stage::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self, job: &JobConfig) -> PipelineResult<Report> {
        let resolved = self.resolver.resolve(job).await?;
        self.advance(Stage::Resolved);

        self.encryptor
            .encrypt(&resolved, Arc::clone(&self.logger))
            .await?;
        self.advance(Stage::Encrypted);

        self.logger.trace(format!(
            "Uploading {} to {}",
            resolved.destination_path.display(),
            object_url(&resolved.bucket, &resolved.object_key)
        ));
        self.store
            .upload(
                &resolved.destination_path,
                &resolved.bucket,
                &resolved.object_key,
                &resolved.region,
            )
            .await?;
        self.advance(Stage::Uploaded);

        self.logger.info(format!(
            "Uploaded file {} to {}",
            resolved.object_key, resolved.bucket
        ));
        self.advance(Stage::Reported);

        Ok(Report {
            bucket: resolved.bucket,
            object_key: resolved.object_key,
            region: resolved.region,
            destination_path: resolved.destination_path,
        })
    }
}
