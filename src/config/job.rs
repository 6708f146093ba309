use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::errors::{PipelineError, PipelineResult};
use crate::resolver::target::{compose_object_key, default_destination};

/// Raw job inputs gathered from the command line and environment.
#[derive(Debug, Clone, Default)]
pub struct JobInputs {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub overwrite: bool,
    pub key_identifier: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub target_prefix: String,
    pub context: String,
}

/// Immutable description of one run, built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub overwrite_allowed: bool,
    pub key_identifier: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub target_prefix: String,
    pub encryption_context: String,
    pub result_object_key: String,
}

impl JobConfig {
    /// Build the job, synthesizing a destination when none was given and
    /// deriving the object key. Blank identifiers are normalized to `None`.
    pub fn build(inputs: JobInputs, now: DateTime<Utc>) -> PipelineResult<Self> {
        let destination_path = match inputs.destination {
            Some(destination) => destination,
            None => default_destination(&inputs.source, &inputs.context, now),
        };

        let object_name = basename(&destination_path)?;
        let result_object_key = compose_object_key(&inputs.target_prefix, &object_name);

        Ok(JobConfig {
            source_path: inputs.source,
            destination_path,
            overwrite_allowed: inputs.overwrite,
            key_identifier: non_blank(inputs.key_identifier),
            region: non_blank(inputs.region),
            bucket: non_blank(inputs.bucket),
            target_prefix: inputs.target_prefix,
            encryption_context: inputs.context,
            result_object_key,
        })
    }
}

/// A job whose region and key identifier are fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJob {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub overwrite_allowed: bool,
    pub key_identifier: String,
    pub region: String,
    pub bucket: String,
    pub encryption_context: String,
    pub object_key: String,
}

impl fmt::Display for ResolvedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} -> s3://{}/{} (key {}, region {})",
            self.source_path.display(),
            self.destination_path.display(),
            self.bucket,
            self.object_key,
            self.key_identifier,
            self.region
        )
    }
}

fn basename(path: &Path) -> PipelineResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PipelineError::Filesystem(format!(
                "Destination {} has no file name component",
                path.display()
            ))
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
