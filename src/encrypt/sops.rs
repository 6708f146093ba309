use std::ffi::OsString;
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::Encryptor;
use crate::config::ResolvedJob;
use crate::constants::{SOPS_DEFAULT_BINARY, SOPS_KMS_ARN_ENV};
use crate::drain::drain_child;
use crate::errors::{PipelineError, PipelineResult};
use crate::logging::Logger;

/// Copy `source` to `destination`, keeping permissions and access and
/// modification times.
pub fn copy_preserving_metadata(source: &Path, destination: &Path) -> PipelineResult<()> {
    let fs_error = |action: &str, e: std::io::Error| {
        PipelineError::Filesystem(format!(
            "Failed to {} {} to {}: {}",
            action,
            source.display(),
            destination.display(),
            e
        ))
    };

    // fs::copy carries the permission bits over
    fs::copy(source, destination).map_err(|e| fs_error("copy", e))?;

    let metadata = fs::metadata(source).map_err(|e| fs_error("read metadata while copying", e))?;
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }

    File::open(destination)
        .and_then(|file| file.set_times(times))
        .map_err(|e| fs_error("carry timestamps", e))
}

/// Encrypts in place with the sops command line tool.
///
/// The key ARN reaches sops through `SOPS_KMS_ARN`. Leading arguments are
/// placed before the sops arguments, which lets the binary be a wrapper
/// such as an interpreter plus script.
#[derive(Debug, Clone)]
pub struct SopsEncryptor {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl SopsEncryptor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        SopsEncryptor {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments after any leading ones: `--in-place --encrypt <file> --output-type binary`.
    pub fn sops_args(destination: &Path) -> Vec<OsString> {
        vec![
            "--in-place".into(),
            "--encrypt".into(),
            destination.as_os_str().to_owned(),
            "--output-type".into(),
            "binary".into(),
        ]
    }

    fn command(&self, job: &ResolvedJob) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(Self::sops_args(&job.destination_path))
            .env(SOPS_KMS_ARN_ENV, &job.key_identifier)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    fn describe(&self, destination: &Path) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.leading_args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.extend(Self::sops_args(destination).iter().map(|a| a.to_string_lossy().into_owned()));
        format!("{:?}", parts)
    }
}

impl Default for SopsEncryptor {
    fn default() -> Self {
        SopsEncryptor::new(SOPS_DEFAULT_BINARY)
    }
}

#[async_trait]
impl Encryptor for SopsEncryptor {
    fn name(&self) -> &'static str {
        "sops"
    }

    async fn encrypt(&self, job: &ResolvedJob, logger: Arc<Logger>) -> PipelineResult<()> {
        copy_preserving_metadata(&job.source_path, &job.destination_path)?;
        logger.trace(format!("Copied {} to {}", job.source_path.display(), job.destination_path.display()));

        logger.trace(format!("Starting encryption with {}", self.describe(&job.destination_path)));
        let child = self.command(job).spawn().map_err(|e| {
            PipelineError::Encryption(format!("Failed to start {}: {}", self.program.display(), e))
        })?;

        let report = drain_child(child, Arc::clone(&logger)).await?;
        logger.trace(format!(
            "{} finished with {} ({} stdout lines, {} stderr lines)",
            self.name(),
            report.status,
            report.stdout_lines,
            report.stderr_lines
        ));
        report.ensure_success(self.name())
    }
}
