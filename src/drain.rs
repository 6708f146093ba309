//! Concurrent drain of a child process's output streams.
//!
//! A child that fills one pipe while the parent reads only the other blocks
//! forever. [`drain_child`] therefore starts one task per stream before it
//! waits on the child, and only returns once the child has exited and both
//! streams have reached end-of-file.

use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;

use crate::errors::{PipelineError, PipelineResult};
use crate::logging::{Logger, Severity};

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl StreamSource {
    /// Stdout lines are diagnostics, stderr lines are errors.
    pub fn severity(self) -> Severity {
        match self {
            StreamSource::Stdout => Severity::Debug,
            StreamSource::Stderr => Severity::Error,
        }
    }

    fn name(self) -> &'static str {
        match self {
            StreamSource::Stdout => "stdout",
            StreamSource::Stderr => "stderr",
        }
    }
}

/// One line read from a child stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLine {
    pub source: StreamSource,
    pub text: String,
}

impl StreamLine {
    /// Decode a raw line, dropping the terminator. Blank lines yield `None`.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn from_raw(source: StreamSource, raw: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches(['\n', '\r']);
        if text.trim().is_empty() {
            return None;
        }
        Some(StreamLine {
            source,
            text: text.to_string(),
        })
    }
}

/// Outcome of a fully drained child.
#[derive(Debug, Clone, Copy)]
pub struct DrainReport {
    pub status: ExitStatus,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
}

impl DrainReport {
    /// Encryption error unless the child exited with status 0.
    pub fn ensure_success(&self, program: &str) -> PipelineResult<()> {
        if self.status.success() {
            return Ok(());
        }
        Err(match self.status.code() {
            Some(code) => PipelineError::Encryption(format!("{} exited with status {}", program, code)),
            None => PipelineError::Encryption(format!("{} was terminated by a signal", program)),
        })
    }
}

/// Read `reader` to end-of-file one line at a time, forwarding each
/// non-blank line to the logger. Returns the number of lines forwarded.
pub async fn drain_stream<R>(reader: R, source: StreamSource, logger: &Logger) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    let mut forwarded = 0;

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }
        if let Some(line) = StreamLine::from_raw(source, &buffer) {
            logger.emit(line.source.severity(), &line.text);
            forwarded += 1;
        }
    }

    Ok(forwarded)
}

fn spawn_drain<R>(reader: R, source: StreamSource, logger: Arc<Logger>) -> JoinHandle<std::io::Result<usize>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move { drain_stream(reader, source, &logger).await })
}

async fn join_drain(handle: JoinHandle<std::io::Result<usize>>, source: StreamSource) -> PipelineResult<usize> {
    match handle.await {
        Ok(Ok(lines)) => Ok(lines),
        Ok(Err(e)) => Err(PipelineError::Encryption(format!(
            "Failed reading child {}: {}",
            source.name(),
            e
        ))),
        Err(e) => Err(PipelineError::Encryption(format!(
            "Child {} drain task failed: {}",
            source.name(),
            e
        ))),
    }
}

/// Drain both pipes of `child` concurrently and wait for it to exit.
///
/// The child must have been spawned with piped stdout and stderr. The exit
/// status is not interpreted here; see [`DrainReport::ensure_success`].
pub async fn drain_child(mut child: Child, logger: Arc<Logger>) -> PipelineResult<DrainReport> {
    let stdout = child.stdout.take().ok_or_else(|| {
        PipelineError::Encryption("Child process stdout is not piped".to_string())
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        PipelineError::Encryption("Child process stderr is not piped".to_string())
    })?;

    let stdout_task = spawn_drain(stdout, StreamSource::Stdout, Arc::clone(&logger));
    let stderr_task = spawn_drain(stderr, StreamSource::Stderr, Arc::clone(&logger));

    let status = child.wait().await;
    if status.is_err() {
        // Without a reaped child the pipes may never close
        let _ = child.start_kill();
    }

    let stdout_lines = join_drain(stdout_task, StreamSource::Stdout).await;
    let stderr_lines = join_drain(stderr_task, StreamSource::Stderr).await;

    let status = status
        .map_err(|e| PipelineError::Encryption(format!("Failed waiting for child process: {}", e)))?;

    Ok(DrainReport {
        status,
        stdout_lines: stdout_lines?,
        stderr_lines: stderr_lines?,
    })
}
