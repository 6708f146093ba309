//! Run configuration.
//!
//! Turns parsed [`Args`] and an [`EnvSnapshot`] into the immutable
//! [`JobConfig`] and the logging options for the run.

use chrono::{DateTime, Utc};

use crate::cli::Args;
use crate::errors::PipelineResult;
use crate::logging::{Palette, Severity};

/// Environment snapshot
pub mod env_vars;

/// Host naming
pub mod host;

/// Job description types
pub mod job;

pub use env_vars::EnvSnapshot;
pub use job::{JobConfig, JobInputs, ResolvedJob};

/// Logger settings derived once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingOptions {
    pub minimum: Severity,
    pub color: bool,
}

impl LoggingOptions {
    /// Trace (flag or `TRACE`) beats debug (flag or `DEBUG`), which beats the
    /// Info default.
    pub fn resolve(args: &Args, env: &EnvSnapshot) -> Self {
        let trace = args.trace || env.trace_requested();
        let debug = args.debug || env.debug_requested();
        LoggingOptions {
            minimum: Severity::from_signals(trace, debug),
            color: !(args.nocolor || env.nocolor_requested()),
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::for_color(self.color)
    }
}

/// Build the job from the command line. The encryption context defaults to
/// the fully-qualified name of the local host.
pub fn job_from_args(args: &Args, env: &EnvSnapshot, now: DateTime<Utc>) -> PipelineResult<JobConfig> {
    let context = match &args.context {
        Some(context) => context.clone(),
        None => host::local_fqdn()?,
    };

    JobConfig::build(
        JobInputs {
            source: args.source.clone(),
            destination: args.destination.clone(),
            overwrite: args.overwrite,
            key_identifier: args.kms_arn.clone(),
            bucket: args.s3_bucket.clone(),
            region: env.region().map(str::to_string),
            target_prefix: args.target_path.clone(),
            context,
        },
        now,
    )
}
