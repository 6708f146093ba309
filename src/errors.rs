//! Error taxonomy for the encrypt-and-ship pipeline.
//!
//! Every failure is raised where it is detected and travels unchanged to the
//! top level, which logs it once and exits with a non-zero status. Nothing in
//! the library retries or recovers locally.

use thiserror::Error;

/// A fatal pipeline failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required identifiers (key, bucket) are missing or unusable.
    #[error("{0}")]
    Configuration(String),

    /// Missing source file, destination collision or local IO failure.
    #[error("{0}")]
    Filesystem(String),

    /// Region or account lookup failed.
    #[error("{0}")]
    Resolution(String),

    /// The encryption tool exited non-zero or the key service rejected the call.
    #[error("{0}")]
    Encryption(String),

    /// The object store rejected or failed the upload.
    #[error("{0}")]
    Upload(String),
}

impl PipelineError {
    /// Short name of the error class, used in trace output and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "configuration",
            PipelineError::Filesystem(_) => "filesystem",
            PipelineError::Resolution(_) => "resolution",
            PipelineError::Encryption(_) => "encryption",
            PipelineError::Upload(_) => "upload",
        }
    }
}

/// Convenience alias used throughout the library.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_the_bare_message() {
        let err = PipelineError::Filesystem("File out.enc already exists".to_string());
        assert_eq!(err.to_string(), "File out.enc already exists");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(PipelineError::Configuration(String::new()).kind(), "configuration");
        assert_eq!(PipelineError::Filesystem(String::new()).kind(), "filesystem");
        assert_eq!(PipelineError::Resolution(String::new()).kind(), "resolution");
        assert_eq!(PipelineError::Encryption(String::new()).kind(), "encryption");
        assert_eq!(PipelineError::Upload(String::new()).kind(), "upload");
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = PipelineError::Upload("bucket missing".to_string()).into();
        assert_eq!(format!("{:#}", err), "bucket missing");
        assert!(err.downcast_ref::<PipelineError>().is_some());
    }
}
