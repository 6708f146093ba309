use std::path::Path;

use async_trait::async_trait;
use bytes::BytesMut;
use futures::TryStreamExt;
use log::debug;
use rusoto_core::ByteStream;
use rusoto_s3::{PutObjectRequest, S3};
use tokio::fs::File as AsyncFile;
use tokio_util::codec::{BytesCodec, FramedRead};

use super::client::s3_client;
use crate::errors::{PipelineError, PipelineResult};

/// Object storage destination for the encrypted file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `path` to `bucket` under `key` as one call.
    async fn upload(&self, path: &Path, bucket: &str, key: &str, region: &str) -> PipelineResult<()>;
}

/// `s3://bucket/key` form used in log lines.
pub fn object_url(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// Amazon S3 upload through a single `PutObject` request.
///
/// The body is streamed from disk with a known content length, so the file
/// is never held in memory whole. There is no retry and no multipart path.
#[derive(Debug, Default)]
pub struct S3Store;

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(&self, path: &Path, bucket: &str, key: &str, region: &str) -> PipelineResult<()> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            PipelineError::Filesystem(format!("Failed to get metadata for {}: {}", path.display(), e))
        })?;
        let file = AsyncFile::open(path).await.map_err(|e| {
            PipelineError::Filesystem(format!("Failed to open {} for S3 upload: {}", path.display(), e))
        })?;

        let size = metadata.len();
        let stream = FramedRead::new(file, BytesCodec::new()).map_ok(BytesMut::freeze);
        let client = s3_client(region)?;

        debug!("Uploading {} ({} bytes) to {}", path.display(), size, object_url(bucket, key));

        let request = PutObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_length: Some(size as i64),
            body: Some(ByteStream::new_with_size(stream, size as usize)),
            ..Default::default()
        };

        client.put_object(request).await.map_err(|e| {
            PipelineError::Upload(format!(
                "Failed to upload {} to {}: {}",
                path.display(),
                object_url(bucket, key),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url() {
        assert_eq!(object_url("bucket", "a/b.enc"), "s3://bucket/a/b.enc");
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_filesystem_error() {
        let result = S3Store
            .upload(Path::new("/nonexistent/file.enc"), "bucket", "file.enc", "us-east-1")
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, PipelineError::Filesystem(_)));
        assert!(err.to_string().contains("Failed to get metadata"));
    }

    #[tokio::test]
    async fn test_upload_invalid_region_fails_before_request() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = S3Store.upload(file.path(), "bucket", "key", "not-a-region").await;
        assert!(matches!(result, Err(PipelineError::Resolution(_))));
    }
}
