use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use rusoto_kms::{EncryptRequest, Kms};

use super::Encryptor;
use crate::cloud::client::kms_client;
use crate::config::ResolvedJob;
use crate::constants::{KMS_CONTEXT_KEY, KMS_MAX_PLAINTEXT_BYTES};
use crate::errors::{PipelineError, PipelineResult};
use crate::logging::Logger;

/// A synchronous encrypt call against a managed key service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyService: Send + Sync {
    async fn encrypt(
        &self,
        region: &str,
        key_id: &str,
        plaintext: Vec<u8>,
        context: HashMap<String, String>,
    ) -> PipelineResult<Vec<u8>>;
}

/// AWS KMS through rusoto. A client is built per call for the job's region.
#[derive(Debug, Default)]
pub struct RusotoKeyService;

#[async_trait]
impl KeyService for RusotoKeyService {
    async fn encrypt(
        &self,
        region: &str,
        key_id: &str,
        plaintext: Vec<u8>,
        context: HashMap<String, String>,
    ) -> PipelineResult<Vec<u8>> {
        let client = kms_client(region)?;
        let request = EncryptRequest {
            key_id: key_id.to_string(),
            plaintext: Bytes::from(plaintext),
            encryption_context: Some(context),
            ..Default::default()
        };

        let response = client
            .encrypt(request)
            .await
            .map_err(|e| PipelineError::Encryption(format!("KMS encrypt with {} failed: {}", key_id, e)))?;

        response
            .ciphertext_blob
            .map(|blob| blob.to_vec())
            .ok_or_else(|| PipelineError::Encryption("KMS returned no ciphertext".to_string()))
    }
}

fn check_payload_size(path: &Path, size: u64) -> PipelineResult<()> {
    if size > KMS_MAX_PLAINTEXT_BYTES as u64 {
        return Err(PipelineError::Encryption(format!(
            "{} is {} bytes; KMS encrypts at most {} bytes directly",
            path.display(),
            size,
            KMS_MAX_PLAINTEXT_BYTES
        )));
    }
    Ok(())
}

/// Encrypts the whole file with one KMS `Encrypt` call.
///
/// Limited to payloads of at most 4KB. The encryption context is sent as
/// `{"context": <value>}` and is needed again to decrypt.
pub struct KmsEncryptor {
    service: Arc<dyn KeyService>,
}

impl KmsEncryptor {
    pub fn new(service: Arc<dyn KeyService>) -> Self {
        KmsEncryptor { service }
    }
}

impl Default for KmsEncryptor {
    fn default() -> Self {
        KmsEncryptor::new(Arc::new(RusotoKeyService))
    }
}

#[async_trait]
impl Encryptor for KmsEncryptor {
    fn name(&self) -> &'static str {
        "kms"
    }

    async fn encrypt(&self, job: &ResolvedJob, logger: Arc<Logger>) -> PipelineResult<()> {
        let size = tokio::fs::metadata(&job.source_path)
            .await
            .map_err(|e| {
                PipelineError::Filesystem(format!("Failed to get metadata for {}: {}", job.source_path.display(), e))
            })?
            .len();
        check_payload_size(&job.source_path, size)?;

        let plaintext = tokio::fs::read(&job.source_path).await.map_err(|e| {
            PipelineError::Filesystem(format!("Failed to read {}: {}", job.source_path.display(), e))
        })?;
        // The file may have grown since the metadata check
        check_payload_size(&job.source_path, plaintext.len() as u64)?;

        let context = HashMap::from([(KMS_CONTEXT_KEY.to_string(), job.encryption_context.clone())]);
        logger.trace(format!(
            "Encrypting {} bytes with {} in {}",
            plaintext.len(),
            job.key_identifier,
            job.region
        ));

        let ciphertext = self
            .service
            .encrypt(&job.region, &job.key_identifier, plaintext, context)
            .await?;

        tokio::fs::write(&job.destination_path, &ciphertext).await.map_err(|e| {
            PipelineError::Filesystem(format!("Failed to write {}: {}", job.destination_path.display(), e))
        })?;
        logger.trace(format!("Written file {}", job.destination_path.display()));
        Ok(())
    }
}
