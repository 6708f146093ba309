//! Integration tests for the full pipeline with in-process fakes standing in
//! for instance metadata, KMS and S3.

mod common;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use common::write_file;
use kms_ship::cloud::s3::ObjectStore;
use kms_ship::config::{JobConfig, JobInputs};
use kms_ship::constants::{METADATA_IAM_INFO_PATH, METADATA_REGION_PATH};
use kms_ship::encrypt::kms::{KeyService, KmsEncryptor};
use kms_ship::encrypt::Encryptor;
use kms_ship::errors::{PipelineError, PipelineResult};
use kms_ship::logging::{LevelFormatter, Logger, MemorySink, OutputStream, Palette, Severity};
use kms_ship::pipeline::{Pipeline, Stage};
use kms_ship::resolver::account::{AccountLookup, InstanceProfileLookup};
use kms_ship::resolver::metadata::MetadataClient;
use kms_ship::resolver::TargetResolver;

/// Metadata documents served from memory, with a request log.
#[derive(Default)]
struct StaticMetadata {
    documents: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl StaticMetadata {
    fn with(mut self, path: &str, body: &str) -> Self {
        self.documents.insert(path.to_string(), body.to_string());
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataClient for StaticMetadata {
    async fn fetch(&self, path: &str) -> PipelineResult<String> {
        self.fetched.lock().unwrap().push(path.to_string());
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| PipelineError::Resolution(format!("no document at {}", path)))
    }
}

/// Account lookup that must never be consulted.
struct NoAccounts;

#[async_trait]
impl AccountLookup for NoAccounts {
    async fn account_id(&self, _region: &str) -> PipelineResult<String> {
        panic!("account lookup should not run for a full ARN");
    }
}

/// Records what would have been uploaded.
#[derive(Default)]
struct RecordingStore {
    uploads: Mutex<Vec<(String, String, String, Vec<u8>)>>,
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn upload(&self, path: &Path, bucket: &str, key: &str, region: &str) -> PipelineResult<()> {
        let body = fs::read(path).map_err(|e| PipelineError::Filesystem(e.to_string()))?;
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), region.to_string(), body));
        Ok(())
    }
}

/// Reverses the plaintext and remembers the request.
#[derive(Default)]
struct ReversingKeyService {
    calls: Mutex<Vec<(String, String, HashMap<String, String>)>>,
}

#[async_trait]
impl KeyService for ReversingKeyService {
    async fn encrypt(
        &self,
        region: &str,
        key_id: &str,
        mut plaintext: Vec<u8>,
        context: HashMap<String, String>,
    ) -> PipelineResult<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((region.to_string(), key_id.to_string(), context));
        plaintext.reverse();
        Ok(plaintext)
    }
}

fn logger(minimum: Severity) -> (Arc<Logger>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::new(minimum, LevelFormatter::standard(&Palette::plain()), sink.clone());
    (Arc::new(logger), sink)
}

fn inputs(source: PathBuf) -> JobInputs {
    JobInputs {
        source,
        key_identifier: Some("arn:aws:kms:us-west-2:123456789012:key/1234abcd".to_string()),
        bucket: Some("archive".to_string()),
        region: Some("us-west-2".to_string()),
        context: "ctx".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_default_destination_and_prefixed_key() {
    let dir = TempDir::new().unwrap();
    let source = write_file(dir.path(), "report.csv", b"a,b,c\n");
    let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();

    let job = JobConfig::build(
        JobInputs {
            target_prefix: "backups".to_string(),
            ..inputs(source)
        },
        now,
    )
    .unwrap();

    let expected_name = "report.csv.2024-03-05T07-08-09z.ctx.enc";
    assert_eq!(job.destination_path, dir.path().join(expected_name));
    assert_eq!(job.result_object_key, format!("backups/{}", expected_name));

    let service = Arc::new(ReversingKeyService::default());
    let store = Arc::new(RecordingStore::default());
    let (logger, sink) = logger(Severity::Info);
    let resolver = TargetResolver::new(
        Arc::new(StaticMetadata::default()),
        Arc::new(NoAccounts),
        logger.clone(),
    );
    let mut pipeline = Pipeline::new(
        resolver,
        Arc::new(KmsEncryptor::new(service.clone())),
        store.clone(),
        logger,
    );

    let report = pipeline.run(&job).await.unwrap();

    assert_eq!(pipeline.stage(), Stage::Reported);
    assert_eq!(report.object_key, format!("backups/{}", expected_name));
    assert_eq!(
        *store.uploads.lock().unwrap(),
        vec![(
            "archive".to_string(),
            format!("backups/{}", expected_name),
            "us-west-2".to_string(),
            b"\nc,b,a".to_vec()
        )]
    );
    assert_eq!(
        sink.lines(),
        vec![(
            OutputStream::Stdout,
            format!("Uploaded file backups/{} to archive", expected_name)
        )]
    );
}

#[tokio::test]
async fn test_region_and_alias_resolved_from_metadata() {
    let dir = TempDir::new().unwrap();
    let source = write_file(dir.path(), "creds.json", b"{}");
    let job = JobConfig::build(
        JobInputs {
            key_identifier: Some("alias/backups".to_string()),
            region: None,
            ..inputs(source)
        },
        Utc::now(),
    )
    .unwrap();

    let metadata = Arc::new(
        StaticMetadata::default()
            .with(METADATA_REGION_PATH, "eu-west-1")
            .with(
                METADATA_IAM_INFO_PATH,
                r#"{"InstanceProfileArn": "arn:aws:iam::123456789012:instance-profile/app"}"#,
            ),
    );
    let service = Arc::new(ReversingKeyService::default());
    let store = Arc::new(RecordingStore::default());
    let (logger, _) = logger(Severity::Info);
    let resolver = TargetResolver::new(
        metadata.clone(),
        Arc::new(InstanceProfileLookup::new(metadata.clone())),
        logger.clone(),
    );
    let mut pipeline = Pipeline::new(
        resolver,
        Arc::new(KmsEncryptor::new(service.clone())),
        store.clone(),
        logger,
    );

    let report = pipeline.run(&job).await.unwrap();

    assert_eq!(report.region, "eu-west-1");
    assert_eq!(
        metadata.fetched(),
        vec![METADATA_REGION_PATH.to_string(), METADATA_IAM_INFO_PATH.to_string()]
    );
    let calls = service.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "eu-west-1");
    assert_eq!(calls[0].1, "arn:aws:kms:eu-west-1:123456789012:alias/backups");
    assert_eq!(calls[0].2.get("context").map(String::as_str), Some("ctx"));
}

#[tokio::test]
async fn test_missing_profile_arn_fails_without_upload() {
    let dir = TempDir::new().unwrap();
    let source = write_file(dir.path(), "creds.json", b"{}");
    let job = JobConfig::build(
        JobInputs {
            key_identifier: Some("alias/backups".to_string()),
            ..inputs(source)
        },
        Utc::now(),
    )
    .unwrap();

    let metadata = Arc::new(StaticMetadata::default().with(METADATA_IAM_INFO_PATH, r#"{"Code":"Success"}"#));
    let store = Arc::new(RecordingStore::default());
    let (logger, sink) = logger(Severity::Info);
    let resolver = TargetResolver::new(
        metadata.clone(),
        Arc::new(InstanceProfileLookup::new(metadata)),
        logger.clone(),
    );
    let mut pipeline = Pipeline::new(
        resolver,
        Arc::new(KmsEncryptor::new(Arc::new(ReversingKeyService::default()))),
        store.clone(),
        logger,
    );

    let err = pipeline.run(&job).await.unwrap_err();

    assert_eq!(err.to_string(), "Unable to find account ID to complete KMS ARN");
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert!(store.uploads.lock().unwrap().is_empty());
    assert!(!job.destination_path.exists());
    assert!(sink.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_sops_output_is_relayed_line_by_line() {
    use kms_ship::encrypt::sops::SopsEncryptor;

    let dir = TempDir::new().unwrap();
    let source = write_file(dir.path(), "app.env", b"SECRET=1\n");
    let script = write_file(
        dir.path(),
        "sops.sh",
        b"i=0\nwhile [ $i -lt 40 ]; do echo \"progress $i\"; i=$((i+1)); done\n\
          echo 'warn one' >&2\necho 'warn two' >&2\nprintf 'ENC' > \"$3\"\n",
    );
    let job = JobConfig::build(inputs(source), Utc::now()).unwrap();

    let encryptor = SopsEncryptor::new("sh").with_leading_args([script.as_os_str().to_owned()]);
    let store = Arc::new(RecordingStore::default());
    let (logger, sink) = logger(Severity::Debug);
    let resolver = TargetResolver::new(
        Arc::new(StaticMetadata::default()),
        Arc::new(NoAccounts),
        logger.clone(),
    );
    let mut pipeline = Pipeline::new(resolver, Arc::new(encryptor), store.clone(), logger);

    pipeline.run(&job).await.unwrap();

    let progress: Vec<String> = sink
        .stream(OutputStream::Stdout)
        .into_iter()
        .filter(|l| l.starts_with("DEBUG: progress "))
        .collect();
    let expected: Vec<String> = (0..40).map(|i| format!("DEBUG: progress {}", i)).collect();
    assert_eq!(progress, expected);
    assert_eq!(sink.stream(OutputStream::Stderr), vec!["ERROR: warn one", "ERROR: warn two"]);
    assert_eq!(store.uploads.lock().unwrap()[0].3, b"ENC");
}

#[tokio::test]
async fn test_encryptor_name_is_stable() {
    let encryptor: Arc<dyn Encryptor> = Arc::new(KmsEncryptor::new(Arc::new(ReversingKeyService::default())));
    assert_eq!(encryptor.name(), "kms");
}
