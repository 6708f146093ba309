use std::str::FromStr;

use anyhow::{Context, Result};
use log::debug;
use rusoto_core::{HttpClient, Region};
use rusoto_credential::DefaultCredentialsProvider;
use rusoto_kms::KmsClient;
use rusoto_s3::S3Client;
use rusoto_sts::StsClient;

use crate::errors::{PipelineError, PipelineResult};

/// Parse a region name such as `eu-west-1`.
pub fn parse_region(name: &str) -> PipelineResult<Region> {
    Region::from_str(name)
        .map_err(|_| PipelineError::Resolution(format!("Unrecognised AWS region '{}'", name)))
}

/// HTTP client and default credential chain shared by every service client.
fn client_parts() -> Result<(HttpClient, DefaultCredentialsProvider)> {
    let http = HttpClient::new().context("Failed to create HTTP client")?;
    let credentials = DefaultCredentialsProvider::new().context("Failed to create AWS credentials provider")?;
    Ok((http, credentials))
}

/// Create an S3 client for the region.
pub fn s3_client(region_name: &str) -> PipelineResult<S3Client> {
    let region = parse_region(region_name)?;
    let (http, credentials) = client_parts().map_err(|e| PipelineError::Upload(format!("{:#}", e)))?;
    debug!("Creating S3 client in {}", region.name());
    Ok(S3Client::new_with(http, credentials, region))
}

/// Create a KMS client for the region.
pub fn kms_client(region_name: &str) -> PipelineResult<KmsClient> {
    let region = parse_region(region_name)?;
    let (http, credentials) = client_parts().map_err(|e| PipelineError::Encryption(format!("{:#}", e)))?;
    debug!("Creating KMS client in {}", region.name());
    Ok(KmsClient::new_with(http, credentials, region))
}

/// Create an STS client for the region.
pub fn sts_client(region_name: &str) -> PipelineResult<StsClient> {
    let region = parse_region(region_name)?;
    let (http, credentials) = client_parts().map_err(|e| PipelineError::Resolution(format!("{:#}", e)))?;
    debug!("Creating STS client in {}", region.name());
    Ok(StsClient::new_with(http, credentials, region))
}
