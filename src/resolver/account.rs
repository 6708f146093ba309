//! Account id discovery strategies.
//!
//! A short key alias needs the caller's account id before it can be turned
//! into a full ARN. Two strategies exist: reading the instance profile ARN
//! from instance metadata, or asking STS who the caller is.

use std::sync::Arc;

use async_trait::async_trait;
use rusoto_sts::{GetCallerIdentityRequest, Sts};
use serde::Deserialize;

use super::metadata::MetadataClient;
use super::target::{account_from_arn, is_valid_account_id};
use crate::cloud::client::sts_client;
use crate::constants::METADATA_IAM_INFO_PATH;
use crate::errors::{PipelineError, PipelineResult};

/// Looks up the account id of the running identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn account_id(&self, region: &str) -> PipelineResult<String>;
}

/// The `iam/info` metadata document.
#[derive(Debug, Deserialize)]
pub struct IamInfo {
    #[serde(rename = "InstanceProfileArn")]
    pub instance_profile_arn: Option<String>,
}

/// Reads the account id out of the instance profile ARN.
pub struct InstanceProfileLookup {
    metadata: Arc<dyn MetadataClient>,
}

impl InstanceProfileLookup {
    pub fn new(metadata: Arc<dyn MetadataClient>) -> Self {
        InstanceProfileLookup { metadata }
    }
}

#[async_trait]
impl AccountLookup for InstanceProfileLookup {
    async fn account_id(&self, _region: &str) -> PipelineResult<String> {
        let document = self.metadata.fetch(METADATA_IAM_INFO_PATH).await?;
        let info: IamInfo = serde_json::from_str(&document).map_err(|e| {
            PipelineError::Resolution(format!("Unable to parse instance profile information: {}", e))
        })?;

        let account = info
            .instance_profile_arn
            .as_deref()
            .and_then(account_from_arn)
            .ok_or_else(|| {
                PipelineError::Resolution("Unable to find account ID to complete KMS ARN".to_string())
            })?;

        checked(account)
    }
}

/// Asks STS `GetCallerIdentity` in the resolved region.
#[derive(Debug, Default)]
pub struct StsLookup;

#[async_trait]
impl AccountLookup for StsLookup {
    async fn account_id(&self, region: &str) -> PipelineResult<String> {
        let client = sts_client(region)?;
        let identity = client
            .get_caller_identity(GetCallerIdentityRequest {})
            .await
            .map_err(|e| PipelineError::Resolution(format!("Identity lookup failed: {}", e)))?;

        let account = identity
            .account
            .filter(|account| !account.is_empty())
            .ok_or_else(|| {
                PipelineError::Resolution("Unable to find account ID to complete KMS ARN".to_string())
            })?;

        checked(&account)
    }
}

fn checked(account: &str) -> PipelineResult<String> {
    if is_valid_account_id(account) {
        Ok(account.to_string())
    } else {
        Err(PipelineError::Resolution(format!(
            "Account ID '{}' is not a 12 digit AWS account ID",
            account
        )))
    }
}
