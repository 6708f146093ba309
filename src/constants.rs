//! Global constants for kms-ship.
//!
//! This module centralizes hardcoded values (endpoints, environment variable
//! names, naming formats and service limits) so they are defined once.

// Environment variables
/// Primary region override
pub const ENV_REGION: &str = "AWS_REGION";

/// Secondary region override, consulted after `AWS_REGION`
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Default key identifier
pub const ENV_KMS_ARN: &str = "KMS_ARN";

/// Default bucket
pub const ENV_S3_BUCKET: &str = "S3_BUCKET";

/// Enables debug output when non-empty
pub const ENV_DEBUG: &str = "DEBUG";

/// Enables trace output when non-empty
pub const ENV_TRACE: &str = "TRACE";

/// Colour suppression toggles, either spelling is honoured
pub const ENV_NOCOLOR: [&str; 2] = ["nocolor", "NOCOLOR"];

/// Override for the instance metadata endpoint
pub const ENV_METADATA_ENDPOINT: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";

/// Path to the sops executable
pub const ENV_SOPS_BINARY: &str = "SOPS_BINARY";

/// Encryption variant selector
pub const ENV_ENCRYPTOR: &str = "KMS_SHIP_ENCRYPTOR";

// Instance metadata service
/// Default link-local metadata endpoint
pub const METADATA_ENDPOINT: &str = "http://169.254.169.254";

/// Region of the running instance
pub const METADATA_REGION_PATH: &str = "/latest/meta-data/placement/region";

/// Instance profile document carrying `InstanceProfileArn`
pub const METADATA_IAM_INFO_PATH: &str = "/latest/meta-data/iam/info";

/// IMDSv2 session token endpoint
pub const METADATA_TOKEN_PATH: &str = "/latest/api/token";

/// Header requesting a session token lifetime
pub const METADATA_TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";

/// Header carrying the session token on subsequent requests
pub const METADATA_TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

/// Session token lifetime (6 hours, the service maximum)
pub const METADATA_TOKEN_TTL_SECS: u32 = 21600;

/// Upper bound on every metadata request
pub const METADATA_TIMEOUT_SECS: u64 = 2;

// Key identifiers
/// Prefixes marking a key identifier that lacks region and account
pub const SHORT_KEY_PREFIXES: [&str; 2] = ["alias/", "key/"];

/// Provider and service part of a KMS ARN
pub const KMS_ARN_PREFIX: &str = "arn:aws:kms";

/// Number of digits in an AWS account id
pub const ACCOUNT_ID_LENGTH: usize = 12;

/// Largest plaintext accepted by the KMS `Encrypt` call (4KB)
pub const KMS_MAX_PLAINTEXT_BYTES: usize = 4096;

/// Encryption context entry name for the caller-supplied context string
pub const KMS_CONTEXT_KEY: &str = "context";

// Naming
/// strftime format for the timestamp in generated destination names
pub const DESTINATION_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Extension of generated destination names
pub const DESTINATION_SUFFIX: &str = "enc";

/// Object key path separator
pub const KEY_SEPARATOR: char = '/';

// External tool
/// Default sops executable
pub const SOPS_DEFAULT_BINARY: &str = "sops";

/// Environment variable sops reads the key ARN from
pub const SOPS_KMS_ARN_ENV: &str = "SOPS_KMS_ARN";

/// Process exit status for any pipeline failure
pub const EXIT_FAILURE: i32 = 1;
