use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::constants::{ENV_ENCRYPTOR, ENV_KMS_ARN, ENV_S3_BUCKET, ENV_SOPS_BINARY, SOPS_DEFAULT_BINARY};

/// Command-line arguments for kms-ship.
///
/// Key and bucket fall back to the `KMS_ARN` and `S3_BUCKET` environment
/// variables; a flag always wins over its variable.
#[derive(Parser, Debug)]
#[clap(name = "kms-ship", about = "Encrypt a file under a KMS key and upload it to S3")]
pub struct Args {
    /// The source filename to process
    pub source: PathBuf,

    /// The output filename. Defaults to the source name plus a UTC timestamp,
    /// the encryption context and the extension '.enc'
    pub destination: Option<PathBuf>,

    /// Allow overwriting the destination path if it already exists
    #[clap(short, long)]
    pub overwrite: bool,

    /// The KMS key ARN or alias to use
    #[clap(
        short = 'k',
        long = "kms-arn",
        visible_aliases = ["kms", "kms-key", "kms-alias"],
        env = ENV_KMS_ARN
    )]
    pub kms_arn: Option<String>,

    /// The S3 bucket to upload to
    #[clap(short = 's', long = "s3-bucket", visible_alias = "s3", env = ENV_S3_BUCKET)]
    pub s3_bucket: Option<String>,

    /// Enable debug logging (also set by a non-empty DEBUG variable)
    #[clap(short = 'D', long)]
    pub debug: bool,

    /// Enable trace logging (also set by a non-empty TRACE variable)
    #[clap(short = 'T', long)]
    pub trace: bool,

    /// Disable coloured output (also set by 'nocolor' or 'NOCOLOR')
    #[clap(long, visible_alias = "nocolour")]
    pub nocolor: bool,

    /// Encryption context for later retrieval, e.g. hostname, cronjob or
    /// process. Defaults to the fully-qualified local hostname
    #[clap(long)]
    pub context: Option<String>,

    /// Place the uploaded file under this prefix inside the bucket
    #[clap(short = 'p', long, default_value = "")]
    pub target_path: String,

    /// How the file is encrypted
    #[clap(long, value_enum, default_value_t = EncryptorKind::Sops, env = ENV_ENCRYPTOR)]
    pub encryptor: EncryptorKind,

    /// How the account id is found when the key is a short alias
    #[clap(long, value_enum, default_value_t = AccountLookupKind::InstanceProfile)]
    pub account_lookup: AccountLookupKind,

    /// sops executable used by the sops encryptor
    #[clap(long, env = ENV_SOPS_BINARY, default_value = SOPS_DEFAULT_BINARY)]
    pub sops_binary: PathBuf,
}

/// Encryption variant.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum EncryptorKind {
    /// Copy the file and encrypt it in place with sops
    Sops,
    /// Call KMS Encrypt directly (payloads up to 4KB)
    Kms,
}

/// Account id discovery strategy.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum AccountLookupKind {
    /// Parse the instance profile ARN from instance metadata
    InstanceProfile,
    /// Ask STS GetCallerIdentity
    Sts,
}
