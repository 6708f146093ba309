//! Pure naming rules: destination paths, object keys and key ARNs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::constants::{
    ACCOUNT_ID_LENGTH, DESTINATION_SUFFIX, DESTINATION_TIMESTAMP_FORMAT, KEY_SEPARATOR,
    KMS_ARN_PREFIX, SHORT_KEY_PREFIXES,
};

/// Default destination: `{source}.{UTC timestamp}z.{context}.enc`.
pub fn default_destination(source: &Path, context: &str, now: DateTime<Utc>) -> PathBuf {
    let mut name = OsString::from(source.as_os_str());
    name.push(format!(
        ".{}z.{}.{}",
        now.format(DESTINATION_TIMESTAMP_FORMAT),
        context,
        DESTINATION_SUFFIX
    ));
    PathBuf::from(name)
}

/// Give a non-empty prefix exactly one trailing separator. Empty stays empty.
pub fn canonicalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with(KEY_SEPARATOR) {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, KEY_SEPARATOR)
    }
}

/// Object key for `name` under `prefix`.
pub fn compose_object_key(prefix: &str, name: &str) -> String {
    format!("{}{}", canonicalize_prefix(prefix), name)
}

/// Whether a key identifier lacks region and account (`alias/...`, `key/...`).
pub fn is_short_key_identifier(key: &str) -> bool {
    SHORT_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// `arn:aws:kms:{region}:{account}:{key}`
pub fn qualify_key_identifier(key: &str, region: &str, account_id: &str) -> String {
    format!("{}:{}:{}:{}", KMS_ARN_PREFIX, region, account_id, key)
}

/// Account id field of an ARN (`arn:partition:service:region:account:resource`).
pub fn account_from_arn(arn: &str) -> Option<&str> {
    arn.split(':').nth(4).filter(|account| !account.is_empty())
}

pub fn is_valid_account_id(account_id: &str) -> bool {
    account_id.len() == ACCOUNT_ID_LENGTH && account_id.bytes().all(|b| b.is_ascii_digit())
}
