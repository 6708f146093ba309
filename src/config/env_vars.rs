use std::collections::HashMap;

use crate::constants::{
    ENV_DEBUG, ENV_DEFAULT_REGION, ENV_METADATA_ENDPOINT, ENV_NOCOLOR, ENV_REGION, ENV_TRACE,
};

/// Environment variables captured once at startup.
///
/// Everything downstream reads from the snapshot instead of the live process
/// environment, so a run sees one consistent view and tests can supply their
/// own variables.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Variables that are not valid
    /// unicode are skipped.
    pub fn capture() -> Self {
        EnvSnapshot {
            vars: std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvSnapshot {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of a variable, treating empty values as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Region override: `AWS_REGION`, then `AWS_DEFAULT_REGION`.
    pub fn region(&self) -> Option<&str> {
        self.get(ENV_REGION)
            .or_else(|| self.get(ENV_DEFAULT_REGION))
            .map(str::trim)
            .filter(|region| !region.is_empty())
    }

    pub fn debug_requested(&self) -> bool {
        self.is_set(ENV_DEBUG)
    }

    pub fn trace_requested(&self) -> bool {
        self.is_set(ENV_TRACE)
    }

    /// Colour suppression through either `nocolor` or `NOCOLOR`.
    pub fn nocolor_requested(&self) -> bool {
        ENV_NOCOLOR.iter().any(|name| self.is_set(name))
    }

    pub fn metadata_endpoint(&self) -> Option<&str> {
        self.get(ENV_METADATA_ENDPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_count_as_unset() {
        let env = EnvSnapshot::from_pairs([("DEBUG", ""), ("TRACE", "1")]);
        assert!(!env.debug_requested());
        assert!(env.trace_requested());
    }

    #[test]
    fn test_region_prefers_aws_region() {
        let env = EnvSnapshot::from_pairs([("AWS_REGION", "eu-west-1"), ("AWS_DEFAULT_REGION", "us-east-1")]);
        assert_eq!(env.region(), Some("eu-west-1"));

        let env = EnvSnapshot::from_pairs([("AWS_DEFAULT_REGION", "us-east-1")]);
        assert_eq!(env.region(), Some("us-east-1"));

        let env = EnvSnapshot::from_pairs([("AWS_REGION", "  ")]);
        assert_eq!(env.region(), None);
    }

    #[test]
    fn test_nocolor_either_spelling() {
        assert!(EnvSnapshot::from_pairs([("nocolor", "true")]).nocolor_requested());
        assert!(EnvSnapshot::from_pairs([("NOCOLOR", "1")]).nocolor_requested());
        assert!(!EnvSnapshot::default().nocolor_requested());
    }

    #[test]
    fn test_capture_sees_process_environment() {
        let env = EnvSnapshot::capture();
        // PATH is present in every environment the tests run in
        assert_eq!(env.get("PATH").map(str::to_string), std::env::var("PATH").ok().filter(|p| !p.is_empty()));
    }
}
