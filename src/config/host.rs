//! Local host naming for the default encryption context.

use log::debug;

use crate::errors::{PipelineError, PipelineResult};

/// Fully-qualified name of this host. Falls back to the short host name when
/// the resolver has no canonical name for it.
pub fn local_fqdn() -> PipelineResult<String> {
    let short = hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .map_err(|e| PipelineError::Configuration(format!("Failed to get hostname: {}", e)))?;
    Ok(qualify(&short, canonical_name))
}

/// Prefer the dotted canonical name `resolve` finds for `short`.
pub fn qualify<F>(short: &str, resolve: F) -> String
where
    F: FnOnce(&str) -> Option<String>,
{
    match resolve(short) {
        Some(name) if name.contains('.') => name,
        _ => short.to_string(),
    }
}

/// Canonical name of `host` from `getaddrinfo` with `AI_CANONNAME`.
#[cfg(unix)]
pub fn canonical_name(host: &str) -> Option<String> {
    use dns_lookup::{getaddrinfo, AddrInfoHints};

    let hints = AddrInfoHints {
        socktype: 0,
        protocol: 0,
        address: 0,
        flags: libc::AI_CANONNAME,
    };
    let entries = match getaddrinfo(Some(host), None, Some(hints)) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No canonical name for {}: {:?}", host, e);
            return None;
        }
    };

    entries
        .filter_map(Result::ok)
        .find_map(|entry| entry.canonname)
        .map(|name| name.trim_end_matches('.').to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(not(unix))]
pub fn canonical_name(_host: &str) -> Option<String> {
    None
}
