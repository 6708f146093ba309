//! Shared helpers for the integration tests.
//!
//! Instance metadata is served by a `wiremock` server; these helpers mount
//! the documents the client asks for and read back what it requested.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kms_ship::constants::METADATA_TOKEN_PATH;

/// Answer the IMDSv2 token request with `token`.
pub async fn mock_session_token(server: &MockServer, token: &str) {
    Mock::given(method("PUT"))
        .and(path(METADATA_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(token))
        .mount(server)
        .await;
}

/// Serve `body` for `GET document`.
pub async fn mock_document(server: &MockServer, document: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(document))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Answer every request after `delay`, token endpoint included.
pub async fn mock_unresponsive(server: &MockServer, delay: Duration) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_string("late").set_delay(delay))
        .mount(server)
        .await;
}

/// Paths requested with `verb`, in arrival order.
pub async fn requested_paths(server: &MockServer, verb: &str) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == verb)
        .map(|request| request.url.path().to_string())
        .collect()
}

/// Write `content` to `name` inside `dir` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
