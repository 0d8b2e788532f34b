//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::net::TcpListener;
use wiremock::{Request, ResponseTemplate};

/// Run blocking client code (ureq, child processes) off the async runtime
/// that drives the mock server.
pub async fn blocking<T, F>(work: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .expect("blocking task panicked")
}

/// A canned response with a raw JSON body.
pub fn reply(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_owned(), "application/json")
}

/// Decoded value of a query parameter on a received request.
pub fn query(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

pub fn json(request: &Request) -> serde_json::Value {
    request.body_json().expect("request body is JSON")
}

/// A base URL nothing listens on.
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind scratch port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
