#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! HTTP clients for the external services used by the paslaugos tools.

pub mod gcp;
pub mod llama_parse;
pub mod openai;
pub mod weaviate;

pub use gcp::{DlpRedactor, GcpAuth, GcsObjectStore};
pub use llama_parse::LlamaParseClient;
pub use openai::OpenAiProvider;
pub use weaviate::WeaviateStore;

use std::time::Duration;

/// Shared reqwest client with a request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Turn a non-2xx response into an error carrying the body.
pub(crate) async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{what} failed ({status}): {}", body.trim())
}
