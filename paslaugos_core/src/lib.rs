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

//! Shared types and service boundaries for the paslaugos tools.
//!
//! Every external service (completion model, vector document store, document
//! parser, DLP redaction, object storage) is reached through one of the traits
//! below so the pipeline can be driven by fakes in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod record;
pub mod services;

pub use error::{
    EnrichmentError, MaskError, ParseError, PersistenceError, UploadError, ValidationError,
};
pub use record::{CollectionSchema, PropertyKind, PropertySpec, Record};
pub use services::{DocumentParser, DocumentStore, JobState, ObjectStore, ParseUpload, Redactor};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Text-completion capability (chat-style request, free-text reply).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<Completion>;
    fn get_default_model(&self) -> &str;
}
