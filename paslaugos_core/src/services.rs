//! Remote service boundaries other than the completion model.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::record::CollectionSchema;

/// Hosted vector-search document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> anyhow::Result<bool>;
    async fn create_collection(&self, schema: &CollectionSchema) -> anyhow::Result<()>;
    /// Submit one record. Returns the store-assigned object id when known.
    async fn create_object(
        &self,
        collection: &str,
        properties: &Map<String, Value>,
    ) -> anyhow::Result<Option<String>>;
}

/// State of a remote parse job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed(String),
}

/// A document handed to a parser.
#[derive(Debug, Clone)]
pub struct ParseUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Asynchronous document-parsing service with a job queue.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Upload a document and return the job id.
    async fn submit(&self, upload: &ParseUpload) -> anyhow::Result<String>;
    async fn status(&self, job_id: &str) -> anyhow::Result<JobState>;
    /// Raw JSON result of a finished job.
    async fn result(&self, job_id: &str) -> anyhow::Result<Value>;
}

/// PII de-identification service.
#[async_trait]
pub trait Redactor: Send + Sync {
    async fn deidentify(
        &self,
        project_id: &str,
        content: &str,
        info_types: &[&str],
    ) -> anyhow::Result<String>;
}

/// Object storage bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes and return the object URI.
    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<String>;
}
