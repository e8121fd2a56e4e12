use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Input could not be loaded. Fatal to the load: no partial table is returned.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("cannot read input {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed input at row {row}: {message}")]
    Malformed { row: usize, message: String },
    #[error("required column '{0}' is missing")]
    MissingColumn(String),
    #[error("row {row} has an empty identifier")]
    MissingId { row: usize },
    #[error("row {row} repeats identifier '{id}'")]
    DuplicateId { row: usize, id: String },
    #[error("row {row}: column {column} value '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}: column {column} value '{value}' is negative")]
    NegativeNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// The completion call failed. Callers fall back to the unenriched description.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("completion request failed: {0:#}")]
    Provider(anyhow::Error),
    #[error("completion returned no text")]
    EmptyCompletion,
}

/// An output unit could not be written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize record '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One output unit (or the schema) did not reach the remote store.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a valid record: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema setup failed: {0:#}")]
    Schema(anyhow::Error),
    #[error("store rejected record '{id}': {source:#}")]
    Rejected { id: String, source: anyhow::Error },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported document type: {0}")]
    UnsupportedFile(String),
    #[error("upload failed: {0:#}")]
    Submit(anyhow::Error),
    #[error("status check for job {job_id} failed: {source:#}")]
    Status { job_id: String, source: anyhow::Error },
    #[error("job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },
    #[error("job {job_id} still not finished after {attempts} status checks")]
    Timeout { job_id: String, attempts: u32 },
    #[error("fetching result of job {job_id} failed: {source:#}")]
    Result { job_id: String, source: anyhow::Error },
    #[error("cannot extract fields from result: {0}")]
    Extraction(String),
}

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("invalid project id '{0}'")]
    InvalidProjectId(String),
    #[error("no Google Cloud credentials configured; set GOOGLE_APPLICATION_CREDENTIALS")]
    MissingCredentials,
    #[error("input is not UTF-8 text: {0}")]
    InvalidInput(String),
    #[error("DLP API error: {0:#}")]
    Redaction(anyhow::Error),
    #[error("object storage upload failed: {0:#}")]
    Upload(anyhow::Error),
}
