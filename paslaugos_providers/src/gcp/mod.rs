//! Google Cloud DLP de-identification and Cloud Storage upload.

mod auth;
mod dlp;
mod gcs;

pub use auth::GcpAuth;
pub use dlp::DlpRedactor;
pub use gcs::GcsObjectStore;
