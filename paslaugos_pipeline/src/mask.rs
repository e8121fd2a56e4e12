//! PII masking: redact a text file through DLP and store the result.

use paslaugos_core::{MaskError, ObjectStore, Redactor};
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

/// Info types the DLP request inspects for.
pub const INFO_TYPES: [&str; 4] = [
    "PERSON_NAME",
    "PHONE_NUMBER",
    "EMAIL_ADDRESS",
    "US_SOCIAL_SECURITY_NUMBER",
];

static PROJECT_ID: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn project_id_pattern() -> &'static Regex {
    PROJECT_ID.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9-]{4,28}[a-z0-9]$")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[must_use]
pub fn is_valid_project_id(project_id: &str) -> bool {
    project_id_pattern().is_match(project_id)
}

#[must_use]
pub fn masked_object_name(file_name: &str) -> String {
    format!("masked_{file_name}")
}

#[derive(Debug, Clone)]
pub struct MaskRequest<'a> {
    pub project_id: &'a str,
    pub bucket: &'a str,
    pub file_name: &'a str,
    pub content: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskOutcome {
    pub original: String,
    pub masked: String,
    pub uri: String,
}

pub struct Masker<R, O> {
    redactor: R,
    store: O,
}

impl<R, O> Masker<R, O>
where
    R: Redactor,
    O: ObjectStore,
{
    pub const fn new(redactor: R, store: O) -> Self {
        Self { redactor, store }
    }

    /// Validate, redact, upload. Nothing is uploaded if redaction fails.
    pub async fn mask(&self, request: &MaskRequest<'_>) -> Result<MaskOutcome, MaskError> {
        if !is_valid_project_id(request.project_id) {
            return Err(MaskError::InvalidProjectId(request.project_id.to_string()));
        }
        let original = std::str::from_utf8(request.content)
            .map_err(|e| MaskError::InvalidInput(e.to_string()))?
            .to_string();

        let masked = self
            .redactor
            .deidentify(request.project_id, &original, &INFO_TYPES)
            .await
            .map_err(MaskError::Redaction)?;

        let object = masked_object_name(request.file_name);
        let uri = self
            .store
            .upload(
                request.bucket,
                &object,
                "text/plain; charset=utf-8",
                masked.clone().into_bytes(),
            )
            .await
            .map_err(MaskError::Upload)?;
        info!("Masked file uploaded to: {uri}");

        Ok(MaskOutcome {
            original,
            masked,
            uri,
        })
    }
}
