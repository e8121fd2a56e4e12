use anyhow::Context;
use paslaugos_config::Config;
use paslaugos_core::MaskError;
use paslaugos_pipeline::{MaskRequest, Masker};
use paslaugos_providers::{DlpRedactor, GcpAuth, GcsObjectStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MaskInput {
    pub file: PathBuf,
    pub project_id: Option<String>,
    pub bucket: Option<String>,
}

/// Redacts PII with Cloud DLP and uploads the masked copy to Cloud Storage.
#[derive(Debug, Clone, Copy)]
pub struct MaskStrategy;

impl super::CommandStrategy for MaskStrategy {
    type Input = MaskInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let gcp = &config.providers.gcp;

        let credentials = gcp
            .credentials_path
            .as_ref()
            .ok_or(MaskError::MissingCredentials)?;
        let project_id = input.project_id.unwrap_or_else(|| gcp.project_id.clone());
        let bucket = input.bucket.unwrap_or_else(|| gcp.bucket.clone());
        if bucket.is_empty() {
            anyhow::bail!("No bucket given (--bucket or providers.gcp.bucket)");
        }

        let content = std::fs::read(&input.file)
            .with_context(|| format!("Failed to read {}", input.file.display()))?;
        let file_name = input
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Not a file: {}", input.file.display()))?;

        let auth = Arc::new(GcpAuth::from_service_account(credentials)?);
        let masker = Masker::new(
            DlpRedactor::new(Arc::clone(&auth), gcp.timeout_secs)?,
            GcsObjectStore::new(auth, gcp.timeout_secs)?,
        );

        let outcome = masker
            .mask(&MaskRequest {
                project_id: &project_id,
                bucket: &bucket,
                file_name: &file_name,
                content: &content,
            })
            .await?;

        println!("--- Original ---\n{}", outcome.original);
        println!("\n--- Masked ---\n{}", outcome.masked);
        println!("\nUploaded to {}", outcome.uri);
        Ok(())
    }
}
