use async_trait::async_trait;
use paslaugos_core::ObjectStore;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

use super::auth::GcpAuth;
use crate::{check_status, http_client};

/// Google Cloud Storage simple media upload.
pub struct GcsObjectStore {
    auth: Arc<GcpAuth>,
    client: Client,
    upload_url: String,
}

impl GcsObjectStore {
    pub fn new(auth: Arc<GcpAuth>, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            auth,
            client: http_client(timeout_secs)?,
            upload_url: "https://storage.googleapis.com/upload/storage/v1".to_string(),
        })
    }
}

#[must_use]
pub fn gcs_uri(bucket: &str, object: &str) -> String {
    format!("gs://{bucket}/{object}")
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> anyhow::Result<String> {
        let token = self.auth.token().await?;
        info!("Uploading {} bytes to gs://{bucket}/{object}", data.len());

        let response = self
            .client
            .post(format!("{}/b/{bucket}/o", self.upload_url))
            .query(&[("uploadType", "media"), ("name", object)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;
        check_status(response, "GCS upload").await?;

        Ok(gcs_uri(bucket, object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcs_uri() {
        assert_eq!(
            gcs_uri("masked-files", "masked_notes.txt"),
            "gs://masked-files/masked_notes.txt"
        );
    }
}
