//! LlamaParse document parsing API (upload, job status, JSON result).

use async_trait::async_trait;
use paslaugos_core::{DocumentParser, JobState, ParseUpload};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info};

use crate::{check_status, http_client};

pub struct LlamaParseClient {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
    parsing_instruction: String,
}

impl LlamaParseClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        language: String,
        parsing_instruction: String,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
            parsing_instruction,
        })
    }

    async fn get_json(&self, url: String, what: &str) -> anyhow::Result<Value> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Ok(check_status(response, what).await?.json::<Value>().await?)
    }
}

/// Map a LlamaParse status string onto the job state machine.
pub(crate) fn job_state(status: &str, body: &Value) -> JobState {
    match status.to_ascii_uppercase().as_str() {
        "PENDING" => JobState::Pending,
        "SUCCESS" => JobState::Succeeded,
        "ERROR" | "FAILED" | "CANCELED" | "CANCELLED" => {
            let reason = body["error_message"]
                .as_str()
                .or_else(|| body["error"].as_str())
                .unwrap_or(status);
            JobState::Failed(reason.to_string())
        }
        _ => JobState::Running,
    }
}

#[async_trait]
impl DocumentParser for LlamaParseClient {
    async fn submit(&self, upload: &ParseUpload) -> anyhow::Result<String> {
        let file = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let form = Form::new()
            .text("language", self.language.clone())
            .text("parsing_instruction", self.parsing_instruction.clone())
            .text("bounding_box", "0,0,0,0")
            .part("file", file);

        info!(
            "[{}] Uploading {} bytes to LlamaParse",
            upload.file_name,
            upload.bytes.len()
        );

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("Accept", "application/json")
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let body = check_status(response, "Document upload")
            .await?
            .json::<Value>()
            .await?;

        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid upload response: missing job id"))
    }

    async fn status(&self, job_id: &str) -> anyhow::Result<JobState> {
        let body = self
            .get_json(format!("{}/job/{job_id}", self.base_url), "Job status")
            .await?;
        let status = body["status"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid status response: missing status"))?;
        debug!("Job {job_id} status: {status}");
        Ok(job_state(status, &body))
    }

    async fn result(&self, job_id: &str) -> anyhow::Result<Value> {
        self.get_json(
            format!("{}/job/{job_id}/result/json", self.base_url),
            "Job result",
        )
        .await
    }
}
