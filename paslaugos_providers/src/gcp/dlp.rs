use async_trait::async_trait;
use paslaugos_core::Redactor;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::auth::GcpAuth;
use crate::{check_status, http_client};

/// Cloud DLP `content:deidentify` with character masking.
pub struct DlpRedactor {
    auth: Arc<GcpAuth>,
    client: Client,
    endpoint: String,
}

impl DlpRedactor {
    pub fn new(auth: Arc<GcpAuth>, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            auth,
            client: http_client(timeout_secs)?,
            endpoint: "https://dlp.googleapis.com/v2".to_string(),
        })
    }
}

pub(crate) fn deidentify_request(content: &str, info_types: &[&str]) -> Value {
    let info_types: Vec<Value> = info_types.iter().map(|t| json!({"name": t})).collect();
    json!({
        "deidentifyConfig": {
            "infoTypeTransformations": {
                "transformations": [{
                    "primitiveTransformation": {
                        "characterMaskConfig": {
                            "maskingCharacter": "*",
                            "numberToMask": 100
                        }
                    }
                }]
            }
        },
        "inspectConfig": {"infoTypes": info_types},
        "item": {"value": content},
    })
}

#[async_trait]
impl Redactor for DlpRedactor {
    async fn deidentify(
        &self,
        project_id: &str,
        content: &str,
        info_types: &[&str],
    ) -> anyhow::Result<String> {
        let token = self.auth.token().await?;
        info!(
            "Sending {} chars to DLP for project {project_id}",
            content.chars().count()
        );

        let response = self
            .client
            .post(format!(
                "{}/projects/{project_id}/content:deidentify",
                self.endpoint
            ))
            .bearer_auth(token)
            .json(&deidentify_request(content, info_types))
            .send()
            .await?;
        let body = check_status(response, "DLP deidentify")
            .await?
            .json::<Value>()
            .await?;

        body["item"]["value"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid DLP response: missing item.value"))
    }
}
