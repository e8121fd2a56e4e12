use async_trait::async_trait;
use paslaugos_core::{ChatMessage, Completion, CompletionProvider, Usage};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::{check_status, http_client};

/// OpenAI-compatible chat completions client.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, timeout_secs: u64) -> anyhow::Result<Self> {
        info!("Creating OpenAiProvider");
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Pull the completion text and token usage out of a chat completions reply.
pub(crate) fn parse_completion(response: &serde_json::Value) -> anyhow::Result<Completion> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid response format: missing content"))?
        .to_string();

    let usage = response["usage"].as_object().map(|u| {
        let field = |name: &str| {
            u.get(name)
                .and_then(serde_json::Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };
        Usage {
            prompt_tokens: field("prompt_tokens"),
            completion_tokens: field("completion_tokens"),
            total_tokens: field("total_tokens"),
        }
    });

    Ok(Completion { content, usage })
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<Completion> {
        let request = json!({
            "model": model,
            "messages": messages,
        });

        info!("Sending request to OpenAI API: model={}", model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response, "Chat completion")
            .await?
            .json::<serde_json::Value>()
            .await?;

        let completion = parse_completion(&response)?;
        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        info!("Received response from OpenAI API");
        Ok(completion)
    }

    fn get_default_model(&self) -> &'static str {
        "gpt-4-1106-preview"
    }
}
