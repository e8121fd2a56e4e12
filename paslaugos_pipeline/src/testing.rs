//! In-process fakes shared by the unit tests.

use async_trait::async_trait;
use paslaugos_core::{ChatMessage, Completion, CompletionProvider, Record};
use std::sync::Mutex;

type Call = (String, Vec<ChatMessage>);

pub struct FakeCompletion {
    reply: Option<String>,
    fail_when: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            fail_when: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            fail_when: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails only when the user prompt contains `needle`.
    pub fn failing_for(needle: &str) -> Self {
        Self {
            reply: Some("enriched".to_string()),
            fail_when: Some(needle.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeCompletion {
    async fn complete(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<Completion> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));

        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        if let Some(needle) = &self.fail_when {
            if prompt.contains(needle.as_str()) {
                anyhow::bail!("rate limited");
            }
        }
        match &self.reply {
            Some(reply) => Ok(Completion {
                content: reply.clone(),
                usage: None,
            }),
            None => anyhow::bail!("connection refused"),
        }
    }

    fn get_default_model(&self) -> &'static str {
        "fake"
    }
}

pub fn record(popularity: u64, id: &str) -> Record {
    let description = format!("Description of {id}");
    Record {
        id: id.to_string(),
        short_name: "Clinic".to_string(),
        long_name: id.to_string(),
        description: description.clone(),
        short_description: String::new(),
        keywords: String::new(),
        categories: String::new(),
        life_events: String::new(),
        provider_names: "VCC".to_string(),
        popularity,
        combined_name: format!("Clinic {id} VCC"),
        enriched_description: description,
    }
}

pub fn temp_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("paslaugos_{tag}_{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
