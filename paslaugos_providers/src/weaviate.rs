//! Weaviate REST client used by the bulk loader.

use async_trait::async_trait;
use paslaugos_core::{CollectionSchema, DocumentStore};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::{check_status, http_client};

pub struct WeaviateStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    openai_key: Option<String>,
    vectorizer: String,
}

impl WeaviateStore {
    pub fn new(base_url: &str, vectorizer: String, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            openai_key: None,
            vectorizer,
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Key forwarded to the `text2vec-openai` vectorizer module.
    #[must_use]
    pub fn with_openai_key(mut self, key: Option<String>) -> Self {
        self.openai_key = key.filter(|k| !k.is_empty());
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        match &self.openai_key {
            Some(key) => request.header("X-OpenAI-Api-Key", key),
            None => request,
        }
    }
}

pub(crate) fn class_definition(schema: &CollectionSchema, vectorizer: &str) -> Value {
    let properties: Vec<Value> = schema
        .properties
        .iter()
        .map(|p| json!({"name": p.name, "dataType": [p.kind.as_str()]}))
        .collect();
    json!({
        "class": schema.name,
        "vectorizer": vectorizer,
        "properties": properties,
    })
}

#[async_trait]
impl DocumentStore for WeaviateStore {
    async fn collection_exists(&self, name: &str) -> anyhow::Result<bool> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/v1/schema/{name}", self.base_url)),
            )
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response, "Schema lookup").await?;
        Ok(true)
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> anyhow::Result<()> {
        info!("Creating Weaviate class {}", schema.name);
        let body = class_definition(schema, &self.vectorizer);
        let response = self
            .authorize(self.client.post(format!("{}/v1/schema", self.base_url)))
            .json(&body)
            .send()
            .await?;
        check_status(response, "Schema create").await?;
        Ok(())
    }

    async fn create_object(
        &self,
        collection: &str,
        properties: &Map<String, Value>,
    ) -> anyhow::Result<Option<String>> {
        let response = self
            .authorize(self.client.post(format!("{}/v1/objects", self.base_url)))
            .json(&json!({"class": collection, "properties": properties}))
            .send()
            .await?;
        let created = check_status(response, "Object create")
            .await?
            .json::<Value>()
            .await?;
        let id = created["id"].as_str().map(str::to_string);
        debug!("Created object {:?} in {collection}", id);
        Ok(id)
    }
}
