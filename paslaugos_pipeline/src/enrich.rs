//! Enrichment stage: one completion request per record.

use paslaugos_core::{ChatMessage, CompletionProvider, EnrichmentError, Record};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub model: String,
    pub system_prompt: String,
    pub output_language: String,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4-1106-preview".to_string(),
            system_prompt: "You are a helpful assistant that specializes in describing \
                            Lithuanian public services."
                .to_string(),
            output_language: "Lithuanian".to_string(),
        }
    }
}

/// Completion text returned for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedText(pub String);

impl EnrichedText {
    /// `description + " " + completion`
    #[must_use]
    pub fn apply(&self, description: &str) -> String {
        format!("{description} {}", self.0)
    }
}

pub struct Enricher<P> {
    provider: P,
    settings: EnrichmentSettings,
}

impl<P> Enricher<P>
where
    P: CompletionProvider,
{
    pub const fn new(provider: P, settings: EnrichmentSettings) -> Self {
        Self { provider, settings }
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub const fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    #[must_use]
    pub fn prompt(&self, record: &Record) -> String {
        build_prompt(record, &self.settings.output_language)
    }

    /// Request a completion for the record. Callers decide the fallback.
    pub async fn enrich(&self, record: &Record) -> Result<EnrichedText, EnrichmentError> {
        let messages = [
            ChatMessage::system(self.settings.system_prompt.clone()),
            ChatMessage::user(self.prompt(record)),
        ];

        let model = if self.settings.model.is_empty() {
            self.provider.get_default_model()
        } else {
            &self.settings.model
        };
        let completion = self
            .provider
            .complete(&messages, model)
            .await
            .map_err(EnrichmentError::Provider)?;

        let text = completion.content.trim();
        if text.is_empty() {
            return Err(EnrichmentError::EmptyCompletion);
        }
        info!("Enriched record {} ({} chars)", record.id, text.len());
        Ok(EnrichedText(text.to_string()))
    }

    /// Best-effort variant: the unmodified description on failure, plus the error.
    pub async fn enrich_or_keep(&self, record: &Record) -> (String, Option<EnrichmentError>) {
        match self.enrich(record).await {
            Ok(text) => (text.apply(&record.description), None),
            Err(e) => {
                warn!("Enrichment skipped for record {}: {e}", record.id);
                (record.description.clone(), Some(e))
            }
        }
    }
}

#[must_use]
pub fn build_prompt(record: &Record, output_language: &str) -> String {
    format!(
        "Given the following information about a Lithuanian public service provider, please \
         specify and enrich which services the provider is offering:\n\
         \n\
         Service Name: {}\n\
         Current Description: {}\n\
         Categories: {}\n\
         Life Events: {}\n\
         Keywords: {}\n\
         \n\
         Please provide a detailed description of the services offered, expanding on the current \
         description and incorporating relevant information from the categories, life events, and \
         keywords. Return results translated into {output_language} language.",
        record.combined_name,
        record.description,
        record.categories,
        record.life_events,
        record.keywords,
    )
}
