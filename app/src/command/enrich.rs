use paslaugos_config::Config;
use paslaugos_pipeline::{Enricher, is_url};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct EnrichInput {
    pub row: usize,
    pub path: Option<PathBuf>,
    pub model: Option<String>,
    pub show_prompt: bool,
}

/// Enriches one row and shows the original next to the enriched description.
#[derive(Debug, Clone, Copy)]
pub struct EnrichStrategy;

impl super::CommandStrategy for EnrichStrategy {
    type Input = EnrichInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let records = super::load_catalogue(&config, input.path)?;
        let record = records.get(input.row).ok_or_else(|| {
            anyhow::anyhow!("Row {} out of range (0..{})", input.row, records.len())
        })?;

        let enricher = Enricher::new(
            super::completion_provider(&config)?,
            super::enrichment_settings(&config, input.model),
        );

        println!("Service: {} ({})", record.combined_name, record.id);
        if is_url(&record.short_name) || is_url(&record.long_name) {
            println!("URL detected in the service name, appended to the description");
        }
        if input.show_prompt {
            println!("\n--- Prompt ---\n{}", enricher.prompt(record));
        }

        println!("\n--- Original description ---\n{}", record.description);

        let (enriched, error) = enricher.enrich_or_keep(record).await;
        match error {
            None => {
                println!("\n--- Enriched description ---\n{enriched}");
                println!("\nDescription enriched with {}", enricher.settings().model);
            }
            Some(e) => {
                warn!("Enrichment failed: {e}");
                println!("\nEnrichment failed, description left unchanged: {e}");
            }
        }
        Ok(())
    }
}
