use paslaugos_config::Config;
use paslaugos_pipeline::CheckpointFile;
use tracing::info;

use super::{mask_secret, truncate};

/// Prints the effective configuration with secrets masked, plus the saved
/// batch checkpoint if there is one.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== paslaugos Configuration ===\n");

        println!("Input:");
        println!("  CSV: {}", config.input.csv_path.display());
        println!();

        println!("Enrichment:");
        println!("  Model: {}", config.enrichment.model);
        println!("  Output Language: {}", config.enrichment.output_language);
        println!(
            "  System Prompt: {}",
            truncate(&config.enrichment.system_prompt, 60)
        );
        println!();

        println!("Batch:");
        println!("  Output Dir: {}", config.batch.output_dir.display());
        println!("  Checkpoint: {}", config.batch.checkpoint_path.display());
        println!("  Checkpoint Every: {}", config.batch.checkpoint_every);
        let checkpoint = CheckpointFile::new(&config.batch.checkpoint_path);
        match checkpoint.load() {
            Ok(Some(saved)) => {
                println!(
                    "  Last Completed: {} (resume at {}, saved {})",
                    saved.last_completed_index,
                    saved.resume_index(),
                    saved.updated_at.to_rfc3339()
                );
                if !saved.failed_indices.is_empty() {
                    println!("  Not Saved: {:?}", saved.failed_indices);
                }
                if let Some(input) = &saved.input {
                    println!("  Checkpoint Input: {}", input.display());
                }
            }
            Ok(None) => println!("  Last Completed: (none)"),
            Err(e) => {
                info!("Checkpoint unreadable: {e}");
                println!("  Last Completed: (unreadable: {e})");
            }
        }
        println!();

        println!("Parsing:");
        println!("  Poll Interval: {}s", config.parsing.poll_interval_secs);
        match config.parsing.max_attempts {
            Some(max) => println!("  Max Attempts: {max}"),
            None => println!("  Max Attempts: unbounded"),
        }
        println!();

        let providers = &config.providers;
        println!("Providers:");
        println!("  OpenAI:");
        println!("    API Key: {}", mask_secret(&providers.openai.api_key));
        println!("    Base URL: {}", providers.openai.base_url);
        println!("  Weaviate:");
        println!("    URL: {}", providers.weaviate.url);
        println!(
            "    API Key: {}",
            mask_secret(providers.weaviate.api_key.as_deref().unwrap_or_default())
        );
        println!("    Collection: {}", providers.weaviate.collection);
        println!("    Vectorizer: {}", providers.weaviate.vectorizer);
        println!("  LlamaParse:");
        println!("    API Key: {}", mask_secret(&providers.llama_parse.api_key));
        println!("    Base URL: {}", providers.llama_parse.base_url);
        println!("    Language: {}", providers.llama_parse.language);
        println!("  Google Cloud:");
        match &providers.gcp.credentials_path {
            Some(path) => println!("    Credentials: {}", path.display()),
            None => println!("    Credentials: (not set)"),
        }
        println!("    Project: {}", or_unset(&providers.gcp.project_id));
        println!("    Bucket: {}", or_unset(&providers.gcp.bucket));

        Ok(())
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}
