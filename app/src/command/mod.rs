//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a separate zero-sized strategy with its own input type,
//! dispatched statically from `main`.

use paslaugos_config::Config;
use paslaugos_core::Record;
use paslaugos_pipeline::{EnrichmentSettings, load_records};
use paslaugos_providers::OpenAiProvider;
use std::path::PathBuf;
use tracing::info;

mod batch;
mod enrich;
mod info;
mod init;
mod mask;
mod parse;
mod upload;
mod version;
mod view;

pub use batch::{BatchInput, BatchStrategy};
pub use enrich::{EnrichInput, EnrichStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use mask::{MaskInput, MaskStrategy};
pub use parse::{ParseInput, ParseStrategy};
pub use upload::{UploadInput, UploadStrategy};
pub use version::VersionStrategy;
pub use view::{ViewInput, ViewStrategy};

/// Core trait defining the contract for all command strategies.
///
/// Each strategy declares its own input type, so `main` passes parsed
/// arguments without boxing or casting.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Load and normalize the catalogue from `path` or `input.csv_path`.
fn load_catalogue(config: &Config, path: Option<PathBuf>) -> anyhow::Result<Vec<Record>> {
    let path = path.unwrap_or_else(|| config.input.csv_path.clone());
    info!("Loading records from {}", path.display());
    let records = load_records(&path)?;
    info!("Loaded {} records", records.len());
    Ok(records)
}

fn completion_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let openai = &config.providers.openai;
    if openai.api_key.trim().is_empty() {
        anyhow::bail!("OpenAI API key is not set (providers.openai.api_key or OPENAI_API_KEY)");
    }
    Ok(OpenAiProvider::new(openai.api_key.clone(), openai.timeout_secs)?
        .with_base_url(openai.base_url.clone()))
}

fn enrichment_settings(config: &Config, model: Option<String>) -> EnrichmentSettings {
    EnrichmentSettings {
        model: model.unwrap_or_else(|| config.enrichment.model.clone()),
        system_prompt: config.enrichment.system_prompt.clone(),
        output_language: config.enrichment.output_language.clone(),
    }
}

/// `abcd...wxyz` for long secrets, `***` otherwise.
fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        "(not set)".to_string()
    } else if secret.chars().count() > 8 {
        let chars: Vec<char> = secret.chars().collect();
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
