use anyhow::Context;
use paslaugos_config::Config;
use paslaugos_core::JobState;
use paslaugos_pipeline::parse::upload_from_file;
use paslaugos_pipeline::{PollPolicy, parse_document, validate_fields};
use paslaugos_providers::LlamaParseClient;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ParseInput {
    pub file: PathBuf,
    pub expect: Option<PathBuf>,
}

/// Sends a document to LlamaParse, waits for the job and prints the fields.
#[derive(Debug, Clone, Copy)]
pub struct ParseStrategy;

impl super::CommandStrategy for ParseStrategy {
    type Input = ParseInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let llama = &config.providers.llama_parse;
        if llama.api_key.trim().is_empty() {
            anyhow::bail!(
                "LlamaParse API key is not set (providers.llama_parse.api_key or LLAMA_CLOUD_API_KEY)"
            );
        }

        // read before anything goes over the wire
        let expected = input.expect.as_deref().map(read_expected).transpose()?;
        let upload = upload_from_file(&input.file)?;

        let parser = LlamaParseClient::new(
            llama.api_key.clone(),
            &llama.base_url,
            llama.language.clone(),
            llama.parsing_instruction.clone(),
            llama.timeout_secs,
        )?;
        let policy = PollPolicy {
            interval: Duration::from_secs(config.parsing.poll_interval_secs),
            max_attempts: config.parsing.max_attempts,
        };

        let fields = parse_document(&parser, &upload, policy, |state| match state {
            JobState::Pending => println!("Job pending..."),
            JobState::Running => println!("Job running..."),
            JobState::Succeeded => println!("Job finished"),
            JobState::Failed(reason) => println!("Job failed: {reason}"),
        })
        .await?;

        println!("\n--- Extracted fields ---");
        println!("{}", serde_json::to_string_pretty(&fields)?);

        if let Some(expected) = expected {
            let checks = validate_fields(&fields, &expected);
            let mismatches = checks.iter().filter(|c| !c.matches).count();
            println!("\n--- Validation ---");
            for check in &checks {
                let actual = check
                    .actual
                    .as_ref()
                    .map_or_else(|| "(missing)".to_string(), Value::to_string);
                let mark = if check.matches { "ok" } else { "MISMATCH" };
                println!(
                    "  {mark:<8} {}: expected {}, got {actual}",
                    check.field, check.expected
                );
            }
            println!(
                "\n{} of {} fields match",
                checks.len() - mismatches,
                checks.len()
            );
        }
        Ok(())
    }
}

fn read_expected(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}
