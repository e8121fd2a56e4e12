use paslaugos_config::Config;
use paslaugos_pipeline::{
    BatchEvent, BatchOptions, BatchRunner, Checkpoint, CheckpointFile, Enricher, OutputWriter,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BatchInput {
    pub path: Option<PathBuf>,
    pub start_index: Option<usize>,
    pub resume: bool,
    pub output_dir: Option<PathBuf>,
    pub model: Option<String>,
}

/// Runs the enrichment batch and keeps the checkpoint file current.
#[derive(Debug, Clone, Copy)]
pub struct BatchStrategy;

impl super::CommandStrategy for BatchStrategy {
    type Input = BatchInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let input_path = input
            .path
            .unwrap_or_else(|| config.input.csv_path.clone());
        let output_dir = input
            .output_dir
            .unwrap_or_else(|| config.batch.output_dir.clone());
        let mut records = super::load_catalogue(&config, Some(input_path.clone()))?;

        let checkpoint = CheckpointFile::new(&config.batch.checkpoint_path);
        let start_index = if input.resume {
            match checkpoint.load()? {
                Some(saved) => {
                    if !saved.matches_run(&input_path, &output_dir) {
                        anyhow::bail!(
                            "Checkpoint {} belongs to another run (input {}, output {}); \
                             use --start-index instead of --resume",
                            checkpoint.path().display(),
                            saved
                                .input
                                .as_deref()
                                .map_or_else(|| "?".into(), |p| p.display().to_string()),
                            saved
                                .output_dir
                                .as_deref()
                                .map_or_else(|| "?".into(), |p| p.display().to_string()),
                        );
                    }
                    info!(
                        "Resuming at record {} (last completed {}, failed {:?}, saved {})",
                        saved.resume_index(),
                        saved.last_completed_index,
                        saved.failed_indices,
                        saved.updated_at
                    );
                    saved.resume_index()
                }
                None => {
                    info!("No checkpoint at {}, starting from 0", checkpoint.path().display());
                    0
                }
            }
        } else {
            input.start_index.unwrap_or(0)
        };

        let enricher = Enricher::new(
            super::completion_provider(&config)?,
            super::enrichment_settings(&config, input.model),
        );
        let writer = OutputWriter::new(&output_dir);
        let every = config.batch.checkpoint_every;
        let mut failed = Vec::new();

        let outcome = BatchRunner::new(&enricher, &writer)
            .run(&mut records, BatchOptions { start_index }, |event| match event {
                BatchEvent::Started { start_index, total } => {
                    println!("Enriching {total} records starting at row {start_index}");
                }
                BatchEvent::EnrichmentSkipped { index, id, error } => {
                    println!("  [{index}] {id}: enrichment skipped ({error})");
                }
                BatchEvent::Written { index, id, path } => {
                    println!("  [{index}] {id} -> {}", path.display());
                }
                BatchEvent::WriteFailed { index, id, error } => {
                    failed.push(index);
                    println!("  [{index}] {id}: not saved ({error})");
                }
                BatchEvent::Progress(progress) => {
                    if let (true, Some(last)) = (
                        progress.checkpoint_due(every),
                        progress.last_completed_index,
                    ) {
                        let saved = Checkpoint::new(last)
                            .with_failed(&failed)
                            .for_run(&input_path, &output_dir);
                        if let Err(e) = checkpoint.save(&saved) {
                            warn!("Failed to save checkpoint: {e}");
                        }
                    }
                    println!(
                        "Processed {}/{} records (last completed: {})",
                        progress.processed,
                        progress.total,
                        progress
                            .last_completed_index
                            .map_or_else(|| "none".to_string(), |i| i.to_string())
                    );
                }
                BatchEvent::Completed(_) => {}
            })
            .await?;

        if let Some(saved) = Checkpoint::from_outcome(&outcome) {
            checkpoint.save(&saved.for_run(&input_path, &output_dir))?;
            info!("Checkpoint saved to {}", checkpoint.path().display());
        }

        println!();
        println!(
            "Done: {} written, {} kept their original description, {} failed to save",
            outcome.written,
            outcome.enrichment_failures.len(),
            outcome.failed_indices.len()
        );
        if outcome.is_complete() {
            println!("All records processed");
        } else {
            if !outcome.failed_indices.is_empty() {
                println!("Rows not saved: {:?}", outcome.failed_indices);
            }
            println!(
                "Rerun with --resume (or --start-index {}) to continue",
                outcome.resume_index()
            );
        }
        Ok(())
    }
}
