//! Optional on-disk form of the batch checkpoint.
//!
//! The batch loop only threads the index through its arguments and result;
//! callers that want to resume after a restart keep it here.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::batch::BatchOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_completed_index: usize,
    /// Rows whose output file could not be written. Resuming starts at the
    /// lowest of them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_indices: Vec<usize>,
    /// CSV the indices refer to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    #[must_use]
    pub fn new(last_completed_index: usize) -> Self {
        Self {
            last_completed_index,
            failed_indices: Vec::new(),
            input: None,
            output_dir: None,
            updated_at: Utc::now(),
        }
    }

    /// `None` when the run neither wrote nor failed to write anything.
    #[must_use]
    pub fn from_outcome(outcome: &BatchOutcome) -> Option<Self> {
        let last = match (outcome.last_completed_index, outcome.failed_indices.first()) {
            (Some(last), _) => last,
            (None, Some(_)) => outcome.start_index.checked_sub(1)?,
            (None, None) => return None,
        };
        Some(Self::new(last).with_failed(&outcome.failed_indices))
    }

    #[must_use]
    pub fn with_failed(mut self, failed_indices: &[usize]) -> Self {
        self.failed_indices = failed_indices.to_vec();
        self.failed_indices.sort_unstable();
        self.failed_indices.dedup();
        self
    }

    #[must_use]
    pub fn for_run(mut self, input: &Path, output_dir: &Path) -> Self {
        self.input = Some(input.to_path_buf());
        self.output_dir = Some(output_dir.to_path_buf());
        self
    }

    /// First row a follow-up run has to process.
    #[must_use]
    pub fn resume_index(&self) -> usize {
        self.failed_indices
            .iter()
            .min()
            .copied()
            .unwrap_or(self.last_completed_index + 1)
    }

    /// Whether the checkpoint was taken for this input and output directory.
    /// Checkpoints saved without paths match any run.
    #[must_use]
    pub fn matches_run(&self, input: &Path, output_dir: &Path) -> bool {
        self.input.as_deref().is_none_or(|saved| saved == input)
            && self
                .output_dir
                .as_deref()
                .is_none_or(|saved| saved == output_dir)
    }
}

#[derive(Debug, Clone)]
pub struct CheckpointFile {
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no checkpoint has been saved yet.
    pub fn load(&self) -> anyhow::Result<Option<Checkpoint>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading checkpoint {}", self.path.display()));
            }
        };
        let checkpoint = serde_json::from_str(&content)
            .with_context(|| format!("parsing checkpoint {}", self.path.display()))?;
        Ok(Some(checkpoint))
    }

    pub fn save(&self, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(checkpoint)?)
            .with_context(|| format!("writing checkpoint {}", self.path.display()))?;
        debug!(
            "Checkpoint saved at index {} (resume at {})",
            checkpoint.last_completed_index,
            checkpoint.resume_index()
        );
        Ok(())
    }
}
