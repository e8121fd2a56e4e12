//! Checkpointed batch enrichment: enrich, write one JSON file per record,
//! advance the checkpoint.

use paslaugos_core::{CompletionProvider, EnrichmentError, PersistenceError, Record};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::enrich::Enricher;

/// Writes Persisted Output Units into one directory, keyed by record id.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, record: &Record) -> PathBuf {
        self.dir.join(record.file_name())
    }

    pub fn ensure_dir(&self) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Write the record, replacing any earlier file for the same id.
    pub fn write(&self, record: &Record) -> Result<PathBuf, PersistenceError> {
        let json =
            serde_json::to_vec_pretty(record).map_err(|source| PersistenceError::Serialize {
                id: record.id.clone(),
                source,
            })?;

        let path = self.path_for(record);
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|source| {
                let _ = std::fs::remove_file(&tmp);
                PersistenceError::Write {
                    path: path.clone(),
                    source,
                }
            })?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub start_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Records handled in this run so far.
    pub processed: usize,
    /// Records this run has to handle.
    pub total: usize,
    pub last_completed_index: Option<usize>,
}

impl BatchProgress {
    /// Whether a checkpoint should be flushed after this step when saving
    /// every `every` records. `0` disables periodic saves.
    #[must_use]
    pub const fn checkpoint_due(&self, every: usize) -> bool {
        every > 0 && self.processed % every == 0 && self.last_completed_index.is_some()
    }
}

/// Observable steps of a batch run.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    Started {
        start_index: usize,
        total: usize,
    },
    EnrichmentSkipped {
        index: usize,
        id: &'a str,
        error: &'a EnrichmentError,
    },
    Written {
        index: usize,
        id: &'a str,
        path: &'a Path,
    },
    WriteFailed {
        index: usize,
        id: &'a str,
        error: &'a PersistenceError,
    },
    Progress(BatchProgress),
    Completed(&'a BatchOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub start_index: usize,
    pub total_records: usize,
    /// Checkpoint: last index whose output file was written.
    pub last_completed_index: Option<usize>,
    pub written: usize,
    pub enrichment_failures: Vec<usize>,
    pub failed_indices: Vec<usize>,
}

impl BatchOutcome {
    /// `start_index` for a follow-up run: the first row that failed to
    /// write, otherwise the row after the last completed one.
    #[must_use]
    pub fn resume_index(&self) -> usize {
        self.failed_indices.iter().min().copied().unwrap_or_else(|| {
            self.last_completed_index
                .map_or(self.start_index, |i| i + 1)
                .max(self.start_index)
        })
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_indices.is_empty() && self.resume_index() >= self.total_records
    }
}

pub struct BatchRunner<'a, P> {
    enricher: &'a Enricher<P>,
    writer: &'a OutputWriter,
}

impl<'a, P> BatchRunner<'a, P>
where
    P: CompletionProvider,
{
    pub const fn new(enricher: &'a Enricher<P>, writer: &'a OutputWriter) -> Self {
        Self { enricher, writer }
    }

    /// Process `records[start_index..]` one at a time.
    ///
    /// Enrichment failures fall back to the original description. Write
    /// failures leave the checkpoint where it was and the loop moves on. Only
    /// an unusable output directory aborts the run.
    pub async fn run<F>(
        &self,
        records: &mut [Record],
        options: BatchOptions,
        mut on_event: F,
    ) -> Result<BatchOutcome, PersistenceError>
    where
        F: FnMut(BatchEvent<'_>),
    {
        let start_index = options.start_index;
        let total = records.len().saturating_sub(start_index);
        let mut outcome = BatchOutcome {
            start_index,
            total_records: records.len(),
            last_completed_index: None,
            written: 0,
            enrichment_failures: Vec::new(),
            failed_indices: Vec::new(),
        };

        if total == 0 {
            info!(
                "Nothing to enrich: start index {start_index} is past the last record ({})",
                records.len()
            );
            on_event(BatchEvent::Completed(&outcome));
            return Ok(outcome);
        }

        self.writer.ensure_dir()?;
        info!(
            "Enriching records {start_index}..{} into {}",
            records.len(),
            self.writer.dir().display()
        );
        on_event(BatchEvent::Started { start_index, total });

        for (offset, record) in records[start_index..].iter_mut().enumerate() {
            let index = start_index + offset;

            match self.enricher.enrich(record).await {
                Ok(text) => record.enriched_description = text.apply(&record.description),
                Err(error) => {
                    warn!("Record {index} ({}): enrichment skipped: {error}", record.id);
                    record.enriched_description.clone_from(&record.description);
                    outcome.enrichment_failures.push(index);
                    on_event(BatchEvent::EnrichmentSkipped {
                        index,
                        id: &record.id,
                        error: &error,
                    });
                }
            }

            match self.writer.write(record) {
                Ok(path) => {
                    outcome.written += 1;
                    outcome.last_completed_index = Some(index);
                    on_event(BatchEvent::Written {
                        index,
                        id: &record.id,
                        path: &path,
                    });
                }
                Err(error) => {
                    warn!("Record {index} ({}): {error}", record.id);
                    outcome.failed_indices.push(index);
                    on_event(BatchEvent::WriteFailed {
                        index,
                        id: &record.id,
                        error: &error,
                    });
                }
            }

            on_event(BatchEvent::Progress(BatchProgress {
                processed: offset + 1,
                total,
                last_completed_index: outcome.last_completed_index,
            }));
        }

        info!(
            "Batch finished: {} written, {} enrichment failures, {} write failures",
            outcome.written,
            outcome.enrichment_failures.len(),
            outcome.failed_indices.len()
        );
        on_event(BatchEvent::Completed(&outcome));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::EnrichmentSettings;
    use crate::testing::{FakeCompletion, record, temp_dir};

    fn records(n: usize) -> Vec<Record> {
        (0..n).map(|i| record(0, &format!("id-{i}"))).collect()
    }

    #[tokio::test]
    async fn test_checkpoint_advances_monotonically() {
        let dir = temp_dir("batch_mono");
        let enricher = Enricher::new(FakeCompletion::replying("ok"), EnrichmentSettings::default());
        let writer = OutputWriter::new(&dir);
        let mut recs = records(4);

        let mut checkpoints = Vec::new();
        let outcome = BatchRunner::new(&enricher, &writer)
            .run(&mut recs, BatchOptions::default(), |event| {
                if let BatchEvent::Progress(p) = event {
                    checkpoints.push(p.last_completed_index);
                }
            })
            .await
            .unwrap();

        assert_eq!(checkpoints, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(outcome.last_completed_index, Some(3));
        assert_eq!(outcome.written, 4);
        assert!(outcome.is_complete());
        assert_eq!(recs[2].enriched_description, "Description of id-2 ok");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_start_past_end_is_noop() {
        let dir = temp_dir("batch_noop").join("out");
        let enricher = Enricher::new(FakeCompletion::replying("ok"), EnrichmentSettings::default());
        let writer = OutputWriter::new(&dir);
        let mut recs = records(2);

        let mut completed = false;
        let outcome = BatchRunner::new(&enricher, &writer)
            .run(&mut recs, BatchOptions { start_index: 5 }, |event| {
                completed |= matches!(event, BatchEvent::Completed(_));
            })
            .await
            .unwrap();

        assert!(completed);
        assert_eq!(outcome.written, 0);
        assert_eq!(outcome.last_completed_index, None);
        assert_eq!(outcome.resume_index(), 5);
        assert!(enricher_calls(&enricher).is_empty());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_write_failure_does_not_advance_checkpoint() {
        let dir = temp_dir("batch_fail");
        let enricher = Enricher::new(FakeCompletion::replying("ok"), EnrichmentSettings::default());
        let writer = OutputWriter::new(&dir);
        let mut recs = records(3);
        // a directory where record 1's file should go makes the rename fail
        std::fs::create_dir_all(dir.join(recs[1].file_name())).unwrap();

        let mut progress = Vec::new();
        let outcome = BatchRunner::new(&enricher, &writer)
            .run(&mut recs, BatchOptions::default(), |event| {
                if let BatchEvent::Progress(p) = event {
                    progress.push(p.last_completed_index);
                }
            })
            .await
            .unwrap();

        assert_eq!(progress, vec![Some(0), Some(0), Some(2)]);
        assert_eq!(outcome.failed_indices, vec![1]);
        assert_eq!(outcome.written, 2);
        assert!(!outcome.is_complete());
        assert!(!dir.join("id-1.json.tmp").exists());
        assert_eq!(outcome.resume_index(), 1);
    }

    #[tokio::test]
    async fn test_resume_after_write_failure_persists_failed_row() {
        let dir = temp_dir("batch_fail_resume");
        let enricher = Enricher::new(FakeCompletion::replying("ok"), EnrichmentSettings::default());
        let writer = OutputWriter::new(&dir);
        let mut recs = records(3);
        let blocker = dir.join(recs[1].file_name());
        std::fs::create_dir_all(&blocker).unwrap();

        let first = BatchRunner::new(&enricher, &writer)
            .run(&mut recs, BatchOptions::default(), |_| {})
            .await
            .unwrap();
        assert_eq!(first.last_completed_index, Some(2));
        assert!(!blocker.is_file());

        std::fs::remove_dir(&blocker).unwrap();
        let mut recs = records(3);
        let second = BatchRunner::new(&enricher, &writer)
            .run(
                &mut recs,
                BatchOptions {
                    start_index: first.resume_index(),
                },
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(second.start_index, 1);
        assert_eq!(second.written, 2);
        assert!(blocker.is_file());
        assert!(second.is_complete());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_checkpoint_due_every_n_records() {
        let step = |processed, last| BatchProgress {
            processed,
            total: 25,
            last_completed_index: last,
        };
        assert!(!step(5, Some(4)).checkpoint_due(10));
        assert!(step(10, Some(9)).checkpoint_due(10));
        assert!(step(20, Some(19)).checkpoint_due(10));
        assert!(!step(10, None).checkpoint_due(10));
        assert!(!step(10, Some(9)).checkpoint_due(0));
    }

    #[tokio::test]
    async fn test_single_enrichment_failure_is_reported_by_index() {
        let dir = temp_dir("batch_one_enrich_fail");
        let enricher = Enricher::new(
            FakeCompletion::failing_for("Description of id-1"),
            EnrichmentSettings::default(),
        );
        let writer = OutputWriter::new(&dir);
        let mut recs = records(3);

        let mut skipped = Vec::new();
        let outcome = BatchRunner::new(&enricher, &writer)
            .run(&mut recs, BatchOptions::default(), |event| {
                if let BatchEvent::EnrichmentSkipped { index, .. } = event {
                    skipped.push(index);
                }
            })
            .await
            .unwrap();

        assert_eq!(skipped, vec![1]);
        assert_eq!(outcome.enrichment_failures, vec![1]);
        assert_eq!(recs[0].enriched_description, "Description of id-0 enriched");
        assert_eq!(recs[1].enriched_description, "Description of id-1");
        assert_eq!(recs[2].enriched_description, "Description of id-2 enriched");
        assert!(outcome.is_complete());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_enrichment_failure_still_writes() {
        let dir = temp_dir("batch_enrich_fail");
        let enricher = Enricher::new(FakeCompletion::failing(), EnrichmentSettings::default());
        let writer = OutputWriter::new(&dir);
        let mut recs = records(2);

        let outcome = BatchRunner::new(&enricher, &writer)
            .run(&mut recs, BatchOptions::default(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.enrichment_failures, vec![0, 1]);
        assert_eq!(outcome.written, 2);
        let saved: Record =
            serde_json::from_slice(&std::fs::read(dir.join("id-0.json")).unwrap()).unwrap();
        assert_eq!(saved.enriched_description, saved.description);

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn enricher_calls(enricher: &Enricher<FakeCompletion>) -> Vec<String> {
        enricher
            .provider()
            .calls()
            .into_iter()
            .map(|(model, _)| model)
            .collect()
    }
}
