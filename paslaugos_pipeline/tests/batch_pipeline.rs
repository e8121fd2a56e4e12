//! End-to-end tests for the batch enrichment pipeline.
//!
//! These tests verify that:
//! - A CSV loads, enriches and persists one file per identifier
//! - Resuming from a checkpoint only touches the remaining records
//! - A row that failed to write is picked up again on resume
//! - The bulk loader resubmits everything on every run (no de-duplication)

use async_trait::async_trait;
use paslaugos_core::{
    ChatMessage, CollectionSchema, Completion, CompletionProvider, DocumentStore, Record,
};
use paslaugos_pipeline::{
    BatchEvent, BatchOptions, BatchRunner, BulkLoader, Checkpoint, CheckpointFile, Enricher,
    EnrichmentSettings, OutputWriter, read_records,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const CSV: &str = "\
ID,LONG_NAME,SHORT_NAME,DESCRIPTION,SHORT_DESCRIPTION,KEYWORDS,CATEGORIES,LIFE_EVENTS,PROVIDER_NAMES,POPULARITY
42,Vilnius City Clinic,,Family doctor services,,gydytojas,Sveikata,Liga,VCC,15
43,Registrų centras,https://example.gov.lt,Registry services,,registras,Turtas,,RC,
44,Migracijos departamentas,,Residence permits,,leidimas,Migracija,Atvykimas,MD,inf
45,Sodra,,Social insurance,,pensija,Socialinė apsauga,Pensija,Sodra,3.7
";

/// Replies with a fixed text, except for prompts naming `fail_for`.
struct ScriptedModel {
    fail_for: Option<&'static str>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    const fn new(fail_for: Option<&'static str>) -> Self {
        Self {
            fail_for,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage], _model: &str) -> anyhow::Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &messages[1].content;
        if self.fail_for.is_some_and(|needle| prompt.contains(needle)) {
            anyhow::bail!("503 service unavailable");
        }
        Ok(Completion {
            content: "Išsamus aprašymas.".to_string(),
            usage: None,
        })
    }

    fn get_default_model(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct RecordingStore {
    created: Mutex<bool>,
    objects: Mutex<Vec<Map<String, Value>>>,
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn collection_exists(&self, _name: &str) -> anyhow::Result<bool> {
        Ok(*self.created.lock().unwrap())
    }

    async fn create_collection(&self, _schema: &CollectionSchema) -> anyhow::Result<()> {
        *self.created.lock().unwrap() = true;
        Ok(())
    }

    async fn create_object(
        &self,
        _collection: &str,
        properties: &Map<String, Value>,
    ) -> anyhow::Result<Option<String>> {
        self.objects.lock().unwrap().push(properties.clone());
        Ok(None)
    }
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("paslaugos_it_{tag}_{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn read_unit(dir: &Path, id: &str) -> Record {
    let bytes = std::fs::read(dir.join(Record::file_name_for(id))).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_full_run_writes_one_unit_per_record() {
    let dir = temp_dir("full");
    let mut records = read_records(CSV.as_bytes()).unwrap();
    assert_eq!(records[1].description, "Registry services URL: https://example.gov.lt");
    assert_eq!(records[2].popularity, 10_000_000_000);
    assert_eq!(records[3].popularity, 3);

    let enricher = Enricher::new(ScriptedModel::new(None), EnrichmentSettings::default());
    let writer = OutputWriter::new(&dir);

    let mut progress = Vec::new();
    let outcome = BatchRunner::new(&enricher, &writer)
        .run(&mut records, BatchOptions::default(), |event| {
            if let BatchEvent::Progress(p) = event {
                progress.push((p.processed, p.total, p.last_completed_index));
            }
        })
        .await
        .unwrap();

    assert_eq!(
        progress,
        vec![(1, 4, Some(0)), (2, 4, Some(1)), (3, 4, Some(2)), (4, 4, Some(3))]
    );
    assert_eq!(outcome.last_completed_index, Some(3));
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 4);

    let unit = read_unit(&dir, "42");
    assert_eq!(unit.combined_name, "Vilnius City Clinic VCC");
    assert_eq!(
        unit.enriched_description,
        "Family doctor services Išsamus aprašymas."
    );
    assert_eq!(unit.description, "Family doctor services");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_enrichment_failure_keeps_original_description() {
    let dir = temp_dir("enrich_fail");
    let mut records = read_records(CSV.as_bytes()).unwrap();
    let enricher = Enricher::new(
        ScriptedModel::new(Some("Sodra")),
        EnrichmentSettings::default(),
    );
    let writer = OutputWriter::new(&dir);

    let outcome = BatchRunner::new(&enricher, &writer)
        .run(&mut records, BatchOptions::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(outcome.enrichment_failures, vec![3]);
    assert_eq!(outcome.written, 4);
    let unit = read_unit(&dir, "45");
    assert_eq!(unit.enriched_description, "Social insurance");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_resume_only_processes_remaining_records() {
    let dir = temp_dir("resume");
    let checkpoint = CheckpointFile::new(dir.join("state").join("checkpoint.json"));
    let out = dir.join("out");
    let writer = OutputWriter::new(&out);

    // first run stops after two records
    let mut records = read_records(CSV.as_bytes()).unwrap();
    let enricher = Enricher::new(ScriptedModel::new(None), EnrichmentSettings::default());
    let first = BatchRunner::new(&enricher, &writer)
        .run(&mut records[..2], BatchOptions::default(), |_| {})
        .await
        .unwrap();
    checkpoint
        .save(&Checkpoint::from_outcome(&first).unwrap())
        .unwrap();
    let before = std::fs::metadata(out.join("42.json")).unwrap().modified().unwrap();

    let resume_at = checkpoint.load().unwrap().unwrap().resume_index();
    assert_eq!(resume_at, 2);

    let mut records = read_records(CSV.as_bytes()).unwrap();
    let enricher = Enricher::new(ScriptedModel::new(None), EnrichmentSettings::default());
    let mut written = Vec::new();
    let second = BatchRunner::new(&enricher, &writer)
        .run(&mut records, BatchOptions { start_index: resume_at }, |event| {
            if let BatchEvent::Written { index, .. } = event {
                written.push(index);
            }
        })
        .await
        .unwrap();

    assert_eq!(written, vec![2, 3]);
    assert_eq!(enricher.provider().calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.last_completed_index, Some(3));
    assert!(second.is_complete());
    let after = std::fs::metadata(out.join("42.json")).unwrap().modified().unwrap();
    assert_eq!(before, after);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_resume_retries_row_that_failed_to_write() {
    let dir = temp_dir("resume_failed");
    let checkpoint = CheckpointFile::new(dir.join("checkpoint.json"));
    let csv = Path::new("services.csv");
    let out = dir.join("out");
    let writer = OutputWriter::new(&out);
    std::fs::create_dir_all(&out).unwrap();
    // a directory in place of 43.json makes that write fail
    let blocker = out.join(Record::file_name_for("43"));
    std::fs::create_dir(&blocker).unwrap();

    let mut records = read_records(CSV.as_bytes()).unwrap();
    let enricher = Enricher::new(ScriptedModel::new(None), EnrichmentSettings::default());
    let first = BatchRunner::new(&enricher, &writer)
        .run(&mut records, BatchOptions::default(), |_| {})
        .await
        .unwrap();
    assert_eq!(first.failed_indices, vec![1]);
    assert_eq!(first.last_completed_index, Some(3));
    checkpoint
        .save(&Checkpoint::from_outcome(&first).unwrap().for_run(csv, &out))
        .unwrap();

    std::fs::remove_dir(&blocker).unwrap();
    let saved = checkpoint.load().unwrap().unwrap();
    assert!(saved.matches_run(csv, &out));
    assert!(!saved.matches_run(Path::new("other.csv"), &out));
    assert_eq!(saved.resume_index(), 1);

    let mut records = read_records(CSV.as_bytes()).unwrap();
    let second = BatchRunner::new(&enricher, &writer)
        .run(
            &mut records,
            BatchOptions {
                start_index: saved.resume_index(),
            },
            |_| {},
        )
        .await
        .unwrap();

    assert!(second.is_complete());
    assert_eq!(read_unit(&out, "43").id, "43");
    checkpoint
        .save(&Checkpoint::from_outcome(&second).unwrap().for_run(csv, &out))
        .unwrap();
    assert_eq!(checkpoint.load().unwrap().unwrap().resume_index(), 4);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_bulk_loader_is_not_idempotent() {
    let dir = temp_dir("bulk_twice");
    let mut records = read_records(CSV.as_bytes()).unwrap();
    let enricher = Enricher::new(ScriptedModel::new(None), EnrichmentSettings::default());
    let writer = OutputWriter::new(&dir);
    BatchRunner::new(&enricher, &writer)
        .run(&mut records, BatchOptions::default(), |_| {})
        .await
        .unwrap();

    let loader = BulkLoader::new(RecordingStore::default(), "Service");
    let first = loader.load_dir(&dir, |_| {}).await.unwrap();
    let second = loader.load_dir(&dir, |_| {}).await.unwrap();

    assert!(first.schema_created);
    assert!(!second.schema_created);
    assert_eq!(first.submitted, 4);
    // documented behavior: the same units are submitted again
    assert_eq!(second.submitted, first.submitted);
    assert_eq!(loader.store().objects.lock().unwrap().len(), 8);

    let objects = loader.store().objects.lock().unwrap();
    let clinic = objects
        .iter()
        .find(|o| o["serviceId"] == "42")
        .unwrap();
    assert_eq!(clinic["popularity"], 15);
    assert_eq!(clinic["combinedName"], "Vilnius City Clinic VCC");

    let _ = std::fs::remove_dir_all(&dir);
}
