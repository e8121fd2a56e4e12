//! Bulk loader: push every persisted record into the remote document store.
//!
//! Records are submitted as new objects on every run. Nothing is checked
//! against what the store already holds, so running the loader twice over
//! the same directory uploads everything twice.

use paslaugos_core::{CollectionSchema, DocumentStore, Record, UploadError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug)]
pub enum UploadEvent<'a> {
    SchemaCreated(&'a str),
    Submitted { path: &'a Path, id: &'a str },
    Failed { path: &'a Path, error: &'a UploadError },
}

#[derive(Debug, Default)]
pub struct BulkReport {
    pub schema_created: bool,
    pub submitted: usize,
    pub failures: Vec<(PathBuf, UploadError)>,
}

pub struct BulkLoader<S> {
    store: S,
    schema: CollectionSchema,
}

impl<S> BulkLoader<S>
where
    S: DocumentStore,
{
    pub fn new(store: S, collection: impl Into<String>) -> Self {
        Self {
            store,
            schema: CollectionSchema::for_records(collection),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create the collection unless it already exists. Returns whether it was created.
    pub async fn ensure_schema(&self) -> Result<bool, UploadError> {
        let exists = self
            .store
            .collection_exists(&self.schema.name)
            .await
            .map_err(UploadError::Schema)?;
        if exists {
            info!("Collection {} already exists", self.schema.name);
            return Ok(false);
        }
        self.store
            .create_collection(&self.schema)
            .await
            .map_err(UploadError::Schema)?;
        info!("Created collection {}", self.schema.name);
        Ok(true)
    }

    /// Ensure the schema, then submit every `*.json` unit in `dir` in
    /// directory enumeration order. Failing units are reported and skipped.
    pub async fn load_dir<F>(&self, dir: &Path, mut on_event: F) -> Result<BulkReport, UploadError>
    where
        F: FnMut(UploadEvent<'_>),
    {
        let mut report = BulkReport {
            schema_created: self.ensure_schema().await?,
            ..BulkReport::default()
        };
        if report.schema_created {
            on_event(UploadEvent::SchemaCreated(&self.schema.name));
        }

        let units = list_units(dir)?;
        info!("Uploading {} units from {}", units.len(), dir.display());

        for path in units {
            match self.submit_unit(&path).await {
                Ok(id) => {
                    report.submitted += 1;
                    on_event(UploadEvent::Submitted { path: &path, id: &id });
                }
                Err(error) => {
                    warn!("Skipping {}: {error}", path.display());
                    on_event(UploadEvent::Failed {
                        path: &path,
                        error: &error,
                    });
                    report.failures.push((path, error));
                }
            }
        }

        info!(
            "Upload finished: {} submitted, {} failed",
            report.submitted,
            report.failures.len()
        );
        Ok(report)
    }

    /// Returns the record id of the submitted unit.
    async fn submit_unit(&self, path: &Path) -> Result<String, UploadError> {
        let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let record: Record =
            serde_json::from_slice(&bytes).map_err(|source| UploadError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        self.store
            .create_object(&self.schema.name, &record.to_properties())
            .await
            .map_err(|source| UploadError::Rejected {
                id: record.id.clone(),
                source,
            })?;
        Ok(record.id)
    }
}

/// `*.json` files directly inside `dir`, in enumeration order.
pub fn list_units(dir: &Path) -> Result<Vec<PathBuf>, UploadError> {
    let list_error = |source| UploadError::List {
        path: dir.to_path_buf(),
        source,
    };
    let mut units = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_error)? {
        let path = entry.map_err(list_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            units.push(path);
        }
    }
    Ok(units)
}
