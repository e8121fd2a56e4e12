use paslaugos_config::Config;
use paslaugos_pipeline::{BulkLoader, UploadEvent};
use paslaugos_providers::WeaviateStore;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct UploadInput {
    pub dir: Option<PathBuf>,
    pub collection: Option<String>,
}

/// Pushes every enriched JSON file into the Weaviate collection.
///
/// Every run submits every file again; objects already in the store are
/// not detected.
#[derive(Debug, Clone, Copy)]
pub struct UploadStrategy;

impl super::CommandStrategy for UploadStrategy {
    type Input = UploadInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let weaviate = &config.providers.weaviate;

        let store = WeaviateStore::new(
            &weaviate.url,
            weaviate.vectorizer.clone(),
            weaviate.timeout_secs,
        )?
        .with_api_key(weaviate.api_key.clone())
        .with_openai_key(Some(config.providers.openai.api_key.clone()));

        let collection = input
            .collection
            .unwrap_or_else(|| weaviate.collection.clone());
        let dir = input
            .dir
            .unwrap_or_else(|| config.batch.output_dir.clone());

        let loader = BulkLoader::new(store, collection);
        let report = loader
            .load_dir(&dir, |event| match event {
                UploadEvent::SchemaCreated(name) => println!("Created collection {name}"),
                UploadEvent::Submitted { path, id } => {
                    println!("  {id} <- {}", path.display());
                }
                UploadEvent::Failed { path, error } => {
                    println!("  {}: {error}", path.display());
                }
            })
            .await?;

        println!();
        println!(
            "Uploaded {} records, {} failed",
            report.submitted,
            report.failures.len()
        );
        Ok(())
    }
}
