use paslaugos_config::Config;
use std::path::PathBuf;

use super::truncate;

#[derive(Debug, Clone)]
pub struct ViewInput {
    pub path: Option<PathBuf>,
    pub row: Option<usize>,
    pub limit: usize,
}

/// Loads the catalogue through the normalizer and prints it.
#[derive(Debug, Clone, Copy)]
pub struct ViewStrategy;

impl super::CommandStrategy for ViewStrategy {
    type Input = ViewInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let records = super::load_catalogue(&config, input.path)?;

        if let Some(row) = input.row {
            let record = records.get(row).ok_or_else(|| {
                anyhow::anyhow!("Row {row} out of range (0..{})", records.len())
            })?;
            println!("{}", serde_json::to_string_pretty(record)?);
            return Ok(());
        }

        println!("{:>5}  {:<10}  {:>12}  NAME", "ROW", "ID", "POPULARITY");
        for (index, record) in records.iter().take(input.limit).enumerate() {
            println!(
                "{index:>5}  {:<10}  {:>12}  {}",
                truncate(&record.id, 10),
                record.popularity,
                truncate(&record.combined_name, 70)
            );
        }
        if records.len() > input.limit {
            println!("... {} more rows", records.len() - input.limit);
        }
        Ok(())
    }
}
