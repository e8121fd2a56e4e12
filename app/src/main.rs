#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;

use command::{
    BatchInput, BatchStrategy, CommandStrategy, EnrichInput, EnrichStrategy, InfoStrategy,
    InitStrategy, MaskInput, MaskStrategy, ParseInput, ParseStrategy, UploadInput,
    UploadStrategy, VersionStrategy, ViewInput, ViewStrategy,
};

#[derive(Parser)]
#[command(name = "paslaugos")]
#[command(about = "Public service catalogue enrichment and document tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show configuration (secrets masked)
    Info,
    /// Show version
    Version,
    /// List normalized rows of the service CSV
    View {
        /// CSV file (defaults to input.csv_path)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Show every field of a single row
        #[arg(short, long)]
        row: Option<usize>,

        /// Number of rows to list
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Enrich a single row and show original vs enriched description
    Enrich {
        /// Zero-based row index
        row: usize,

        /// CSV file (defaults to input.csv_path)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,

        /// Print the prompt sent to the model
        #[arg(long)]
        show_prompt: bool,
    },
    /// Enrich every row and write one JSON file per record
    Batch {
        /// CSV file (defaults to input.csv_path)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// First row to process
        #[arg(short, long, conflicts_with = "resume")]
        start_index: Option<usize>,

        /// Continue after the last saved checkpoint
        #[arg(long)]
        resume: bool,

        /// Output directory (defaults to batch.output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Push enriched JSON files into the document store
    Upload {
        /// Directory of enriched files (defaults to batch.output_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Target collection (defaults to providers.weaviate.collection)
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Parse a PDF or image and print the extracted fields
    Parse {
        /// Document to parse
        file: PathBuf,

        /// JSON object with expected field values to compare against
        #[arg(short, long)]
        expect: Option<PathBuf>,
    },
    /// Redact PII from a text file and upload the masked copy
    Mask {
        /// UTF-8 text file
        file: PathBuf,

        /// GCP project id (defaults to providers.gcp.project_id)
        #[arg(short, long)]
        project_id: Option<String>,

        /// Target bucket (defaults to providers.gcp.bucket)
        #[arg(short, long)]
        bucket: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
        Commands::View { path, row, limit } => {
            ViewStrategy
                .execute(ViewInput { path, row, limit })
                .await
        }
        Commands::Enrich {
            row,
            path,
            model,
            show_prompt,
        } => {
            EnrichStrategy
                .execute(EnrichInput {
                    row,
                    path,
                    model,
                    show_prompt,
                })
                .await
        }
        Commands::Batch {
            path,
            start_index,
            resume,
            output_dir,
            model,
        } => {
            BatchStrategy
                .execute(BatchInput {
                    path,
                    start_index,
                    resume,
                    output_dir,
                    model,
                })
                .await
        }
        Commands::Upload { dir, collection } => {
            UploadStrategy
                .execute(UploadInput { dir, collection })
                .await
        }
        Commands::Parse { file, expect } => ParseStrategy.execute(ParseInput { file, expect }).await,
        Commands::Mask {
            file,
            project_id,
            bucket,
        } => {
            MaskStrategy
                .execute(MaskInput {
                    file,
                    project_id,
                    bucket,
                })
                .await
        }
    }
}
