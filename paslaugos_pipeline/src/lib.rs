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
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Batch enrichment pipeline and the document tools built on the service traits.

pub mod batch;
pub mod bulk;
pub mod checkpoint;
pub mod enrich;
pub mod loader;
pub mod mask;
pub mod parse;

#[cfg(test)]
mod testing;

pub use batch::{BatchEvent, BatchOptions, BatchOutcome, BatchProgress, BatchRunner, OutputWriter};
pub use bulk::{BulkLoader, BulkReport, UploadEvent};
pub use checkpoint::{Checkpoint, CheckpointFile};
pub use enrich::{EnrichedText, Enricher, EnrichmentSettings};
pub use loader::{is_url, load_records, read_records};
pub use mask::{MaskOutcome, MaskRequest, Masker};
pub use parse::{FieldCheck, PollPolicy, extract_fields, parse_document, validate_fields};
