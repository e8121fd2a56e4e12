//! Record loader and normalizer for the service catalogue CSV.

use paslaugos_core::{Record, ValidationError};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

pub const ID: &str = "ID";
pub const LONG_NAME: &str = "LONG_NAME";
pub const SHORT_NAME: &str = "SHORT_NAME";
pub const DESCRIPTION: &str = "DESCRIPTION";
pub const SHORT_DESCRIPTION: &str = "SHORT_DESCRIPTION";
pub const KEYWORDS: &str = "KEYWORDS";
pub const CATEGORIES: &str = "CATEGORIES";
pub const LIFE_EVENTS: &str = "LIFE_EVENTS";
pub const PROVIDER_NAMES: &str = "PROVIDER_NAMES";
pub const POPULARITY: &str = "POPULARITY";

pub const REQUIRED_COLUMNS: [&str; 10] = [
    ID,
    LONG_NAME,
    SHORT_NAME,
    DESCRIPTION,
    SHORT_DESCRIPTION,
    KEYWORDS,
    CATEGORIES,
    LIFE_EVENTS,
    PROVIDER_NAMES,
    POPULARITY,
];

/// Infinite numeric values are clamped to this.
pub const NUMERIC_SENTINEL: f64 = 1e10;

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| {
        Regex::new(
            r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\\(\\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+",
        )
        .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Whether the text contains an absolute http(s) URL.
#[must_use]
pub fn is_url(text: &str) -> bool {
    url_pattern().is_match(text)
}

/// Load and normalize every row of a CSV file. All-or-nothing.
pub fn load_records(path: &Path) -> Result<Vec<Record>, ValidationError> {
    let file = std::fs::File::open(path).map_err(|source| ValidationError::Source {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_records(file)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_records<R: Read>(input: R) -> Result<Vec<Record>, ValidationError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| ValidationError::Malformed {
            row: 0,
            message: e.to_string(),
        })?
        .clone();
    let columns = ColumnIndex::new(&headers)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (row, result) in reader.records().enumerate() {
        let raw = result.map_err(|e| ValidationError::Malformed {
            row,
            message: e.to_string(),
        })?;
        let record = normalize_row(row, &columns, &raw)?;
        if !seen.insert(record.id.clone()) {
            return Err(ValidationError::DuplicateId { row, id: record.id });
        }
        records.push(record);
    }
    Ok(records)
}

struct ColumnIndex(HashMap<&'static str, usize>);

impl ColumnIndex {
    fn new(headers: &csv::StringRecord) -> Result<Self, ValidationError> {
        let mut index = HashMap::new();
        for column in REQUIRED_COLUMNS {
            let position = headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| ValidationError::MissingColumn(column.to_string()))?;
            index.insert(column, position);
        }
        Ok(Self(index))
    }

    /// Trimmed cell value; absent cells read as empty.
    fn text(&self, raw: &csv::StringRecord, column: &str) -> String {
        self.0
            .get(column)
            .and_then(|&i| raw.get(i))
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

fn normalize_row(
    row: usize,
    columns: &ColumnIndex,
    raw: &csv::StringRecord,
) -> Result<Record, ValidationError> {
    let id = columns.text(raw, ID);
    if id.is_empty() {
        return Err(ValidationError::MissingId { row });
    }

    let short_name = columns.text(raw, SHORT_NAME);
    let long_name = columns.text(raw, LONG_NAME);
    let provider_names = columns.text(raw, PROVIDER_NAMES);
    let popularity = parse_count(row, POPULARITY, &columns.text(raw, POPULARITY))?;

    let mut description = columns.text(raw, DESCRIPTION);
    for name in [&short_name, &long_name] {
        if is_url(name) {
            debug!("Row {row}: URL found in name, appending to description");
            description.push_str(" URL: ");
            description.push_str(name);
        }
    }

    Ok(Record {
        combined_name: Record::combine_names(&short_name, &long_name, &provider_names),
        enriched_description: description.clone(),
        id,
        short_name,
        long_name,
        description,
        short_description: columns.text(raw, SHORT_DESCRIPTION),
        keywords: columns.text(raw, KEYWORDS),
        categories: columns.text(raw, CATEGORIES),
        life_events: columns.text(raw, LIFE_EVENTS),
        provider_names,
        popularity,
    })
}

/// Non-negative integer column. Empty or NaN reads as 0, infinities clamp to
/// [`NUMERIC_SENTINEL`], fractions truncate.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is finite, non-negative and at most the sentinel"
)]
pub fn parse_count(row: usize, column: &str, value: &str) -> Result<u64, ValidationError> {
    if value.is_empty() {
        return Ok(0);
    }
    let number: f64 = value.parse().map_err(|_| ValidationError::InvalidNumber {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })?;

    if number.is_nan() {
        return Ok(0);
    }
    if number.is_infinite() {
        return Ok(NUMERIC_SENTINEL as u64);
    }
    if number < 0.0 {
        return Err(ValidationError::NegativeNumber {
            row,
            column: column.to_string(),
            value: value.to_string(),
        });
    }
    Ok(number.trunc().min(NUMERIC_SENTINEL) as u64)
}
