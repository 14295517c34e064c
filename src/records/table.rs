// CSV table I/O for review records.
//
// Reads the sentiment-enriched table written upstream and writes it back
// out with the thematic-analysis columns appended. Upstream columns pass
// through verbatim, including ones this crate never interprets. Keywords
// are always written as a JSON array of strings; `parse_keyword_field`
// exists for tables produced by older tooling that wrote list literals or
// plain comma-separated strings.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, warn};

use super::models::{EnrichedRecord, ReviewRecord};
use crate::themes::assign::ThemeSet;

pub const TEXT_COLUMN: &str = "review";
pub const PROCESSED_COLUMN: &str = "processed_review";
pub const KEYWORDS_COLUMN: &str = "keywords";
pub const THEMES_COLUMN: &str = "identified_theme(s)";

/// Columns the upstream sentiment stage writes, in its order.
const STANDARD_COLUMNS: &[&str] = &[
    TEXT_COLUMN,
    "rating",
    "date",
    "bank",
    "source",
    "sentiment_label",
    "sentiment_score",
];

const DERIVED_COLUMNS: &[&str] = &[PROCESSED_COLUMN, KEYWORDS_COLUMN, THEMES_COLUMN];

/// An upstream review table: its header row and every review in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTable {
    pub headers: Vec<String>,
    pub reviews: Vec<ReviewRecord>,
}

/// Header for records that didn't come from a file.
pub fn standard_headers() -> Vec<String> {
    STANDARD_COLUMNS.iter().map(|h| h.to_string()).collect()
}

fn open_reader(path: &Path) -> Result<(csv::Reader<File>, StringRecord)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open review table at {}", path.display()))?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header from {}", path.display()))?
        .clone();

    if !headers.iter().any(|h| h == TEXT_COLUMN) {
        anyhow::bail!(
            "Review table {} has no `{}` column (found: {})",
            path.display(),
            TEXT_COLUMN,
            headers.iter().collect::<Vec<_>>().join(", ")
        );
    }

    Ok((reader, headers))
}

fn read_review(path: &Path, headers: &StringRecord, row: &StringRecord, i: usize) -> Result<ReviewRecord> {
    let mut review: ReviewRecord = row
        .deserialize(Some(headers))
        .with_context(|| format!("{}: could not read row {}", path.display(), i + 1))?;
    review.columns = row.iter().map(str::to_string).collect();
    Ok(review)
}

/// Read every review in the table, preserving row order and every column.
pub fn read_reviews(path: &Path) -> Result<ReviewTable> {
    let (mut reader, headers) = open_reader(path)?;

    let mut reviews = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("{}: malformed CSV at row {}", path.display(), i + 1))?;
        reviews.push(read_review(path, &headers, &row, i)?);
    }

    debug!(path = %path.display(), rows = reviews.len(), columns = headers.len(), "Read review table");
    Ok(ReviewTable {
        headers: headers.iter().map(str::to_string).collect(),
        reviews,
    })
}

/// Read a table previously written by `write_enriched` (or an older
/// equivalent). Missing derived columns read as empty.
pub fn read_enriched(path: &Path) -> Result<Vec<EnrichedRecord>> {
    let (mut reader, headers) = open_reader(path)?;

    let column = |name: &str| headers.iter().position(|h| h == name);
    let processed_at = column(PROCESSED_COLUMN);
    let keywords_at = column(KEYWORDS_COLUMN);
    let themes_at = column(THEMES_COLUMN);

    if themes_at.is_none() {
        warn!(path = %path.display(), "Table has no theme column; every review will read as Other");
    }

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("{}: malformed CSV at row {}", path.display(), i + 1))?;
        let review = read_review(path, &headers, &row, i)?;

        let field = |at: Option<usize>| at.and_then(|i| row.get(i)).unwrap_or_default();

        records.push(EnrichedRecord {
            review,
            processed_review: field(processed_at).to_string(),
            keywords: parse_keyword_field(field(keywords_at)),
            themes: ThemeSet::parse(field(themes_at)),
        });
    }

    debug!(path = %path.display(), rows = records.len(), "Read enriched table");
    Ok(records)
}

/// Write the enriched table.
///
/// The header is `headers` followed by whichever derived columns it lacks;
/// derived columns already present are overwritten in place. Each row starts
/// from the record's source fields, so upstream values are written back
/// exactly as read. Records built in memory are rendered column by column
/// from their typed fields.
///
/// The rows go to a temporary sibling file which is renamed over `path`
/// only once every row is written, so a failed run never leaves a partial
/// table behind.
pub fn write_enriched(path: &Path, headers: &[String], records: &[EnrichedRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", path.display()))?;
        }
    }

    let tmp = temp_path(path);
    if let Err(e) = write_rows(&tmp, headers, records) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;

    debug!(path = %path.display(), rows = records.len(), "Wrote enriched table");
    Ok(())
}

fn write_rows(path: &Path, headers: &[String], records: &[EnrichedRecord]) -> Result<()> {
    let mut output_headers = headers.to_vec();
    for derived in DERIVED_COLUMNS {
        if !output_headers.iter().any(|h| h == derived) {
            output_headers.push(derived.to_string());
        }
    }
    let position = |name: &str| output_headers.iter().position(|h| h == name).unwrap_or_default();
    let processed_at = position(PROCESSED_COLUMN);
    let keywords_at = position(KEYWORDS_COLUMN);
    let themes_at = position(THEMES_COLUMN);

    // Header written by hand so an empty table still has one.
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(&output_headers)?;

    for record in records {
        let review = &record.review;
        let mut row: Vec<String> = if review.columns.is_empty() {
            headers.iter().map(|h| render_field(review, h)).collect()
        } else {
            review.columns.iter().take(headers.len()).cloned().collect()
        };
        row.resize(output_headers.len(), String::new());

        row[processed_at] = record.processed_review.clone();
        row[keywords_at] = serde_json::to_string(&record.keywords)?;
        row[themes_at] = record.themes.to_string();
        writer.write_record(&row)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

/// Render one upstream column from a record's typed fields. Columns the
/// record doesn't model come out empty.
fn render_field(review: &ReviewRecord, column: &str) -> String {
    match column {
        TEXT_COLUMN => review.text_or_empty().to_string(),
        "rating" => review.rating.map(|r| r.to_string()).unwrap_or_default(),
        "date" => review.date.map(|d| d.to_string()).unwrap_or_default(),
        "bank" => review.bank.clone(),
        "source" => review.source.clone(),
        "sentiment_label" => review.sentiment_label.clone(),
        "sentiment_score" => review.sentiment_score.map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "table.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Parse a serialized keyword list, whatever produced it.
///
/// Accepts a JSON array (`["login", "fail"]`), a Python-style list literal
/// (`['login', 'fail']`) or a comma-separated string (`login, fail`). Blank
/// or malformed entries are skipped; this never fails.
pub fn parse_keyword_field(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let Some(inner) = raw.strip_prefix('[') else {
        return raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    };

    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }

    let inner = inner.strip_suffix(']').unwrap_or(inner);
    inner
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let unquoted = ['\'', '"'].iter().find_map(|&q| {
                entry
                    .strip_prefix(q)
                    .and_then(|e| e.strip_suffix(q))
            });
            match unquoted {
                Some(k) if !k.trim().is_empty() => Some(k.trim().to_string()),
                _ => None,
            }
        })
        .collect()
}
