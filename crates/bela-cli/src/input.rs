use std::path::Path;

use anyhow::Context;
use bela_core::core::{RawDocument, RowTranscript};

/// Reads a JSON tier document. The file path is recorded when the
/// document does not carry one.
pub fn load_document(path: &Path) -> Result<RawDocument, anyhow::Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document {}", path.display()))?;
    let mut raw = RawDocument::from_json(&content)
        .with_context(|| format!("invalid document {}", path.display()))?;
    if raw.path.is_none() {
        raw.path = Some(path.display().to_string());
    }
    tracing::debug!(path = %path.display(), tiers = raw.tiers.len(), "document loaded");
    Ok(raw)
}

/// Reads tab-separated transcript rows (no header, 5 or 6 columns).
pub fn load_rows(path: &Path) -> Result<RowTranscript, anyhow::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path)
        .with_context(|| format!("failed to open rows {}", path.display()))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("malformed row in {}", path.display()))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    tracing::debug!(path = %path.display(), rows = rows.len(), "rows loaded");

    let transcript = RowTranscript::from_rows(rows)
        .with_context(|| format!("invalid rows in {}", path.display()))?;
    Ok(transcript)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
