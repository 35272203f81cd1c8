use std::path::Path;

use anyhow::Context;
use bela_core::core::{
    Document, LanguageMix, Millis, Report, Row, RowSummary, TierClass, UtteranceView,
};
use serde::Serialize;
use serde_json::Value;

use crate::bootstrap::RuntimeConfig;
use crate::input::{load_document, load_rows};

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CheckOutput<'a> {
    #[serde(flatten)]
    report: Report<'a>,
    linked: Vec<UtteranceView<'a>>,
}

#[derive(Serialize)]
struct RowsOutput<'a> {
    tiers: Vec<&'a str>,
    utterances: Vec<Vec<&'a Row>>,
    language_mix: LanguageMix,
    summary: RowSummary,
}

fn link(runtime: &RuntimeConfig, path: &Path) -> Result<Document, anyhow::Error> {
    let raw = load_document(path)?;
    let doc = runtime
        .linker
        .link(raw)
        .with_context(|| format!("failed to link {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        errors = doc.diagnostics().errors().len(),
        warnings = doc.diagnostics().warnings().len(),
        "document checked"
    );
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Diagnostics report plus every linked utterance with its tokens.
pub fn check(runtime: &RuntimeConfig, path: &Path) -> Result<Value, anyhow::Error> {
    let doc = link(runtime, path)?;
    let linked = doc
        .persons()
        .iter()
        .flat_map(|p| doc.utterances(p))
        .collect();
    let output = CheckOutput {
        report: doc.report(),
        linked,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn mix(runtime: &RuntimeConfig, path: &Path, to_ms: Option<u64>) -> Result<Value, anyhow::Error> {
    let doc = link(runtime, path)?;
    Ok(serde_json::to_value(doc.to_language_mix(to_ms.map(Millis::new)))?)
}

pub fn turns(
    runtime: &RuntimeConfig,
    path: &Path,
    threshold_ms: Option<u64>,
) -> Result<Value, anyhow::Error> {
    let doc = link(runtime, path)?;
    let threshold = threshold_ms.unwrap_or(runtime.turn_threshold_ms);
    Ok(serde_json::to_value(doc.find_turns(threshold))?)
}

pub fn tokenize(runtime: &RuntimeConfig, text: &str, language: Option<&str>) -> Result<Value, anyhow::Error> {
    let tokenized = runtime.linker.tokenizer().tokenize(text, language);
    Ok(serde_json::to_value(tokenized)?)
}

/// Sorts and language-tags a row transcript, then groups its utterances
/// and totals speaking time per person and language.
pub fn rows(
    path: &Path,
    to_ms: Option<u64>,
    default_language: &str,
) -> Result<Value, anyhow::Error> {
    let mut transcript = load_rows(path)?;
    transcript.sort();
    transcript.auto_tag(default_language);
    let summary = transcript
        .summarize()
        .with_context(|| format!("failed to summarize {}", path.display()))?;

    let output = RowsOutput {
        tiers: transcript.tier_names(),
        utterances: transcript.join_utterances(Some(&TierClass::Utterance)),
        language_mix: transcript.to_language_mix(to_ms.map(Millis::new)),
        summary,
    };
    Ok(serde_json::to_value(output)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
