#![allow(dead_code)]

use std::path::PathBuf;

use bela_cli::bootstrap::{into_runtime, RuntimeConfig};
use bela_cli::config::AppConfig;
use serde_json::{json, Value};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixture files
// ---------------------------------------------------------------------------

/// Temporary directory holding fixture files for one test.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write(name, &value.to_string())
    }
}

pub fn make_runtime() -> RuntimeConfig {
    into_runtime(AppConfig::default()).expect("default config is valid")
}

// ---------------------------------------------------------------------------
// Sample documents
// ---------------------------------------------------------------------------

pub fn ann(id: &str, text: &str, from: u64, to: u64) -> Value {
    json!({ "id": id, "text": text, "from_ts": from, "to_ts": to })
}

pub fn tier(id: &str, participant: &str, parent: Option<&str>, annotations: Vec<Value>) -> Value {
    json!({
        "id": id,
        "participant": participant,
        "parent": parent,
        "annotations": annotations,
    })
}

/// The four tiers of one speaker: a single utterance `(0, 2000)` with the
/// given chunks and language tags, plus a translation.
pub fn speaker_tiers(
    name: &str,
    code: &str,
    utterance: &str,
    chunks: &[(&str, u64, u64)],
    languages: &[(&str, u64, u64)],
) -> Vec<Value> {
    let u = format!("{name} (Utterance)");
    let c = format!("{name} (Chunk)");
    let make = |prefix: &str, items: &[(&str, u64, u64)]| -> Vec<Value> {
        items
            .iter()
            .enumerate()
            .map(|(i, (text, from, to))| ann(&format!("{code}-{prefix}{i}"), text, *from, *to))
            .collect()
    };
    vec![
        tier(&u, code, None, vec![ann(&format!("{code}-u0"), utterance, 0, 2000)]),
        tier(&c, code, Some(&u), make("c", chunks)),
        tier(&format!("{name} (Language)"), code, Some(&c), make("l", languages)),
        tier(
            &format!("{name} (Translation)"),
            code,
            Some(&u),
            vec![json!({ "id": format!("{code}-t0"), "text": "hello all", "reference": format!("{code}-u0") })],
        ),
    ]
}

pub fn document(tiers: Vec<Value>) -> Value {
    json!({ "tiers": tiers })
}

/// One fully linked and tagged bilingual utterance.
pub fn sample_document() -> Value {
    document(speaker_tiers(
        "baby",
        "B1",
        "hello 你好",
        &[("hello", 0, 1000), ("你好", 1000, 2000)],
        &[("English", 0, 1000), ("Mandarin", 1000, 2000)],
    ))
}

/// Utterance-only tiers for two speakers, for turn detection.
pub fn conversation(gap_ms: u64) -> Value {
    let second = 1000 + gap_ms;
    document(vec![
        tier("baby (Utterance)", "B1", None, vec![ann("b0", "hi", 0, 1000)]),
        tier(
            "mum (Utterance)",
            "M1",
            None,
            vec![ann("m0", "hello", second, second + 1000)],
        ),
    ])
}

// ---------------------------------------------------------------------------
// Sample rows
// ---------------------------------------------------------------------------

pub fn sample_rows() -> String {
    [
        "baby (Utterance)\tB1\t0.000\t1.000\t1.000\thi there",
        "baby (Language)\tB1\t0.000\t1.000\t1.000\tEnglish",
        "baby (Utterance)\tB1\t1.020\t2.000\t0.980\tagain",
        "mum (Utterance)\tM1\t3.000\t5.000\t2.000\t你好",
        "mum (Language)\tM1\t3.000\t5.000\t2.000\tMandarin",
        "note\t1.0\t2.0",
    ]
    .join("\n")
}
