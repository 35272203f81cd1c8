mod common;

use bela_cli::commands;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn messages(report: &serde_json::Value, key: &str) -> Vec<String> {
    report[key]
        .as_array()
        .expect("diagnostic list")
        .iter()
        .map(|d| d["message"].as_str().unwrap_or_default().to_owned())
        .collect()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn test_check_clean_document() {
    let fx = Fixture::new();
    let path = fx.write_json("clean.json", &sample_document());

    let report = commands::check(&make_runtime(), &path).unwrap();

    assert_eq!(messages(&report, "errors"), Vec::<String>::new());
    assert_eq!(report["persons"], json!([":transcriber:", "B1"]));
    assert_eq!(report["utterances"], 1);
    assert_eq!(report["chunks"], 2);
    assert_eq!(report["languages"], json!(["English", "Mandarin"]));
    assert_eq!(report["path"], json!(path.display().to_string()));
}

#[test]
fn test_check_lists_linked_utterances() {
    let fx = Fixture::new();
    let path = fx.write_json("clean.json", &sample_document());

    let output = commands::check(&make_runtime(), &path).unwrap();

    let linked = output["linked"].as_array().expect("linked utterances");
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["speaker"], "B1");
    assert_eq!(linked[0]["annotation"]["words"], json!(["hello", "你好"]));
    assert_eq!(linked[0]["chunks"][1]["language"], "Mandarin");
    assert_eq!(linked[0]["translation"], "hello all");
}

#[test]
fn test_check_reports_chunk_mismatch() {
    let fx = Fixture::new();
    let doc = document(speaker_tiers(
        "baby",
        "B1",
        "hello 你好",
        &[("hello", 0, 1000)],
        &[("English", 0, 1000)],
    ));
    let path = fx.write_json("mismatch.json", &doc);

    let report = commands::check(&make_runtime(), &path).unwrap();

    assert_eq!(
        messages(&report, "errors"),
        vec!["Utterance text and chunks are mismatched (\"hello你好\" != \"hello\")"]
    );
}

#[test]
fn test_check_reports_missing_language_tag() {
    let fx = Fixture::new();
    let doc = document(speaker_tiers(
        "baby",
        "B1",
        "hello 你好",
        &[("hello", 0, 1000), ("你好", 1000, 2000)],
        &[("English", 0, 1000)],
    ));
    let path = fx.write_json("untagged.json", &doc);

    let report = commands::check(&make_runtime(), &path).unwrap();

    let errors = messages(&report, "errors");
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].starts_with("Language tag not found in the chunk `你好`"));
}

#[test]
fn test_check_identity_conflict_is_error() {
    let fx = Fixture::new();
    let doc = document(vec![
        tier("baby (Utterance)", "B1", None, vec![ann("a", "hi", 0, 1000)]),
        tier("mum (Utterance)", "B1", None, vec![ann("b", "hi", 2000, 3000)]),
    ]);
    let path = fx.write_json("conflict.json", &doc);

    let err = commands::check(&make_runtime(), &path).unwrap_err();

    assert!(err.to_string().starts_with("failed to link"));
    assert!(format!("{err:#}").contains("participant code B1 is used by both"));
}

#[test]
fn test_check_invalid_json_is_error() {
    let fx = Fixture::new();
    let path = fx.write("broken.json", "{ not json");

    let err = commands::check(&make_runtime(), &path).unwrap_err();
    assert!(err.to_string().starts_with("invalid document"));
}

// ---------------------------------------------------------------------------
// mix
// ---------------------------------------------------------------------------

#[test]
fn test_mix_merges_adjacent_languages() {
    let fx = Fixture::new();
    let doc = document(speaker_tiers(
        "baby",
        "B1",
        "one two 三",
        &[("one", 0, 500), ("two", 500, 1000), ("三", 1000, 2000)],
        &[("English", 0, 500), ("English", 500, 1000), ("Mandarin", 1000, 2000)],
    ));
    let path = fx.write_json("mix.json", &doc);

    let mix = commands::mix(&make_runtime(), &path, None).unwrap();

    assert_eq!(
        mix["entries"],
        json!([
            { "language": "English", "duration": 1.0 },
            { "language": "Mandarin", "duration": 1.0 },
        ])
    );
    assert_eq!(mix["length"], json!(2.0));
}

#[test]
fn test_mix_respects_upper_bound() {
    let fx = Fixture::new();
    let path = fx.write_json("clean.json", &sample_document());

    let mix = commands::mix(&make_runtime(), &path, Some(500)).unwrap();

    assert_eq!(mix["entries"], json!([{ "language": "English", "duration": 1.0 }]));
}

// ---------------------------------------------------------------------------
// turns
// ---------------------------------------------------------------------------

#[test]
fn test_turns_within_threshold() {
    let fx = Fixture::new();
    let path = fx.write_json("talk.json", &conversation(1000));

    let turns = commands::turns(&make_runtime(), &path, None).unwrap();

    let turns = turns.as_array().expect("turn list");
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["speaker"], "B1");
    assert_eq!(turns[0]["next_speaker"], "M1");
    assert_eq!(turns[0]["gap_ms"], 1000);
}

#[test]
fn test_turns_beyond_threshold() {
    let fx = Fixture::new();
    let path = fx.write_json("talk.json", &conversation(2000));

    let turns = commands::turns(&make_runtime(), &path, None).unwrap();
    assert_eq!(turns, json!([]));

    let widened = commands::turns(&make_runtime(), &path, Some(2500)).unwrap();
    assert_eq!(widened.as_array().map(Vec::len), Some(1));
}

// ---------------------------------------------------------------------------
// tokenize / rows
// ---------------------------------------------------------------------------

#[test]
fn test_tokenize_reports_errors() {
    let value = commands::tokenize(&make_runtime(), "hello :v:giggling", Some("English")).unwrap();
    assert_eq!(value["tokens"], json!(["hello"]));
    assert_eq!(value["errors"], json!(["Invalid vocal sounds tag (:v:giggling)"]));
}

#[test]
fn test_rows_groups_and_tags() {
    let fx = Fixture::new();
    let path = fx.write("rows.tsv", &sample_rows());

    let output = commands::rows(&path, None, "English").unwrap();

    assert_eq!(
        output["tiers"],
        json!(["baby (Utterance)", "baby (Language)", "mum (Utterance)", "mum (Language)"])
    );

    let groups = output["utterances"].as_array().expect("groups");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].as_array().map(Vec::len), Some(2));
    assert_eq!(groups[0][0]["language"], "English");
    assert_eq!(groups[1][0]["language"], "Mandarin");

    let entries = output["language_mix"]["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["language"], "English");
    assert_eq!(entries[1]["language"], "Mandarin");
    assert_eq!(entries[1]["duration"], json!(2.0));
}

#[test]
fn test_rows_inconsistent_duration_is_error() {
    let fx = Fixture::new();
    let path = fx.write("rows.tsv", "baby (Utterance)\t0.0\t1.0\t5.0\thi");

    let err = commands::rows(&path, None, "").unwrap_err();
    assert!(err.to_string().starts_with("invalid rows"));
}

#[test]
fn test_rows_summary_totals() {
    let fx = Fixture::new();
    let path = fx.write("rows.tsv", &sample_rows());

    let output = commands::rows(&path, None, "English").unwrap();

    let summary = &output["summary"];
    assert_eq!(summary["languages"], json!([["English", 1.0], ["Mandarin", 2.0]]));
    assert_eq!(summary["people"][0]["name"], "baby");
    assert_eq!(summary["people"][0]["duration"], json!(1.98));
    assert_eq!(summary["people"][0]["utterance_count"], 2);
    assert_eq!(summary["people"][1]["codes"], json!(["M1"]));
    assert_eq!(summary["people"][1]["languages"], json!([["Mandarin", 2.0]]));
    assert_eq!(messages(&summary["diagnostics"], "warnings"), Vec::<String>::new());
}

#[test]
fn test_rows_summary_warns_on_untagged_rows() {
    let fx = Fixture::new();
    let path = fx.write(
        "rows.tsv",
        "baby (Utterance)\tB1\t0.0\t1.0\t1.0\thi\nbaby (Utterance)\tB1\t2.0\t3.0\t1.0\t ",
    );

    let output = commands::rows(&path, None, "#!#?").unwrap();

    assert_eq!(
        messages(&output["summary"]["diagnostics"], "warnings"),
        vec![
            "Language tag not found: baby [00:00:00.000 -- 00:00:01.000] hi",
            "Blank: baby [00:00:02.000 -- 00:00:03.000]",
            "Language tag not found: baby [00:00:02.000 -- 00:00:03.000]  ",
        ]
    );
}

#[test]
fn test_rows_shared_code_is_error() {
    let fx = Fixture::new();
    let path = fx.write(
        "rows.tsv",
        "baby (Utterance)\tB1\t0.0\t1.0\t1.0\thi\nmum (Utterance)\tB1\t2.0\t3.0\t1.0\thello",
    );

    let err = commands::rows(&path, None, "").unwrap_err();

    assert!(err.to_string().starts_with("failed to summarize"));
    assert!(format!("{err:#}").contains("participant code B1 is used by both"));
}
