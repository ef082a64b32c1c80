//! Binary smoke tests: JSON records on disk in, rendered content out.

use std::path::Path;
use std::process::{Command, Output};

use catalog_content_core::{ItemDescription, Section, Template, VersionDraft};
use tempfile::TempDir;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_catalog-content"))
        .args(args)
        .env("CATALOG_LOG", "off")
        .output()
        .expect("spawn catalog-content")
}

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> String {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn write_raw(dir: &Path, name: &str, raw: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, raw).unwrap();
    path.to_string_lossy().into_owned()
}

fn published_template() -> Template {
    let mut template = Template::new("Boots", "seller-1");
    template
        .publish_version(
            VersionDraft {
                intro: Some("T1".into()),
                sections: vec![Section::new("k1", "A", "old")],
            },
            true,
        )
        .unwrap();
    template
        .publish_version(
            VersionDraft {
                intro: Some("T2".into()),
                sections: vec![Section::new("k1", "A", "base")],
            },
            true,
        )
        .unwrap();
    template
}

#[test]
fn resolve_prints_merged_content_as_json() {
    let dir = TempDir::new().unwrap();
    let template = published_template();
    let item = ItemDescription {
        template_id: Some(template.id),
        template_version: 2,
        description: Some(String::new()),
        overrides: [("k1".to_string(), "over".to_string())].into(),
    };
    let template_path = write_json(dir.path(), "template.json", &template);
    let item_path = write_json(dir.path(), "item.json", &item);

    let out = run(&[
        "--format",
        "json",
        "resolve",
        "--template",
        &template_path,
        "--item",
        &item_path,
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let content: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(content["intro"], "T2");
    assert_eq!(content["version"], 2);
    assert_eq!(content["sections"][0]["content"], "over");
}

#[test]
fn resolve_accepts_bare_template_and_item_records() {
    let dir = TempDir::new().unwrap();
    let template_path = write_raw(
        dir.path(),
        "template.json",
        r#"{"activeVersion":2,"versions":[{"version":2,"intro":"T2","sections":[{"key":"k1","title":"A","content":"base"}]}]}"#,
    );
    let item_path = write_raw(
        dir.path(),
        "item.json",
        r#"{"templateVersion":2,"description":"","overrides":{"k1":"over"}}"#,
    );

    let out = run(&["-o", "json", "resolve", "-t", &template_path, "-i", &item_path]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let content: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(content["intro"], "T2");
    assert_eq!(
        content["sections"],
        serde_json::json!([{ "key": "k1", "title": "A", "content": "over" }])
    );
}

#[test]
fn resolve_with_dangling_active_version_is_no_content() {
    let dir = TempDir::new().unwrap();
    let template_path = write_raw(
        dir.path(),
        "template.json",
        r#"{"activeVersion":42,"versions":[{"version":1,"intro":"T1"},{"version":2,"intro":"T2"}]}"#,
    );
    let item_path = write_raw(dir.path(), "item.json", r#"{"templateVersion":99}"#);

    let out = run(&["-o", "json", "resolve", "-t", &template_path, "-i", &item_path]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "null");

    let out = run(&["resolve", "-t", &template_path, "-i", &item_path]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("no content"));
}

#[test]
fn resolve_reports_fallback_in_pretty_mode() {
    let dir = TempDir::new().unwrap();
    let template = published_template();
    let item = ItemDescription {
        template_id: Some(template.id),
        template_version: 7,
        ..Default::default()
    };
    let template_path = write_json(dir.path(), "template.json", &template);
    let item_path = write_json(dir.path(), "item.json", &item);

    let out = run(&["resolve", "-t", &template_path, "-i", &item_path]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("version 7 missing"));
    assert!(stdout.contains("## A"));
    assert!(stdout.contains("base"));
}

#[test]
fn diff_skips_bookkeeping_fields() {
    let dir = TempDir::new().unwrap();
    let before = serde_json::json!({ "_id": "x", "__v": 1, "name": "Boot", "price": 10 });
    let after = serde_json::json!({ "_id": "x", "__v": 2, "name": "Boot", "price": 12 });
    let before_path = write_json(dir.path(), "before.json", &before);
    let after_path = write_json(dir.path(), "after.json", &after);

    let out = run(&["-o", "json", "diff", "-b", &before_path, "-a", &after_path]);
    assert!(out.status.success());
    let changes: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let fields: Vec<_> = changes.as_object().unwrap().keys().cloned().collect();
    assert_eq!(fields, vec!["price".to_string()]);

    let out = run(&["diff", "-b", &before_path, "-a", &after_path, "--locale", "de-DE"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "price: 10 -> 12");
}

#[test]
fn missing_input_file_fails_with_context() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");
    let missing = missing.to_string_lossy();

    let out = run(&["diff", "-b", &missing, "-a", &missing]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to read"));
}

#[test]
fn groups_lists_catalog_in_order() {
    let out = run(&["-o", "json", "groups"]);
    assert!(out.status.success());
    let groups: Vec<serde_json::Value> = serde_json::from_slice(&out.stdout).unwrap();
    let orders: Vec<u64> = groups.iter().map(|g| g["order"].as_u64().unwrap()).collect();
    assert!(orders.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(groups[0]["key"], "products");
}

#[test]
fn demo_runs_end_to_end() {
    let out = run(&["-o", "json", "demo"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["content"]["sections"][0]["content"], "Runs half a size small.");
    assert_eq!(report["history"]["pagination"]["total"], 2);
}
