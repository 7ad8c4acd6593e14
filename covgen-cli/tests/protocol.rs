//! Wire-protocol tests for the `covgen-worker` binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

fn covgen_worker() -> Command {
    let mut cmd = Command::cargo_bin("covgen-worker").expect("covgen-worker binary");
    cmd.env("RUST_LOG", "error").env_remove("COVGEN_CONFIG").env_remove("COVGEN_CACHE_DIR");
    cmd
}

fn create_temp_project() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let src = td.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("math.js"),
        "// helpers\nfunction add(a, b) {\n  return a + b;\n}\n\nmodule.exports = { add };\n",
    )
    .unwrap();
    fs::write(src.join("math.test.js"), "test('adds', () => {});\n").unwrap();
    td
}

fn job(root: &str, file: &str, collect: bool) -> String {
    json!({
        "config": { "rootDir": root },
        "globalConfig": {
            "collectCoverage": collect,
            "collectCoverageFrom": ["src/**/*.js"]
        },
        "path": format!("{root}/{file}"),
    })
    .to_string()
}

fn responses(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| serde_json::from_str(l).expect("response line is JSON"))
        .collect()
}

fn root_of(td: &TempDir) -> String {
    td.path().to_str().unwrap().replace('\\', "/")
}

#[test]
fn excluded_files_answer_null() {
    let temp = create_temp_project();
    let root = root_of(&temp);
    let input = format!(
        "{}\n{}\n",
        job(&root, "src/math.js", false),
        job(&root, "src/math.test.js", true)
    );

    let out = covgen_worker()
        .current_dir(temp.path())
        .arg("--no-cache")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines = responses(&out);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["result"], Value::Null);
    assert_eq!(lines[1]["result"], Value::Null);
    assert_eq!(lines[1]["path"], json!(format!("{root}/src/math.test.js")));
}

#[test]
fn covered_file_answers_zeroed_coverage() {
    let temp = create_temp_project();
    let root = root_of(&temp);

    let out = covgen_worker()
        .current_dir(temp.path())
        .arg("--no-cache")
        .write_stdin(format!("{}\n", job(&root, "src/math.js", true)))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines = responses(&out);
    let coverage = &lines[0]["result"]["coverage"];
    assert_eq!(coverage["path"], json!(format!("{root}/src/math.js")));
    let hits = coverage["s"].as_object().unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.values().all(|v| v == &json!(0)));
}

#[test]
fn missing_file_is_a_per_file_error() {
    let temp = create_temp_project();
    let root = root_of(&temp);
    let input = format!(
        "{}\n{}\n",
        job(&root, "src/gone.js", true),
        job(&root, "src/math.js", true)
    );

    let out = covgen_worker()
        .current_dir(temp.path())
        .arg("--no-cache")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines = responses(&out);
    assert_eq!(lines[0]["error"]["retryable"], json!(true));
    assert!(lines[0]["error"]["message"].as_str().unwrap().contains("gone.js"));
    assert!(lines[1]["result"]["coverage"].is_object());
}

#[test]
fn unknown_transformer_is_not_retryable() {
    let temp = create_temp_project();
    let root = root_of(&temp);
    let input = json!({
        "config": {
            "rootDir": root,
            "transform": [{ "pattern": "\\.js$", "transformer": "babel-jest" }]
        },
        "globalConfig": { "collectCoverage": true },
        "path": format!("{root}/src/math.js"),
    })
    .to_string();

    let out = covgen_worker()
        .current_dir(temp.path())
        .arg("--no-cache")
        .write_stdin(input + "\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines = responses(&out);
    assert_eq!(lines[0]["error"]["retryable"], json!(false));
    assert!(lines[0]["error"]["message"].as_str().unwrap().contains("babel-jest"));
}

#[test]
fn undecodable_line_is_fatal() {
    let temp = create_temp_project();
    let root = root_of(&temp);
    let input = format!("{}\nnot json at all\n", job(&root, "src/math.js", true));

    covgen_worker()
        .current_dir(temp.path())
        .arg("--no-cache")
        .write_stdin(input)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"coverage\""))
        .stderr(predicate::str::contains("undecodable job"));

    // A fresh unit is unaffected.
    covgen_worker()
        .current_dir(temp.path())
        .arg("--no-cache")
        .write_stdin(format!("{}\n", job(&root, "src/math.js", true)))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"coverage\""));
}

#[test]
fn cache_dir_receives_entries() {
    let temp = create_temp_project();
    let root = root_of(&temp);
    let cache = temp.path().join("cache");

    covgen_worker()
        .current_dir(temp.path())
        .arg("--cache-dir")
        .arg(&cache)
        .write_stdin(format!("{}\n", job(&root, "src/math.js", true)))
        .assert()
        .success();

    assert_eq!(fs::read_dir(&cache).unwrap().count(), 1);
}

#[test]
fn config_file_can_disable_cache() {
    let temp = create_temp_project();
    let root = root_of(&temp);
    fs::write(
        temp.path().join("covgen.toml"),
        "[cache]\nenabled = false\ndir = \"cache\"\n",
    )
    .unwrap();

    covgen_worker()
        .current_dir(temp.path())
        .write_stdin(format!("{}\n", job(&root, "src/math.js", true)))
        .assert()
        .success();

    assert!(!temp.path().join("cache").exists());
}

#[test]
fn invalid_config_file_fails_before_reading_jobs() {
    let temp = create_temp_project();
    fs::write(temp.path().join("covgen.toml"), "[cache\n").unwrap();

    covgen_worker()
        .current_dir(temp.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("covgen.toml"));
}
