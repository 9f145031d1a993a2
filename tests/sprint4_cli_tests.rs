//! Sprint 4: Command line interface
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests
//!
//! Exercises the `process`, `parse` and `compare` subcommands end to end.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PATTERN_DUMP: &str = include_str!("fixtures/run1.out");
const ANOMALY_DUMP: &str = include_str!("fixtures/anomalies1.out");

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Write a config plus input dumps for clusters 1 and 2 under `root`
fn write_inputs(root: &Path) -> std::path::PathBuf {
    for id in [1, 2] {
        let dir = root.join("in").join(format!("cluster_{}", id));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("run{}.out", id)), PATTERN_DUMP).unwrap();
    }
    fs::write(root.join("in/cluster_1/anomalies1.out"), ANOMALY_DUMP).unwrap();

    let config = root.join("groum.toml");
    fs::write(
        &config,
        format!(
            "input_root = {:?}\noutput_root = {:?}\nrequired_methods = [\"java.io.File.exists\"]\n",
            root.join("in"),
            root.join("out")
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_parse_prints_stats_table() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("parse")
        .arg(fixture("run1.out"))
        .arg("--cluster")
        .arg("5")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "cluster_id pattern_id nodes frequency meth_bag_size files_in_pattern is_anomaly violated_pattern rareness\n",
        ))
        .stdout(predicate::str::contains("5 1 3 42 2 2 0 -1 -1"))
        .stdout(predicate::str::contains("5 3 2 25 2 1 0 -1 -1"))
        .stdout(predicate::str::contains("\n5 2 ").not());
}

#[test]
fn test_parse_min_frequency_flag() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("parse")
        .arg(fixture("run1.out"))
        .arg("--min-frequency")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 2 2 7 1 1 0 -1 -1"));
}

#[test]
fn test_parse_anomalies() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("parse")
        .arg("--anomalies")
        .arg(fixture("anomalies1.out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("0 8 3 2 2 1 1 1 0.125"));
}

#[test]
fn test_parse_missing_file_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("parse")
        .arg("/nonexistent/run1.out")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read dump"));
}

#[test]
fn test_process_range_with_skipped_cluster() {
    let root = TempDir::new().unwrap();
    let config = write_inputs(root.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--first")
        .arg("1")
        .arg("--last")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("cluster 1: 2 popular, 1 anomalous"))
        .stdout(predicate::str::contains("cluster 2: 2 popular, 0 anomalous"))
        .stdout(predicate::str::contains("cluster 3: skipped"));

    let out = root.path().join("out");
    assert!(out.join("cluster_1/cluster_1_info.txt").is_file());
    assert!(out.join("cluster_1/anom_3.acdfg.bin").is_file());
    assert!(out.join("stats.txt").is_file());
}

#[test]
fn test_process_fails_when_every_cluster_fails() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("in/cluster_1");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("run1.out"), "/* Begin a pattern */\n1 1 a.B b c 1 1\n").unwrap();
    let config = root.path().join("groum.toml");
    fs::write(
        &config,
        format!(
            "input_root = {:?}\noutput_root = {:?}\n",
            root.path().join("in"),
            root.path().join("out")
        ),
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--last")
        .arg("1")
        .assert()
        .failure()
        .stdout(predicate::str::contains("cluster 1: failed"));
}

#[test]
fn test_process_rejects_invalid_config() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("groum.toml");
    fs::write(&config, "pattern_dump = \"run.out\"\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--last")
        .arg("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pattern_dump"));
}

fn processed_summaries(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let config = write_inputs(root);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--last")
        .arg("2")
        .assert()
        .success();
    (
        root.join("out/cluster_1/cluster_1_info.txt"),
        root.join("out/cluster_2/cluster_2_info.txt"),
    )
}

#[test]
fn test_compare_text_output() {
    let root = TempDir::new().unwrap();
    let (left, right) = processed_summaries(root.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("compare")
        .arg(&left)
        .arg(&right)
        .assert()
        .success()
        .stdout(predicate::str::contains("pairs:          6"))
        .stdout(predicate::str::contains("EQUAL:          2"))
        .stdout(predicate::str::contains("1:1 == 2:1"));
}

#[test]
fn test_compare_json_with_config_filter() {
    let root = TempDir::new().unwrap();
    let (left, right) = processed_summaries(root.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    let output = cmd
        .arg("compare")
        .arg(&left)
        .arg(&right)
        .arg("--config")
        .arg(root.path().join("groum.toml"))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["left_patterns"], 2);
    assert_eq!(json["right_patterns"], 1);
    assert_eq!(json["equal"], 1);
    assert_eq!(json["incomparable"], 1);
}

#[test]
fn test_compare_with_method_file() {
    let root = TempDir::new().unwrap();
    let (left, right) = processed_summaries(root.path());
    let methods = root.path().join("methods_1.txt");
    fs::write(&methods, "java.io.BufferedReader. close\n\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("groum-ingest");
    cmd.arg("compare")
        .arg(&left)
        .arg(&right)
        .arg("--require-methods")
        .arg(&methods)
        .assert()
        .success()
        .stdout(predicate::str::contains("pairs:          1"))
        .stdout(predicate::str::contains("min size:       2"));
}
