mod fixtures;

use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_replay(dir: &Path, name: &str) -> String {
    let mut trailer = vehicle_record(0x10, "germ_pzkpfw_IV_ausf_F2");
    trailer.extend(vehicle_record(0x11, "spitfire_mk1"));
    let replay = build_replay(
        ALICE_AND_BOB,
        &[score_row(&stats(1)), score_row(&stats(2))],
        &trailer,
    );

    let path = dir.join(name);
    fs::write(&path, replay).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn it_dumps_json_lines() {
    let d = tempdir().unwrap();
    let replay = write_replay(d.path(), "a.wrpl");

    let mut cmd = Command::new(assert_cmd::cargo_bin!("wrpl_dump"));
    cmd.args(["-o", "jsonl", &replay]);

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["file"], replay.as_str());
    assert_eq!(lines[0]["display_name"], "Alice");
    assert_eq!(lines[0]["nation"], "Germany");
    assert_eq!(lines[1]["display_name"], "Bob");
    assert_eq!(lines[1]["clan_tag"], "-TAG-");
    assert_eq!(lines[1]["id"], 67890);
    assert_eq!(lines[1]["nation"], "Great Britain");
    assert_eq!(lines[1]["stats"]["score"], u64::from(stats(2).score));
}

#[test]
fn it_uses_the_given_catalog() {
    let d = tempdir().unwrap();
    let replay = write_replay(d.path(), "a.wrpl");
    let catalog = d.path().join("catalog.txt");
    fs::write(&catalog, "==== Commonwealth ====\nspitfire_mk1\n").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("wrpl_dump"));
    cmd.args(["-o", "jsonl", "-c", &catalog.to_string_lossy(), &replay]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"nation\":\"Commonwealth\""));
}

#[test]
fn it_dumps_one_document_per_replay() {
    let d = tempdir().unwrap();
    let first = write_replay(d.path(), "a.wrpl");
    let second = write_replay(d.path(), "b.wrpl");
    let out = d.path().join("out").join("records.json");

    let mut cmd = Command::new(assert_cmd::cargo_bin!("wrpl_dump"));
    cmd.args(["-f", &out.to_string_lossy(), "-t", "2", &first, &second]);

    assert!(
        cmd.output().unwrap().stdout.is_empty(),
        "Expected output to be printed to file, but was printed to stdout"
    );

    let text = fs::read_to_string(&out).unwrap();
    assert!(serde_json::from_str::<Value>(&text).is_err());

    let documents: Vec<Value> = serde_json::Deserializer::from_str(&text)
        .into_iter::<Value>()
        .map(Result::unwrap)
        .collect();

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["file"], first.as_str());
    assert_eq!(documents[1]["file"], second.as_str());
    assert_eq!(documents[1]["records"].as_array().unwrap().len(), 2);
}

#[test]
fn test_it_reports_broken_replays() {
    let d = tempdir().unwrap();
    let good = write_replay(d.path(), "good.wrpl");
    let broken = d.path().join("broken.wrpl");
    fs::write(&broken, b"not a replay").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("wrpl_dump"));
    cmd.args(["-o", "jsonl", &good, &broken.to_string_lossy()]);

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Alice"))
        .stderr(predicate::str::contains("start-of-table"));
}

#[test]
fn test_it_refuses_to_overwrite_directory() {
    let d = tempdir().unwrap();
    let replay = write_replay(d.path(), "a.wrpl");

    let mut cmd = Command::new(assert_cmd::cargo_bin!("wrpl_dump"));
    cmd.args(["-f", &d.path().to_string_lossy(), &replay]);

    cmd.assert().failure().code(1);
}

#[test]
fn test_it_overwrites_file_anyways_if_passed_flag() {
    let d = tempdir().unwrap();
    let replay = write_replay(d.path(), "a.wrpl");
    let f = d.path().join("test.out");
    fs::write(&f, b"I'm a file!").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("wrpl_dump"));
    cmd.args([
        "-f",
        &f.to_string_lossy(),
        "--no-confirm-overwrite",
        &replay,
    ]);

    cmd.assert().success();

    let written = fs::read_to_string(&f).unwrap();
    assert!(written.contains("\"display_name\": \"Alice\""));
}
