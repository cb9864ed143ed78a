//! Black-box tests for the `ms` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const COMPETITION: &str = r#"{
  "_id": "open",
  "name": "Open",
  "disciplines": ["15W", "SC1", "5N1", "5N2"],
  "compUsers": ["u1", "u2"],
  "compAdmins": [],
  "compResults": [
    { "compUser": "u1", "discipline": "5N1", "score": 547 },
    { "compUser": "u1", "discipline": "5N2", "score": 273.5 },
    { "compUser": "u1", "discipline": "15W", "score": 156, "provisional": true },
    { "compUser": "u2", "discipline": "5N1", "score": 273.5 },
    { "compUser": "u2", "discipline": "15W", "score": 312 },
    { "compUser": "u2", "discipline": "SC1", "score": 52, "time": 1 }
  ]
}"#;

const USERS: &str = r#"[
  { "_id": "u1", "firstName": "Ada", "lastName": "King", "country": "Norway", "verified": true },
  { "_id": "u2", "firstName": "Bo", "lastName": "Li", "country": "China", "verified": true }
]"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("competition-open.json"), COMPETITION).unwrap();
        fs::write(dir.path().join("users.json"), USERS).unwrap();
        Fixture { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, text: &str) -> PathBuf {
        let p = self.path(name);
        fs::write(&p, text).unwrap();
        p
    }

    fn snapshot_args(&self, cmd: &mut Command) {
        cmd.arg("--competition").arg(self.path("competition-open.json"));
        cmd.arg("--users").arg(self.path("users.json"));
    }
}

fn ms() -> Command {
    Command::cargo_bin("ms").unwrap()
}

fn data_dir(f: &Fixture) -> &Path {
    f.dir.path()
}

#[test]
fn standings_are_ranked_by_total() {
    let f = Fixture::new();
    let mut cmd = ms();
    cmd.arg("standings");
    f.snapshot_args(&mut cmd);
    // Bo: 500.00 + 1000.00 + 6862.00; Ada: best of 5N (1000.00) + 500.00
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1\tBo Li\t8362\t8362.00\n"))
        .stdout(predicate::str::contains("2\tAda King\t1500\t1500.00\n"));
}

#[test]
fn leaderboard_by_label() {
    let f = Fixture::new();
    let mut cmd = ms();
    cmd.args(["leaderboard", "--discipline", "15-minute words"]);
    f.snapshot_args(&mut cmd);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1\tBo Li\t312\t\t1000.00\n"))
        .stdout(predicate::str::contains("2\tAda King\t156\t\t500.00\tprovisional\n"));
}

#[test]
fn leaderboard_for_foreign_discipline_is_rejected() {
    let f = Fixture::new();
    let mut cmd = ms();
    cmd.args(["leaderboard", "--discipline", "K1"]);
    f.snapshot_args(&mut cmd);
    cmd.assert().code(2).stderr(predicate::str::contains("not part of this competition"));
}

#[test]
fn status_reports_each_discipline() {
    let f = Fixture::new();
    let mut cmd = ms();
    cmd.arg("status");
    f.snapshot_args(&mut cmd);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("5N1\t5-Minute Numbers (Trial 1)\tcomplete\n"))
        .stdout(predicate::str::contains("5N2\t5-Minute Numbers (Trial 2)\tpending\n"))
        .stdout(predicate::str::contains("15W\t15-Minute Words\tprovisional_complete\n"))
        .stdout(predicate::str::contains("complete: no\n"));
}

#[test]
fn export_csv_to_file() {
    let f = Fixture::new();
    let out = f.path("standings.csv");
    let mut cmd = ms();
    cmd.args(["export", "--format", "csv", "--out"]).arg(&out);
    f.snapshot_args(&mut cmd);
    cmd.assert().success();

    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Name,Total,Unrounded Total,5-Minute Numbers (Trial 1),5-Minute Numbers (Trial 2),15-Minute Words,\
         Speed Cards (Trial 1),Speed Cards (Trial 1) Time"
    );
    assert_eq!(lines[1], "Bo Li,8362,8362.00,273.5,,312,52,1");
    assert_eq!(lines[2], "Ada King,1500,1500.00,547,273.5,156,,");
}

#[test]
fn export_json_to_stdout() {
    let f = Fixture::new();
    let mut cmd = ms();
    cmd.args(["export", "--format", "json"]);
    f.snapshot_args(&mut cmd);
    let output = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(v["standings"][0]["name"], "Bo Li");
    assert_eq!(v["completion"]["complete"], false);
    assert_eq!(v["competition"]["snapshot_sha256"].as_str().map(str::len), Some(64));
}

#[test]
fn decode_fresh_and_expired_codes() {
    let f = Fixture::new();
    let code = f.write("code.txt", "Discipline: 5-Minute Numbers (Trial 1) // Score: 547 // Timestamp: 2024-06-01 11:45:00\n");

    ms().arg("decode")
        .arg("--code")
        .arg(&code)
        .args(["--now", "2024-06-01T12:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"format\": \"legacy_line\""))
        .stdout(predicate::str::contains("\"discipline\": \"5-Minute Numbers (Trial 1)\""));

    ms().arg("decode")
        .arg("--code")
        .arg(&code)
        .args(["--now", "2024-06-01T13:00:00Z"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expired"));
}

#[test]
fn decode_reads_stdin() {
    ms().args(["decode", "--code", "-", "--now", "2024-06-01T12:00:00Z"])
        .write_stdin("Discipline: K1 // Score: 100 // Timestamp: 2024-06-01T11:30:00Z")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"discipline\": \"K1\""));
}

#[test]
fn import_check_flags_duplicates_and_unknown_countries() {
    let f = Fixture::new();
    let rows = f.write("rows.tsv", "First name\tLast name\tCountry\tBorn\nAda\tKing\tnorway\t1990\nZed\tZulu\tAtlantis\t1980\n");
    ms().arg("import-check")
        .arg("--rows")
        .arg(&rows)
        .arg("--users")
        .arg(f.path("users.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("review: u1 (1.00)"))
        .stdout(predicate::str::contains("unrecognized country: Atlantis"))
        .stdout(predicate::str::contains("2 row(s), 2 need review"));
}

#[test]
fn submit_writes_through_the_file_store() {
    let f = Fixture::new();
    let code = f.write("code.txt", "Discipline: 5N2 // Score: 300 // Timestamp: 2024-06-01 11:45:00");
    let submit = |who: &str| {
        let mut cmd = ms();
        cmd.arg("submit")
            .arg("--data-dir")
            .arg(data_dir(&f))
            .args(["--competition-id", "open", "--competitor", who, "--now", "2024-06-01T12:00:00Z"])
            .arg("--code")
            .arg(&code);
        cmd
    };

    submit("u2").assert().success().stdout(predicate::str::contains("accepted: u2 5N2 300"));
    // Second submission for the same discipline is refused.
    submit("u2").assert().code(2).stderr(predicate::str::contains("5N2"));
    // Not a participant.
    submit("u9").assert().code(2);

    let stored = fs::read_to_string(f.path("competition-open.json")).unwrap();
    assert_eq!(stored.matches("\"compUser\"").count(), 7);
}

#[test]
fn submit_to_missing_competition_is_an_io_failure() {
    let f = Fixture::new();
    let code = f.write("code.txt", "Discipline: 5N2 // Score: 300");
    ms().arg("submit")
        .arg("--data-dir")
        .arg(data_dir(&f))
        .args(["--competition-id", "nope", "--competitor", "u1", "--code"])
        .arg(&code)
        .assert()
        .code(4);
}

#[test]
fn missing_input_file_is_rejected_before_running() {
    ms().args(["standings", "--competition", "does/not/exist.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file not found"));
}
