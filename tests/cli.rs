//! CLI tests against a temporary `SQLite` database, without a model.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECORD: &str = r#"{
  "user_id": "asha",
  "profile": {
    "name": "Asha Rao",
    "email": "asha.rao@example.com",
    "location": "Bangalore",
    "expected_ctc": "20 LPA",
    "notice_period": "30 days"
  },
  "skills": [
    {"name": "go", "display_name": "Go", "rating": 4, "rating_scale": 5, "years_of_experience": 3}
  ],
  "resume": "Built a payments ledger in Go"
}"#;

fn autoapply(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("autoapply").unwrap_or_else(|_| unreachable!());
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("AUTOAPPLY_API_KEY")
        .env_remove("AUTOAPPLY_DEGRADED_MODE")
        .env_remove("AUTOAPPLY_USER_ID")
        .env("AUTOAPPLY_PROMPT_DIR", db.with_file_name("no-prompts"))
        .arg("--db-path")
        .arg(db);
    cmd
}

fn seeded() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let db = dir.path().join("autoapply.db");
    let record = dir.path().join("asha.json");
    std::fs::write(&record, RECORD).unwrap_or_else(|_| unreachable!());

    autoapply(&db).arg("init").assert().success();
    autoapply(&db)
        .arg("import")
        .arg(&record)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported user 'asha'"));
    (dir, db)
}

#[test]
fn init_twice_requires_force() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let db = dir.path().join("nested").join("autoapply.db");

    autoapply(&db).arg("init").assert().success();
    autoapply(&db)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    autoapply(&db).args(["init", "--force"]).assert().success();
}

#[test]
fn answer_before_init_fails() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    autoapply(&dir.path().join("missing.db"))
        .args(["answer", "What is your notice period?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("autoapply init"));
}

#[test]
fn answers_notice_period_from_profile() {
    let (_dir, db) = seeded();
    autoapply(&db)
        .args(["--user-id", "asha", "answer", "What is your notice period?"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("30 days\n"));
}

#[test]
fn answer_json_output() {
    let (_dir, db) = seeded();
    let output = autoapply(&db)
        .args([
            "--user-id",
            "asha",
            "--format",
            "json",
            "answer",
            "What is your expected CTC?",
        ])
        .output()
        .unwrap_or_else(|_| unreachable!());
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).unwrap_or_else(|_| unreachable!());
    assert_eq!(json["result"]["answer"], "20 LPA");
    assert_eq!(json["result"]["confidence"], 95);
    assert_eq!(json["result"]["category"], "salary");
}

#[test]
fn choose_prefers_location() {
    let (_dir, db) = seeded();
    autoapply(&db)
        .args([
            "--user-id",
            "asha",
            "choose",
            "Preferred location?",
            "-o",
            "Mumbai",
            "-o",
            "Bangalore",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2. Bangalore"))
        .stdout(predicate::str::contains("MEDIUM"));
}

#[test]
fn batch_reuses_the_cache() {
    let (_dir, db) = seeded();
    let output = autoapply(&db)
        .args(["--user-id", "asha", "--format", "ndjson", "batch"])
        .write_stdin("What is your notice period?\n# comment\n\nwhat is your notice period?\n")
        .output()
        .unwrap_or_else(|_| unreachable!());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|_| unreachable!()))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["result"]["from_cache"], false);
    assert_eq!(lines[1]["result"]["from_cache"], true);
    assert_eq!(lines[2]["stats"]["cache"]["size"], 1);
}

#[test]
fn off_mode_reports_error_result() {
    let (_dir, db) = seeded();
    autoapply(&db)
        .env("AUTOAPPLY_DEGRADED_MODE", "off")
        .args(["--user-id", "asha", "answer", "What is your notice period?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: no LLM configured"));
}

#[test]
fn init_prompts_writes_templates() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let prompts = dir.path().join("prompts");
    autoapply(&dir.path().join("unused.db"))
        .arg("init-prompts")
        .arg("--dir")
        .arg(&prompts)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 5 prompt template(s)"));
    assert!(prompts.join("reasoning.md").exists());
}

#[test]
fn unknown_output_format_is_rejected() {
    let (_dir, db) = seeded();
    autoapply(&db)
        .args(["--format", "yaml", "answer", "What is your notice period?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format 'yaml'"));
}
