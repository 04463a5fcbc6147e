//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mathquiz(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("mathquiz").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("MATHQUIZ_GEMINI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// A directory initialised with the sample question set and a config that
/// serves it offline.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    mathquiz(dir.path()).arg("init").assert().success();
    std::fs::write(
        dir.path().join("mathquiz.toml"),
        r#"
retry_delay_ms = 1

[generator]
type = "file"
path = "questions/sample.json"

[student]
student_name = "An"
"#,
    )
    .unwrap();
    dir
}

const ALL_CORRECT: &str = r#"{
  "choices": { "1": 1, "2": 1, "3": 1, "4": 2, "5": 1, "6": 0, "7": 2, "8": 1, "9": 1, "10": 1, "11": 1, "12": 0 },
  "statements": {
    "1": { "1": true, "2": false, "3": true, "4": false },
    "2": { "1": true, "2": true, "3": false, "4": false },
    "3": { "1": true, "2": false, "3": true, "4": false },
    "4": { "1": true, "2": false, "3": true, "4": false }
  },
  "short": { "1": "6", "2": " 2000 ", "3": "19", "4": "90", "5": "7", "6": "5" }
}"#;

const HALF_PART_A: &str = r#"{ "choices": { "1": 1, "2": 1, "3": 1, "4": 2, "5": 1, "6": 0 } }"#;

fn write(dir: &TempDir, name: &str, content: &str) {
    std::fs::write(dir.path().join(name), content).unwrap();
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    mathquiz(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created mathquiz.toml"))
        .stdout(predicate::str::contains("Created questions/sample.json"));

    assert!(dir.path().join("mathquiz.toml").exists());
    assert!(dir.path().join("questions/sample.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    mathquiz(dir.path()).arg("init").assert().success();

    mathquiz(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn lessons_on_fresh_progress() {
    let dir = TempDir::new().unwrap();

    mathquiz(dir.path())
        .arg("lessons")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bài 1: Tập hợp"))
        .stdout(predicate::str::contains("unlocked"))
        .stdout(predicate::str::contains("locked"))
        .stdout(predicate::str::contains("Passed 0/52 lessons."));
}

#[test]
fn lessons_survive_corrupt_progress() {
    let dir = TempDir::new().unwrap();
    write(&dir, "math6_kntt_progress.json", "{ not json");

    mathquiz(dir.path())
        .arg("lessons")
        .assert()
        .success()
        .stdout(predicate::str::contains("Passed 0/52 lessons."));
}

#[test]
fn validate_sample_question_set() {
    let dir = workspace();

    mathquiz(dir.path())
        .args(["validate", "--questions", "questions/sample.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12 + 4 + 6 items, 16 statements"))
        .stdout(predicate::str::contains("Question set valid."));
}

#[test]
fn validate_rejects_broken_question_set() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "broken.json",
        r#"{ "part1": [{ "id": 1, "question": "?", "options": ["a", "b"], "correctAnswerIndex": 5 }] }"#,
    );

    mathquiz(dir.path())
        .args(["validate", "--questions", "broken.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("error: part A item 1"))
        .stderr(predicate::str::contains("not usable"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();

    mathquiz(dir.path())
        .args(["validate", "--questions", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn score_offline() {
    let dir = workspace();
    write(&dir, "answers.json", ALL_CORRECT);

    mathquiz(dir.path())
        .args([
            "score",
            "--questions",
            "questions/sample.json",
            "--answers",
            "answers.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct: 34/34"))
        .stdout(predicate::str::contains("Score: 10/10 (PASSED)"));
}

#[test]
fn score_ignores_unknown_items() {
    let dir = workspace();
    write(&dir, "answers.json", r#"{ "choices": { "1": 1, "99": 0 } }"#);

    mathquiz(dir.path())
        .args([
            "score",
            "--questions",
            "questions/sample.json",
            "--answers",
            "answers.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown items: A99"))
        .stdout(predicate::str::contains("Score: 0.25/10"));
}

#[test]
fn take_first_lesson_and_unlock_next() {
    let dir = workspace();
    write(&dir, "answers.json", ALL_CORRECT);

    mathquiz(dir.path())
        .args(["take", "--lesson", "l1.1", "--answers", "answers.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 10/10 (PASSED)"))
        .stdout(predicate::str::contains("New best score saved."))
        .stdout(predicate::str::contains("Next lesson unlocked: l1.2"))
        .stdout(predicate::str::contains("Tôi vừa đạt 10/10 điểm"));

    let saved = std::fs::read_to_string(dir.path().join("math6_kntt_progress.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["scores"]["l1.1"], 10.0);

    mathquiz(dir.path())
        .arg("lessons")
        .assert()
        .success()
        .stdout(predicate::str::contains("passed"))
        .stdout(predicate::str::contains("Passed 1/52 lessons."));
}

#[test]
fn worse_attempt_keeps_best_score() {
    let dir = workspace();
    write(&dir, "all.json", ALL_CORRECT);
    write(&dir, "half.json", HALF_PART_A);

    mathquiz(dir.path())
        .args(["take", "--lesson", "l1.1", "--answers", "all.json"])
        .assert()
        .success();

    mathquiz(dir.path())
        .args(["take", "--lesson", "l1.1", "--answers", "half.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 1.5/10 (NOT PASSED)"))
        .stdout(predicate::str::contains("Best score for this lesson stays 10."));
}

#[test]
fn take_locked_lesson_fails() {
    let dir = workspace();
    write(&dir, "answers.json", ALL_CORRECT);

    mathquiz(dir.path())
        .args(["take", "--lesson", "l1.2", "--answers", "answers.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locked until l1.1"));

    assert!(!dir.path().join("math6_kntt_progress.json").exists());
}

#[test]
fn practice_never_saves_progress() {
    let dir = workspace();
    write(&dir, "answers.json", ALL_CORRECT);

    mathquiz(dir.path())
        .args([
            "take",
            "--lesson",
            "l3.13",
            "--mode",
            "practice",
            "--answers",
            "answers.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Practice mode: progress is not saved."));

    assert!(!dir.path().join("math6_kntt_progress.json").exists());
}

#[test]
fn take_interactively() {
    let dir = workspace();

    mathquiz(dir.path())
        .args(["take", "--lesson", "l1.1"])
        .write_stdin("a 1 B\nstatus\nsubmit\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved A1."))
        .stdout(predicate::str::contains("Answered 1/34"))
        .stdout(predicate::str::contains("Submit now?"))
        .stdout(predicate::str::contains("Score: 0.25/10 (NOT PASSED)"));
}

#[test]
fn practice_shows_instant_feedback() {
    let dir = workspace();

    mathquiz(dir.path())
        .args(["take", "--lesson", "l2.8", "--mode", "practice"])
        .write_stdin("a 2 a\na 2 b\nsubmit\nn\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("A2: wrong (answer: B. {0; 1; 2; 3})"))
        .stdout(predicate::str::contains("Rejected: item A2 is already revealed"))
        .stdout(predicate::str::contains("Back to the quiz."))
        .stdout(predicate::str::contains("Left without submitting"));
}

#[test]
fn take_without_generator_fails() {
    let dir = TempDir::new().unwrap();

    mathquiz(dir.path())
        .args(["take", "--lesson", "l1.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no question generator configured"));
}

#[test]
fn send_report_requires_report_config() {
    let dir = workspace();
    write(&dir, "answers.json", ALL_CORRECT);

    mathquiz(dir.path())
        .args([
            "take",
            "--lesson",
            "l1.1",
            "--answers",
            "answers.json",
            "--send-report",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[report]"));
}
