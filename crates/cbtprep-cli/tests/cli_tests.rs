//! CLI integration tests using assert_cmd.

use std::io::Read;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_BANK: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../banks/phy107-sample.json"
);

/// A `cbtprep` command isolated from the user's real config and data.
fn cbtprep(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cbtprep").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("CBTPREP_BANK")
        .env_remove("CBTPREP_DATA_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn logged_in() -> TempDir {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .args(["login", "--name", "Ada", "--department", "Physics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ada (Physics)"));
    dir
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Timed multiple-choice practice exams"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cbtprep"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    cbtprep(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created cbtprep.toml"))
        .stdout(predicate::str::contains("Created questions.json"));

    assert!(dir.path().join("cbtprep.toml").exists());
    assert!(dir.path().join("questions.json").exists());

    // The generated config and bank work together out of the box.
    cbtprep(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("35 questions"))
        .stdout(predicate::str::contains("Question bank valid."));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    cbtprep(dir.path()).arg("init").assert().success();

    cbtprep(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_sample_bank() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .args(["validate", "--bank", SAMPLE_BANK])
        .assert()
        .success()
        .stdout(predicate::str::contains("35 questions"))
        .stdout(predicate::str::contains("Question bank valid."));
}

#[test]
fn validate_reports_small_bank() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("tiny.toml"),
        r#"
[[all]]
id = "t1"
question = "Unit of energy?"
correct_answer = "A"
explanation = ""
[all.options]
A = "Joule"
B = "Newton"
"#,
    )
    .unwrap();

    cbtprep(dir.path())
        .args(["validate", "--bank", "tiny.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("only 1 questions available, an exam needs 30"))
        .stdout(predicate::str::contains("[t1] WARNING: explanation is empty"))
        .stdout(predicate::str::contains("2 warning(s) found."));
}

#[test]
fn validate_missing_bank() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .args(["validate", "--bank", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("failed to load question bank"));
}

#[test]
fn validate_names_bad_record() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bad.json"),
        r#"{"all": [
            {"question": "ok", "options": {"A": "x"}, "correct_answer": "A", "explanation": "e"},
            {"question": "broken", "options": {"A": "x"}, "correct_answer": "C", "explanation": "e"}
        ]}"#,
    )
    .unwrap();

    cbtprep(dir.path())
        .args(["validate", "--bank", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question #2"));
}

#[test]
fn login_then_whoami() {
    let dir = logged_in();
    cbtprep(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada (Physics)"));
}

#[test]
fn whoami_without_login() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn login_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .args(["login", "--name", "   ", "--department", "Physics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("display name must not be empty"));
}

#[test]
fn take_requires_login() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .args(["take", "--bank", SAMPLE_BANK])
        .write_stdin("s\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn take_rejects_small_bank() {
    let dir = logged_in();
    std::fs::write(
        dir.path().join("two.json"),
        r#"{"all": [
            {"question": "a", "options": {"A": "x"}, "correct_answer": "A", "explanation": "e"},
            {"question": "b", "options": {"A": "x"}, "correct_answer": "A", "explanation": "e"}
        ]}"#,
    )
    .unwrap();

    cbtprep(dir.path())
        .args(["take", "--bank", "two.json"])
        .write_stdin("s\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("only 2 questions available, 30 required"));
}

#[test]
fn take_submit_records_history() {
    let dir = logged_in();

    cbtprep(dir.path())
        .args(["take", "--bank", SAMPLE_BANK, "--seed", "7"])
        .write_stdin("s\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, Ada. 30 questions, 15:00"))
        .stdout(predicate::str::contains("Question 1 of 30"))
        .stdout(predicate::str::contains("30 unanswered question(s) will be marked wrong."))
        .stdout(predicate::str::contains("Score: 0/30 (0%)"))
        .stdout(predicate::str::contains("Keep practicing!"));

    cbtprep(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Results for Ada (Physics)"))
        .stdout(predicate::str::contains("Attempts: 1"))
        .stdout(predicate::str::contains("fail"));

    let output = cbtprep(dir.path())
        .args(["history", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["correct"], 0);
    assert_eq!(records[0]["wrong"], 30);
    assert_eq!(records[0]["percentage"], 0);
}

#[test]
fn history_accumulates_in_order() {
    let dir = logged_in();
    for _ in 0..3 {
        cbtprep(dir.path())
            .args(["take", "--bank", SAMPLE_BANK])
            .write_stdin("s\n")
            .assert()
            .success();
    }

    cbtprep(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Attempts: 3"));
}

#[test]
fn take_quit_records_nothing() {
    let dir = logged_in();

    cbtprep(dir.path())
        .args(["take", "--bank", SAMPLE_BANK])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam abandoned, no result recorded."));

    cbtprep(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No results yet for Ada."));
}

#[test]
fn take_end_of_input_abandons() {
    let dir = logged_in();

    cbtprep(dir.path())
        .args(["take", "--bank", SAMPLE_BANK])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 2 of 30"))
        .stdout(predicate::str::contains("Input closed. Exam abandoned"));

    assert!(!dir.path().join(".cbtprep/history").exists());
}

#[test]
fn take_rejects_unknown_option() {
    let dir = logged_in();

    cbtprep(dir.path())
        .args(["take", "--bank", SAMPLE_BANK])
        .write_stdin("Z\ns\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("'Z' is not an option of question 1"))
        .stdout(predicate::str::contains("Score: 0/30"));
}

#[test]
fn take_navigation() {
    let dir = logged_in();

    cbtprep(dir.path())
        .args(["take", "--bank", SAMPLE_BANK])
        .write_stdin("p\ng 31\ng 30\nn\nf\nl\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already at the first question."))
        .stdout(predicate::str::contains("No question 31; the exam has 30."))
        .stdout(predicate::str::contains("Question 30 of 30"))
        .stdout(predicate::str::contains("This is the last question. Type s to submit."))
        .stdout(predicate::str::contains("Flagged question 30."))
        .stdout(predicate::str::contains("Answered 0/30, flagged 1"));
}

#[test]
fn take_answer_and_review() {
    let dir = logged_in();

    cbtprep(dir.path())
        .args(["take", "--bank", SAMPLE_BANK, "--review"])
        .write_stdin("a\ns\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Answer A recorded."))
        .stdout(predicate::str::contains("29 unanswered question(s)"))
        .stdout(predicate::str::contains("Review"))
        .stdout(predicate::str::contains("1. "))
        .stdout(predicate::str::contains("30. "))
        .stdout(predicate::str::contains("(not answered)"))
        .stdout(predicate::str::contains("Correct answer:"));
}

#[test]
fn seeded_exams_repeat() {
    let dir = logged_in();

    let run = |seed: &str| {
        let output = cbtprep(dir.path())
            .args(["take", "--bank", SAMPLE_BANK, "--seed", seed])
            .write_stdin("q\n")
            .output()
            .unwrap();
        String::from_utf8(output.stdout).unwrap()
    };

    assert_eq!(run("42"), run("42"));
}

#[test]
fn config_file_sets_exam_size() {
    let dir = logged_in();
    std::fs::write(
        dir.path().join("cbtprep.toml"),
        format!(
            "[source]\ntype = \"file\"\npath = \"{}\"\n\n[exam]\nquestion_count = 5\nduration_secs = 60\n",
            SAMPLE_BANK.replace('\\', "\\\\")
        ),
    )
    .unwrap();

    cbtprep(dir.path())
        .arg("take")
        .write_stdin("s\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 questions, 1:00 on the clock"))
        .stdout(predicate::str::contains("Score: 0/5 (0%)"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    cbtprep(dir.path())
        .args(["--config", "missing.toml", "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn time_running_out_submits_while_input_is_open() {
    let dir = logged_in();
    std::fs::write(
        dir.path().join("cbtprep.toml"),
        format!(
            "[source]\ntype = \"file\"\npath = \"{}\"\n\n[exam]\nduration_secs = 2\ntick_millis = 10\n",
            SAMPLE_BANK.replace('\\', "\\\\")
        ),
    )
    .unwrap();

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_cbtprep"))
        .arg("take")
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("CBTPREP_BANK")
        .env_remove("CBTPREP_DATA_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // Held open so only the timer can end the exam.
    let _stdin = child.stdin.take().unwrap();

    let deadline = Instant::now() + Duration::from_secs(30);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("exam did not end when time ran out");
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    assert!(status.success());

    let mut stdout = String::new();
    child.stdout.take().unwrap().read_to_string(&mut stdout).unwrap();
    assert!(stdout.contains("*** 0:01 left ***"), "{stdout}");
    assert!(stdout.contains("Time is up. Your answers were submitted."), "{stdout}");
    assert!(stdout.contains("Score: 0/30 (0%)"), "{stdout}");

    cbtprep(dir.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Attempts: 1"));
}
