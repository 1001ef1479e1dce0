use assert_cmd::Command;
use predicates::prelude::*;

fn reimb() -> Command {
    Command::cargo_bin("reimb").unwrap()
}

#[test]
fn test_parse_from_stdin() {
    reimb()
        .arg("parse")
        .write_stdin("姓名: 王小明\n部門: 研發部\n日期: 2024-07-15\n交通費: NT$1,500\n總計: NT$1,500")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"王小明\""))
        .stdout(predicate::str::contains("\"date\": \"2024/07/15\""))
        .stdout(predicate::str::contains("\"transportCost\": 1500"));
}

#[test]
fn test_parse_from_file_form_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.txt");
    std::fs::write(&path, "餐費: 320\n其他: 0").unwrap();

    reimb()
        .args(["parse", "--form-only"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mealCost\": 320"))
        .stdout(predicate::str::contains("\"otherCost\": 0"))
        .stdout(predicate::str::contains("warnings").not());
}

#[test]
fn test_process_rejects_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "姓名: 王小明").unwrap();

    reimb()
        .arg("process")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("notes.txt"));
}

#[test]
fn test_config_show_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    reimb()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"low_confidence_threshold\": 0.85"));
}

#[test]
fn test_config_set_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    reimb()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "ocr.language", "eng"])
        .assert()
        .success();

    reimb()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "ocr.language"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"eng\""));
}
